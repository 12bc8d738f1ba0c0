use std::path::Path;
use std::process::ExitCode;

use anyhow::{Result, bail};
use noticeboard_core::{
    ConstraintViolation, SchemaRegistry, build_index, normalize_email, normalize_record, validate,
};
use serde::Serialize;

use crate::input::read_records;

#[derive(Serialize)]
struct ValidationReport {
    index: usize,
    valid: bool,
    violations: Vec<ConstraintViolation>,
}

pub(crate) fn run_validate(kind: &str, file: Option<&Path>) -> Result<ExitCode> {
    let registry = SchemaRegistry::global();
    let schema = registry.lookup(kind)?;
    let reports: Vec<ValidationReport> = read_records(file)?
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            normalize_record(schema, &mut record);
            let violations = validate(schema, &record);
            ValidationReport { index, valid: violations.is_empty(), violations }
        })
        .collect();
    let invalid = reports.iter().filter(|r| !r.valid).count();
    tracing::info!(kind, records = reports.len(), invalid, "validated records");
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(if invalid == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

pub(crate) fn run_normalize_email(email: &str) -> Result<ExitCode> {
    println!("{}", normalize_email(email));
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn run_index(kind: &str, file: Option<&Path>, tsvector: bool) -> Result<ExitCode> {
    let registry = SchemaRegistry::global();
    let schema = registry.lookup(kind)?;
    if !schema.is_indexed() {
        bail!("{kind} records have no search index");
    }
    let documents: Vec<_> = read_records(file)?
        .into_iter()
        .map(|mut record| {
            normalize_record(schema, &mut record);
            build_index(schema, &record)
        })
        .collect();
    if tsvector {
        for document in &documents {
            println!("{}", document.to_tsvector_literal());
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&documents)?);
    }
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn run_schema(kind: Option<&str>) -> Result<ExitCode> {
    let registry = SchemaRegistry::global();
    let json = match kind {
        Some(kind) => serde_json::to_string_pretty(registry.lookup(kind)?)?,
        None => {
            let schemas = registry
                .kinds()
                .into_iter()
                .map(|k| registry.lookup(k))
                .collect::<noticeboard_core::Result<Vec<_>>>()?;
            serde_json::to_string_pretty(&schemas)?
        },
    };
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}
