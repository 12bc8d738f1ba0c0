use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use noticeboard_core::{Record, into_record};
use serde_json::Value;

fn read_json(path: Option<&Path>) -> Result<Value> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
            buf
        },
    };
    serde_json::from_str(&text).context("input is not valid JSON")
}

/// Reads one record or an array of records.
pub(crate) fn read_records(path: Option<&Path>) -> Result<Vec<Record>> {
    match read_json(path)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| into_record(item).map_err(Into::into))
            .collect(),
        other => Ok(vec![into_record(other)?]),
    }
}

/// Reads exactly one record.
pub(crate) fn read_record(path: Option<&Path>) -> Result<Record> {
    Ok(into_record(read_json(path)?)?)
}
