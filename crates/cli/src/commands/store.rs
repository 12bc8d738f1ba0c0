use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use noticeboard_core::{ConstraintViolation, MutationPipeline, SchemaRegistry};
use noticeboard_search::{MatchMode, NoticeFilter, Page};
use noticeboard_service::{RecordService, SearchRequest, SearchService};
use noticeboard_storage::{InMemoryStore, RecordStore};
use serde::Serialize;

use crate::input::{read_record, read_records};

pub(crate) struct SearchArgs {
    pub query: String,
    pub mode: MatchMode,
    pub college: Option<String>,
    pub hashtags: Vec<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Serialize)]
struct Created {
    index: usize,
    id: String,
}

#[derive(Serialize)]
struct Rejected {
    index: usize,
    violations: Vec<ConstraintViolation>,
}

#[derive(Serialize)]
struct ImportReport {
    created: Vec<Created>,
    rejected: Vec<Rejected>,
}

async fn open_store(path: &Path) -> Result<Arc<InMemoryStore>> {
    Ok(Arc::new(InMemoryStore::open(path).await?))
}

fn record_service(store: &Arc<InMemoryStore>) -> RecordService {
    let store: Arc<dyn RecordStore> = Arc::clone(store) as Arc<dyn RecordStore>;
    RecordService::new(store, MutationPipeline::new(SchemaRegistry::global()))
}

pub(crate) async fn run_import(path: &Path, kind: &str, file: Option<&Path>) -> Result<ExitCode> {
    let records = read_records(file)?;
    let store = open_store(path).await?;
    let service = record_service(&store);

    let mut report = ImportReport { created: Vec::new(), rejected: Vec::new() };
    for (index, record) in records.into_iter().enumerate() {
        match service.create(kind, record).await {
            Ok(stored) => report.created.push(Created { index, id: stored.id }),
            Err(e) if e.is_validation() => {
                report.rejected.push(Rejected { index, violations: e.violations().to_vec() });
            },
            Err(e) => return Err(e.into()),
        }
    }

    if !report.created.is_empty() {
        store.persist(path).await?;
    }
    tracing::info!(
        kind,
        created = report.created.len(),
        rejected = report.rejected.len(),
        "import finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.rejected.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

pub(crate) async fn run_update(
    path: &Path,
    kind: &str,
    id: &str,
    file: Option<&Path>,
) -> Result<ExitCode> {
    let patch = read_record(file)?;
    let store = open_store(path).await?;
    let service = record_service(&store);

    match service.update(kind, id, patch).await {
        Ok(stored) => {
            store.persist(path).await?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
            Ok(ExitCode::SUCCESS)
        },
        Err(e) if e.is_validation() => {
            println!("{}", serde_json::to_string_pretty(e.violations())?);
            Ok(ExitCode::FAILURE)
        },
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn run_get(path: &Path, kind: &str, id: &str) -> Result<ExitCode> {
    let store = open_store(path).await?;
    let stored = record_service(&store).get(kind, id).await?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(ExitCode::SUCCESS)
}

pub(crate) async fn run_search(path: &Path, args: SearchArgs) -> Result<ExitCode> {
    let store = open_store(path).await?;
    let mut filter = NoticeFilter::new().hashtags(&args.hashtags);
    if let Some(college) = args.college {
        filter = filter.college(college);
    }
    let request = SearchRequest {
        query: args.query,
        mode: args.mode,
        filter,
        page: Page::clamped(args.limit, args.offset),
    };
    let hits = SearchService::new(store).search(&request).await?;
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(ExitCode::SUCCESS)
}
