//! Service layer for noticeboard
//!
//! Centralizes the create/update/read/search flows between callers and the
//! record store.

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

mod error;
mod record_service;
mod search_service;

pub use error::ServiceError;
pub use record_service::RecordService;
pub use search_service::{NoticeHit, SearchRequest, SearchService};
