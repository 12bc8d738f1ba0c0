//! Storage layer for noticeboard
//!
//! Async record store contract plus an in-memory backend that can be
//! snapshotted to a JSON file.

mod error;
mod memory;
pub mod traits;

pub use error::StorageError;
pub use memory::InMemoryStore;
pub use traits::{RecordStore, StoredRecord};
