//! Storage backend trait abstraction
//!
//! The engine never talks to a database; it hands accepted records to a
//! `RecordStore`, which owns persistence and the email unique index.

use async_trait::async_trait;
use noticeboard_core::{Record, SearchDocument};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// A persisted record with its derived search document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub kind: String,
    pub record: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<SearchDocument>,
}

/// CRUD operations on records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get a record by kind and id.
    async fn get(&self, kind: &str, id: &str) -> Result<Option<StoredRecord>, StorageError>;

    /// Insert or replace. Fails with `Duplicate` when a `user` email is held by
    /// another id.
    async fn put(&self, record: StoredRecord) -> Result<(), StorageError>;

    /// Whether a normalized email is held by a user other than `except_id`.
    async fn email_taken(&self, email: &str, except_id: Option<&str>)
    -> Result<bool, StorageError>;

    /// All records of a kind, ordered by id.
    async fn list(&self, kind: &str) -> Result<Vec<StoredRecord>, StorageError>;
}
