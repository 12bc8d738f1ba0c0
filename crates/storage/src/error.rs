//! Typed error enum for the storage layer.
//!
//! Lets callers match on specific failure modes (not found, duplicate email,
//! unreadable snapshot) instead of downcasting opaque boxes.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record of this kind under this id.
    #[error("not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    /// Unique constraint violation (normalized user email).
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Snapshot file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot data could not be deserialized into stored records.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    #[must_use]
    pub fn not_found(kind: &str, id: &str) -> Self {
        Self::NotFound { kind: kind.to_owned(), id: id.to_owned() }
    }

    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            )
        )
    }

    /// Whether this error is a unique-constraint violation.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption {
            context: "JSON serialization/deserialization".to_owned(),
            source: Box::new(err),
        }
    }
}
