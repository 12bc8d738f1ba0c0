//! Typed error enum for the service layer.
//!
//! Unifies engine, storage and search failures into a single error type,
//! enabling callers to match on specific failure modes instead of downcasting
//! opaque `anyhow::Error` boxes.

use noticeboard_core::{ConstraintViolation, EngineError};
use noticeboard_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying engine, storage and search failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Record rejected by the pipeline, or an unregistered kind.
    #[error("engine: {0}")]
    Engine(#[from] EngineError),

    /// Storage operation failed (not found, duplicate, snapshot io).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Search query could not be parsed.
    #[error("search: {0}")]
    Search(#[source] anyhow::Error),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether this error represents a not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(StorageError::NotFound { .. }))
    }

    /// Whether this error represents a duplicate/conflict.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_duplicate())
    }

    /// Whether the caller's record broke one or more constraints.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Engine(EngineError::ValidationFailed(_)))
    }

    /// Violations behind a validation failure, empty otherwise.
    #[must_use]
    pub fn violations(&self) -> &[ConstraintViolation] {
        match self {
            Self::Engine(e) => e.violations(),
            _ => &[],
        }
    }
}
