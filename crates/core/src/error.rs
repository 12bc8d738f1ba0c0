use std::fmt;
use std::result::Result as StdResult;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validate::ConstraintViolation;

/// Errors raised by the validation and indexing engine.
///
/// `UnknownSchema`, `DuplicateSchema` and `DuplicateField` are programmer errors
/// (a kind that was never registered, or a registry built twice). `ValidationFailed`
/// is the recoverable case: the caller fixes the input and retries.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    #[error("schema already registered: {0}")]
    DuplicateSchema(String),

    #[error("duplicate field '{field}' in schema '{kind}'")]
    DuplicateField { kind: String, field: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    #[error("validation failed: {0}")]
    ValidationFailed(Violations),
}

impl EngineError {
    /// Violations carried by a `ValidationFailed` error, empty otherwise.
    #[must_use]
    pub fn violations(&self) -> &[ConstraintViolation] {
        match self {
            Self::ValidationFailed(v) => v.as_slice(),
            _ => &[],
        }
    }

    /// Programmer errors that no retry with different input can fix.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownSchema(_) | Self::DuplicateSchema(_) | Self::DuplicateField { .. }
        )
    }
}

/// Complete set of violations for one record, in field declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Violations(Vec<ConstraintViolation>);

impl Violations {
    #[must_use]
    pub fn as_slice(&self) -> &[ConstraintViolation] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<ConstraintViolation> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ConstraintViolation>> for Violations {
    fn from(v: Vec<ConstraintViolation>) -> Self {
        Self(v)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

pub type Result<T> = StdResult<T, EngineError>;
