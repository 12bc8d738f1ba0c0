//! Field specifications.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validate::Constraint;

/// Semantic type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
    /// Text restricted by a `OneOf` constraint.
    Enum,
    TextArray,
    Object,
    /// Any non-null JSON value; the shape is left to the field's constraints.
    Json,
    /// RFC 3339 timestamp string.
    Timestamp,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Enum => "enum",
            Self::TextArray => "text_array",
            Self::Object => "object",
            Self::Json => "json",
            Self::Timestamp => "timestamp",
        }
    }

    /// Whether a non-null JSON value has this type's structural shape.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match *self {
            Self::Text | Self::Enum => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Decimal => value.is_number(),
            Self::TextArray => value.as_array().is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Object => value.is_object(),
            Self::Json => !value.is_null(),
            Self::Timestamp => {
                value.as_str().is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok())
            },
        }
    }
}

/// Normalization applied to a field on its way into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNormalizer {
    /// Trim then lower-case.
    Email,
    /// Trim elements and drop blank ones; no case folding, duplicates kept.
    Tags,
    /// Round to two decimal places, after validation.
    Decimal2,
}

impl FieldNormalizer {
    /// Whether the normalizer runs before validation. Rounding runs after, so
    /// range checks see the raw value.
    #[must_use]
    pub const fn runs_before_validation(self) -> bool {
        !matches!(self, Self::Decimal2)
    }
}

/// Shape, nullability and constraints of one field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    normalizer: Option<FieldNormalizer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    constraints: Vec<Constraint>,
}

impl FieldSpec {
    #[must_use]
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, true)
    }

    #[must_use]
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, false)
    }

    fn new(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self { name: name.into(), field_type, required, normalizer: None, constraints: Vec::new() }
    }

    #[must_use]
    pub fn normalizer(mut self, normalizer: FieldNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub const fn field_normalizer(&self) -> Option<FieldNormalizer> {
        self.normalizer
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}
