//! Record schemas: field shapes, constraint sets and index specs per record kind.

mod builtin;
mod field;
mod registry;

pub use builtin::{notice_schema, user_profile_schema, user_schema};
pub use field::*;
pub use registry::SchemaRegistry;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, Result};
use crate::index::IndexSpec;
use crate::validate::json_kind;

/// A record is a plain field-name to JSON-value mapping.
pub type Record = Map<String, Value>;

/// Unwraps a JSON document into a [`Record`], rejecting non-object roots.
///
/// # Errors
/// Returns `InvalidRecord` if `value` is not a JSON object.
pub fn into_record(value: Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(EngineError::InvalidRecord(format!(
            "record must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Record kinds with a built-in schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Account row keyed by a normalized email.
    User,
    /// Student profile used for notice recommendation.
    UserProfile,
    /// Crawled announcement with AI-derived enrichment fields.
    Notice,
}

impl RecordKind {
    pub const ALL: &'static [RecordKind] = &[Self::User, Self::UserProfile, Self::Notice];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::User => "user",
            Self::UserProfile => "user_profile",
            Self::Notice => "notice",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "user" => Ok(Self::User),
            "user_profile" => Ok(Self::UserProfile),
            "notice" => Ok(Self::Notice),
            other => Err(EngineError::UnknownSchema(other.to_owned())),
        }
    }
}

/// Field definitions and index spec for one record kind.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSchema {
    kind: String,
    fields: Vec<FieldSpec>,
    #[serde(skip_serializing_if = "IndexSpec::is_empty")]
    index: IndexSpec,
}

impl RecordSchema {
    #[must_use]
    pub fn builder(kind: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder { kind: kind.into(), fields: Vec::new(), index: IndexSpec::default() }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    #[must_use]
    pub const fn index(&self) -> &IndexSpec {
        &self.index
    }

    /// Whether records of this kind carry a search document.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.index.is_empty()
    }
}

/// Builder for [`RecordSchema`]; `build` enforces unique field names.
#[derive(Debug)]
pub struct RecordSchemaBuilder {
    kind: String,
    fields: Vec<FieldSpec>,
    index: IndexSpec,
}

impl RecordSchemaBuilder {
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn index(mut self, index: IndexSpec) -> Self {
        self.index = index;
        self
    }

    /// # Errors
    /// Returns `DuplicateField` if two fields share a name.
    pub fn build(self) -> Result<RecordSchema> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name()) {
                return Err(EngineError::DuplicateField {
                    kind: self.kind,
                    field: field.name().to_owned(),
                });
            }
        }
        Ok(RecordSchema { kind: self.kind, fields: self.fields, index: self.index })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn duplicate_field_names_are_rejected() {
        let result = RecordSchema::builder("thing")
            .field(FieldSpec::required("name", FieldType::Text))
            .field(FieldSpec::optional("name", FieldType::Integer))
            .build();
        assert!(
            matches!(result, Err(EngineError::DuplicateField { ref field, .. }) if field == "name")
        );
    }

    #[test]
    fn field_lookup_by_name() {
        let schema = RecordSchema::builder("thing")
            .field(FieldSpec::required("name", FieldType::Text))
            .build()
            .unwrap();
        assert!(schema.field("name").is_some());
        assert!(schema.field("other").is_none());
        assert!(!schema.is_indexed());
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), *kind);
        }
        assert_eq!("user-profile".parse::<RecordKind>().unwrap(), RecordKind::UserProfile);
        assert!(matches!("college".parse::<RecordKind>(), Err(EngineError::UnknownSchema(_))));
    }

    #[test]
    fn non_object_root_is_invalid() {
        assert!(into_record(json!({"a": 1})).is_ok());
        assert!(matches!(into_record(json!([1])), Err(EngineError::InvalidRecord(_))));
    }
}
