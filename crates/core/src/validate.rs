//! Constraint definitions and the record validator.
//!
//! Every column-level CHECK of the relational schema becomes one [`Constraint`]
//! with its own id, so a single pass can report every failing rule at once.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{REQUIRED_CONSTRAINT, TYPE_MISMATCH_CONSTRAINT};
use crate::error::EngineError;
use crate::schema::{FieldSpec, Record, RecordSchema};

static DIGITS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// One failed rule for one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub field: String,
    pub constraint: String,
    pub reason: String,
}

impl ConstraintViolation {
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        constraint: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self { field: field.into(), constraint: constraint.into(), reason: reason.into() }
    }

    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, REQUIRED_CONSTRAINT, "field is required")
    }

    /// Whether this is the missing-required-field violation.
    #[must_use]
    pub fn is_missing_field(&self) -> bool {
        self.constraint == REQUIRED_CONSTRAINT
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.constraint, self.reason)
    }
}

/// How a keyed sub-value of an object field is turned into text before
/// pattern and range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCoercion {
    /// Strings as-is, any other non-null JSON value as its JSON text
    /// (`900` becomes `"900"`, `900.5` becomes `"900.5"`).
    #[default]
    Textual,
    /// Only JSON strings are accepted; any other value fails the pattern check.
    StringOnly,
}

impl ScoreCoercion {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Textual => "textual",
            Self::StringOnly => "string_only",
        }
    }
}

impl fmt::Display for ScoreCoercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreCoercion {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "textual" => Ok(Self::Textual),
            "string_only" | "string-only" | "strict" => Ok(Self::StringOnly),
            other => Err(EngineError::InvalidConfig(format!("unknown score coercion '{other}'"))),
        }
    }
}

/// The predicate a [`Constraint`] evaluates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Rule {
    /// Numeric value within inclusive bounds.
    Range { min: f64, max: f64 },
    /// Case-sensitive membership in a fixed token set.
    OneOf { values: Vec<String> },
    /// Array holds at least one element.
    NonEmpty,
    /// Every element starts with `prefix`. Vacuously true for an empty array.
    ElementPrefix { prefix: char },
    /// No element appears twice (case-sensitive).
    Distinct,
    /// Every element belongs to the vocabulary. Vacuously true for an empty array.
    Whitelist { values: BTreeSet<String> },
    /// Value is a key-value object rather than an array or scalar.
    ObjectKind,
    /// If `key` is present, its text form is all ASCII digits.
    KeyedDigits { key: String, coercion: ScoreCoercion },
    /// If `key` is present and all digits, it parses into `[min, max]`.
    KeyedRange { key: String, min: u64, max: u64, coercion: ScoreCoercion },
    /// Text length in characters does not exceed `max`.
    MaxLength { max: usize },
    /// Text matches the pattern.
    Pattern {
        pattern: String,
        #[serde(skip)]
        regex: Regex,
    },
}

/// A named rule attached to a field.
#[derive(Debug, Clone, Serialize)]
pub struct Constraint {
    id: String,
    #[serde(flatten)]
    rule: Rule,
}

impl Constraint {
    #[must_use]
    pub fn new(id: impl Into<String>, rule: Rule) -> Self {
        Self { id: id.into(), rule }
    }

    #[must_use]
    pub fn range(id: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(id, Rule::Range { min, max })
    }

    #[must_use]
    pub fn one_of(id: impl Into<String>, values: &[&str]) -> Self {
        Self::new(id, Rule::OneOf { values: values.iter().map(|v| (*v).to_owned()).collect() })
    }

    #[must_use]
    pub fn non_empty(id: impl Into<String>) -> Self {
        Self::new(id, Rule::NonEmpty)
    }

    #[must_use]
    pub fn element_prefix(id: impl Into<String>, prefix: char) -> Self {
        Self::new(id, Rule::ElementPrefix { prefix })
    }

    #[must_use]
    pub fn distinct(id: impl Into<String>) -> Self {
        Self::new(id, Rule::Distinct)
    }

    #[must_use]
    pub fn whitelist(id: impl Into<String>, values: &[&str]) -> Self {
        Self::new(id, Rule::Whitelist { values: values.iter().map(|v| (*v).to_owned()).collect() })
    }

    #[must_use]
    pub fn object_kind(id: impl Into<String>) -> Self {
        Self::new(id, Rule::ObjectKind)
    }

    #[must_use]
    pub fn keyed_digits(id: impl Into<String>, key: &str, coercion: ScoreCoercion) -> Self {
        Self::new(id, Rule::KeyedDigits { key: key.to_owned(), coercion })
    }

    #[must_use]
    pub fn keyed_range(
        id: impl Into<String>,
        key: &str,
        min: u64,
        max: u64,
        coercion: ScoreCoercion,
    ) -> Self {
        Self::new(id, Rule::KeyedRange { key: key.to_owned(), min, max, coercion })
    }

    #[must_use]
    pub fn max_length(id: impl Into<String>, max: usize) -> Self {
        Self::new(id, Rule::MaxLength { max })
    }

    #[must_use]
    pub fn pattern(id: impl Into<String>, regex: &Regex) -> Self {
        Self::new(id, Rule::Pattern { pattern: regex.as_str().to_owned(), regex: regex.clone() })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Evaluates the rule against a present, correctly typed value.
    /// Returns the failure reason, or `None` when the value satisfies the rule.
    #[must_use]
    pub fn check(&self, value: &Value) -> Option<String> {
        match &self.rule {
            Rule::Range { min, max } => {
                let n = value.as_f64()?;
                (n < *min || n > *max).then(|| format!("must be between {min} and {max}, got {n}"))
            },
            Rule::OneOf { values } => {
                let s = value.as_str()?;
                (!values.iter().any(|v| v == s))
                    .then(|| format!("'{s}' is not one of {}", values.join(", ")))
            },
            Rule::NonEmpty => {
                let items = value.as_array()?;
                items.is_empty().then(|| "must contain at least one element".to_owned())
            },
            Rule::ElementPrefix { prefix } => {
                let bad: Vec<&str> =
                    text_elements(value).filter(|e| !e.starts_with(*prefix)).collect();
                (!bad.is_empty())
                    .then(|| format!("elements must start with '{prefix}': {}", bad.join(", ")))
            },
            Rule::Distinct => {
                let items: Vec<&str> = text_elements(value).collect();
                let distinct: HashSet<&str> = items.iter().copied().collect();
                (distinct.len() != items.len()).then(|| "elements must be unique".to_owned())
            },
            Rule::Whitelist { values } => {
                let bad: Vec<&str> =
                    text_elements(value).filter(|e| !values.contains(*e)).collect();
                (!bad.is_empty()).then(|| format!("not in the allowed set: {}", bad.join(", ")))
            },
            Rule::ObjectKind => {
                (!value.is_object()).then(|| format!("must be an object, got {}", json_kind(value)))
            },
            Rule::KeyedDigits { key, coercion } => match keyed_text(value, key, *coercion) {
                KeyedText::Absent => None,
                KeyedText::Text(text) if DIGITS_REGEX.is_match(&text) => None,
                KeyedText::Text(text) => Some(format!("'{key}' must be all digits, got '{text}'")),
                KeyedText::NotText(kind) => Some(format!("'{key}' must be a string, got {kind}")),
            },
            Rule::KeyedRange { key, min, max, coercion } => {
                let KeyedText::Text(text) = keyed_text(value, key, *coercion) else {
                    return None;
                };
                if !DIGITS_REGEX.is_match(&text) {
                    return None;
                }
                let in_range = text.parse::<u64>().is_ok_and(|n| n >= *min && n <= *max);
                (!in_range).then(|| format!("'{key}' must be between {min} and {max}, got {text}"))
            },
            Rule::MaxLength { max } => {
                let len = value.as_str()?.chars().count();
                (len > *max).then(|| format!("must be at most {max} characters, got {len}"))
            },
            Rule::Pattern { pattern, regex } => {
                let s = value.as_str()?;
                (!regex.is_match(s)).then(|| format!("'{s}' does not match {pattern}"))
            },
        }
    }
}

enum KeyedText {
    Absent,
    Text(String),
    NotText(&'static str),
}

/// Mirrors `column->>'key'`: missing keys and JSON nulls read as absent.
fn keyed_text(value: &Value, key: &str, coercion: ScoreCoercion) -> KeyedText {
    let Some(inner) = value.as_object().and_then(|obj| obj.get(key)) else {
        return KeyedText::Absent;
    };
    match (inner, coercion) {
        (Value::Null, _) => KeyedText::Absent,
        (Value::String(s), _) => KeyedText::Text(s.clone()),
        (other, ScoreCoercion::Textual) => KeyedText::Text(other.to_string()),
        (other, ScoreCoercion::StringOnly) => KeyedText::NotText(json_kind(other)),
    }
}

fn text_elements(value: &Value) -> impl Iterator<Item = &str> {
    value.as_array().into_iter().flatten().filter_map(Value::as_str)
}

/// JSON type name for error messages.
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "decimal",
        Value::String(_) => "text",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validates a record against its schema, collecting every violation.
///
/// Absent or null optional fields are skipped entirely. A required field that is
/// absent or null yields a single `required` violation; a value of the wrong
/// type yields a single `type_mismatch` violation. Otherwise every constraint
/// of the field is evaluated. Fields the schema does not declare are ignored.
#[must_use]
pub fn validate(schema: &RecordSchema, record: &Record) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();
    for spec in schema.fields() {
        validate_field(spec, record.get(spec.name()), &mut violations);
    }
    if !violations.is_empty() {
        tracing::debug!(
            kind = schema.kind(),
            violations = violations.len(),
            "record failed validation"
        );
    }
    violations
}

fn validate_field(spec: &FieldSpec, value: Option<&Value>, out: &mut Vec<ConstraintViolation>) {
    let value = match value {
        Some(v) if !v.is_null() => v,
        _ => {
            if spec.is_required() {
                out.push(ConstraintViolation::missing_field(spec.name()));
            }
            return;
        },
    };

    if !spec.field_type().accepts(value) {
        out.push(ConstraintViolation::new(
            spec.name(),
            TYPE_MISMATCH_CONSTRAINT,
            format!("expected {}, got {}", spec.field_type().as_str(), json_kind(value)),
        ));
        return;
    }

    for constraint in spec.constraints() {
        if let Some(reason) = constraint.check(value) {
            out.push(ConstraintViolation::new(spec.name(), constraint.id(), reason));
        }
    }
}
