//! The single mutation path: normalize, validate, round, re-index, stamp.
//!
//! A mutation is accepted or rejected as a whole. When validation fails the
//! caller gets every violation and nothing else happens: no index rebuild, no
//! timestamp, and no record to persist.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::constants::{CREATED_AT_FIELD, UPDATED_AT_FIELD};
use crate::error::{EngineError, Result};
use crate::index::{SearchDocument, build_index};
use crate::normalize::{finalize_record, normalize_record};
use crate::schema::{Record, RecordSchema, SchemaRegistry};
use crate::validate::validate;

/// Source of the current time for timestamp stamping.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A create or update request.
#[derive(Debug, Clone)]
pub enum Mutation {
    Create {
        kind: String,
        record: Record,
    },
    /// `patch` is merged shallowly over `current`; a `null` in the patch clears
    /// the field. Timestamp fields in the patch are ignored.
    Update {
        kind: String,
        current: Record,
        current_document: Option<SearchDocument>,
        patch: Record,
    },
}

impl Mutation {
    #[must_use]
    pub fn create(kind: impl Into<String>, record: Record) -> Self {
        Self::Create { kind: kind.into(), record }
    }

    #[must_use]
    pub fn update(
        kind: impl Into<String>,
        current: Record,
        current_document: Option<SearchDocument>,
        patch: Record,
    ) -> Self {
        Self::Update { kind: kind.into(), current, current_document, patch }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Create { kind, .. } | Self::Update { kind, .. } => kind,
        }
    }
}

/// Result of an accepted mutation, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedMutation {
    pub kind: String,
    pub record: Record,
    /// `None` for kinds without an index spec.
    pub document: Option<SearchDocument>,
    /// Whether `document` was rebuilt by this mutation.
    pub reindexed: bool,
}

fn is_managed(field: &str) -> bool {
    field == CREATED_AT_FIELD || field == UPDATED_AT_FIELD
}

fn format_timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn ensure_valid(schema: &RecordSchema, record: &Record) -> Result<()> {
    let violations = validate(schema, record);
    if violations.is_empty() {
        return Ok(());
    }
    tracing::info!(kind = schema.kind(), violations = violations.len(), "mutation rejected");
    Err(EngineError::ValidationFailed(violations.into()))
}

#[derive(Debug, Clone)]
pub struct MutationPipeline {
    registry: Arc<SchemaRegistry>,
    clock: Arc<dyn Clock>,
}

impl MutationPipeline {
    #[must_use]
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry, clock: Arc::new(SystemClock) }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Runs a mutation through normalize → validate → round → index → stamp.
    ///
    /// # Errors
    /// `UnknownSchema` for an unregistered kind, `ValidationFailed` with the full
    /// violation list when the resulting record breaks any constraint.
    pub fn apply(&self, mutation: Mutation) -> Result<AcceptedMutation> {
        match mutation {
            Mutation::Create { kind, record } => self.create(kind, record),
            Mutation::Update { kind, current, current_document, patch } => {
                self.update(kind, current, current_document, patch)
            },
        }
    }

    fn create(&self, kind: String, mut record: Record) -> Result<AcceptedMutation> {
        let schema = self.registry.lookup(&kind)?;
        normalize_record(schema, &mut record);
        ensure_valid(schema, &record)?;
        finalize_record(schema, &mut record);

        let document = schema.is_indexed().then(|| build_index(schema, &record));

        if schema.field(CREATED_AT_FIELD).is_some() {
            let supplied = record.get(CREATED_AT_FIELD).is_some_and(Value::is_string);
            if !supplied {
                record.insert(CREATED_AT_FIELD.to_owned(), format_timestamp(self.clock.now()));
            }
            if schema.field(UPDATED_AT_FIELD).is_some() {
                let created = record.get(CREATED_AT_FIELD).cloned().unwrap_or(Value::Null);
                record.insert(UPDATED_AT_FIELD.to_owned(), created);
            }
        }

        tracing::debug!(kind = %kind, indexed = document.is_some(), "create accepted");
        let reindexed = document.is_some();
        Ok(AcceptedMutation { kind, record, document, reindexed })
    }

    fn update(
        &self,
        kind: String,
        current: Record,
        current_document: Option<SearchDocument>,
        patch: Record,
    ) -> Result<AcceptedMutation> {
        let schema = self.registry.lookup(&kind)?;

        let mut record = current;
        let mut touched = Vec::with_capacity(patch.len());
        for (field, value) in patch {
            if is_managed(&field) {
                continue;
            }
            if value.is_null() {
                record.remove(&field);
            } else {
                record.insert(field.clone(), value);
            }
            touched.push(field);
        }

        normalize_record(schema, &mut record);
        ensure_valid(schema, &record)?;
        finalize_record(schema, &mut record);

        let reindex = schema.is_indexed()
            && (current_document.is_none()
                || schema.index().is_triggered_by(touched.iter().map(String::as_str)));
        let document = if reindex {
            Some(build_index(schema, &record))
        } else if schema.is_indexed() {
            current_document
        } else {
            None
        };

        if schema.field(UPDATED_AT_FIELD).is_some() {
            record.insert(UPDATED_AT_FIELD.to_owned(), format_timestamp(self.clock.now()));
        }

        tracing::debug!(kind = %kind, touched = touched.len(), reindexed = reindex, "update accepted");
        Ok(AcceptedMutation { kind, record, document, reindexed: reindex })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::env_config::EngineConfig;
    use crate::index::Tier;
    use crate::schema::into_record;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    fn pipeline(hour: u32) -> MutationPipeline {
        MutationPipeline::new(Arc::new(SchemaRegistry::builtin(&EngineConfig::default())))
            .with_clock(Arc::new(FixedClock(at(hour))))
    }

    fn notice() -> Record {
        into_record(json!({
            "college_key": "engineering",
            "title": "Scholarship Notice",
            "url": "https://engineering.yonsei.ac.kr/notice/1",
            "hashtags_ai": ["#장학"],
            "detailed_hashtags": ["#국가장학"],
            "body_text": "신청 안내"
        }))
        .unwrap()
    }

    fn created_notice() -> AcceptedMutation {
        pipeline(9).apply(Mutation::create("notice", notice())).unwrap()
    }

    fn patch(value: Value) -> Record {
        into_record(value).unwrap()
    }

    #[test]
    fn create_indexes_and_sets_equal_timestamps() {
        let accepted = created_notice();
        assert!(accepted.reindexed);
        let doc = accepted.document.expect("notice is indexed");
        assert!(doc.tier(Tier::D).any(|t| t == "공대"));
        assert_eq!(accepted.record[CREATED_AT_FIELD], json!("2025-03-01T09:00:00.000Z"));
        assert_eq!(accepted.record[UPDATED_AT_FIELD], accepted.record[CREATED_AT_FIELD]);
    }

    #[test]
    fn create_keeps_supplied_created_at() {
        let mut record = notice();
        record.insert(CREATED_AT_FIELD.to_owned(), json!("2024-12-31T23:59:59Z"));
        record.insert(UPDATED_AT_FIELD.to_owned(), json!("2030-01-01T00:00:00Z"));
        let accepted = pipeline(9).apply(Mutation::create("notice", record)).unwrap();
        assert_eq!(accepted.record[CREATED_AT_FIELD], json!("2024-12-31T23:59:59Z"));
        assert_eq!(accepted.record[UPDATED_AT_FIELD], json!("2024-12-31T23:59:59Z"));
    }

    #[test]
    fn create_normalizes_email_before_validation() {
        let record = patch(json!({"email": " Test@Example.COM "}));
        let accepted = pipeline(9).apply(Mutation::create("user", record)).unwrap();
        assert_eq!(accepted.record["email"], json!("test@example.com"));
        assert!(accepted.document.is_none());
        assert!(!accepted.reindexed);
    }

    #[test]
    fn rejected_create_reports_every_violation() {
        let record = patch(json!({"college_key": "bad key!", "url": "ftp://x"}));
        let err = pipeline(9).apply(Mutation::create("notice", record)).unwrap_err();
        let ids: Vec<&str> = err.violations().iter().map(|v| v.constraint.as_str()).collect();
        assert_eq!(ids, vec!["college_key_format", "required", "url_format"]);
    }

    #[test]
    fn unknown_kind_is_fatal() {
        let err = pipeline(9).apply(Mutation::create("college", Record::new())).unwrap_err();
        assert!(matches!(err, EngineError::UnknownSchema(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn update_of_indexed_field_rebuilds_document() {
        let created = created_notice();
        let accepted = pipeline(10)
            .apply(Mutation::update(
                "notice",
                created.record,
                created.document,
                patch(json!({"title": "Dormitory Notice"})),
            ))
            .unwrap();
        assert!(accepted.reindexed);
        let doc = accepted.document.unwrap();
        assert_eq!(doc.tier(Tier::A).collect::<Vec<_>>(), vec!["dormitory", "notice"]);
        assert_eq!(accepted.record[CREATED_AT_FIELD], json!("2025-03-01T09:00:00.000Z"));
        assert_eq!(accepted.record[UPDATED_AT_FIELD], json!("2025-03-01T10:00:00.000Z"));
    }

    #[test]
    fn update_of_other_field_keeps_document() {
        let created = created_notice();
        let before = created.document.clone();
        let accepted = pipeline(10)
            .apply(Mutation::update(
                "notice",
                created.record,
                created.document,
                patch(json!({"summary_raw": "요약"})),
            ))
            .unwrap();
        assert!(!accepted.reindexed);
        assert_eq!(accepted.document, before);
        assert_eq!(accepted.record[UPDATED_AT_FIELD], json!("2025-03-01T10:00:00.000Z"));
    }

    #[test]
    fn update_without_stored_document_rebuilds() {
        let created = created_notice();
        let accepted = pipeline(10)
            .apply(Mutation::update("notice", created.record, None, patch(json!({"url": "https://a.b/c"}))))
            .unwrap();
        assert!(accepted.reindexed);
        assert!(accepted.document.is_some());
    }

    #[test]
    fn failed_update_reports_every_violation() {
        let created = created_notice();
        let err = pipeline(10)
            .apply(Mutation::update(
                "notice",
                created.record,
                created.document,
                patch(json!({"title": null, "hashtags_ai": ["장학"]})),
            ))
            .unwrap_err();
        let ids: Vec<&str> = err.violations().iter().map(|v| v.constraint.as_str()).collect();
        assert_eq!(ids, vec!["required", "hashtags_ai_hash_prefix"]);
    }

    fn profile(gpa: Value) -> Record {
        patch(json!({
            "user_id": "4f9a4c39-0c55-4f1e-9d1b-2f7c0f1b9a10",
            "gender": "female",
            "age": 22,
            "major": "컴퓨터과학과",
            "grade": 3,
            "keywords": ["#장학"],
            "gpa": gpa
        }))
    }

    #[test]
    fn gpa_range_is_checked_before_rounding() {
        for gpa in [json!(4.504), json!(-0.004)] {
            let err = pipeline(9).apply(Mutation::create("user_profile", profile(gpa.clone()))).unwrap_err();
            let ids: Vec<&str> = err.violations().iter().map(|v| v.constraint.as_str()).collect();
            assert_eq!(ids, vec!["gpa_range"], "gpa {gpa}");
        }
    }

    #[test]
    fn accepted_gpa_is_rounded() {
        let accepted = pipeline(9).apply(Mutation::create("user_profile", profile(json!(3.856)))).unwrap();
        assert_eq!(accepted.record["gpa"], json!(3.86));

        let err = pipeline(10)
            .apply(Mutation::update(
                "user_profile",
                accepted.record,
                None,
                patch(json!({"gpa": 4.504})),
            ))
            .unwrap_err();
        assert!(err.violations().iter().any(|v| v.constraint == "gpa_range"));
    }

    #[test]
    fn managed_fields_in_patch_are_ignored() {
        let created = created_notice();
        let accepted = pipeline(11)
            .apply(Mutation::update(
                "notice",
                created.record,
                created.document,
                patch(json!({"created_at": "1999-01-01T00:00:00Z", "updated_at": "1999-01-01T00:00:00Z"})),
            ))
            .unwrap();
        assert!(!accepted.reindexed);
        assert_eq!(accepted.record[CREATED_AT_FIELD], json!("2025-03-01T09:00:00.000Z"));
        assert_eq!(accepted.record[UPDATED_AT_FIELD], json!("2025-03-01T11:00:00.000Z"));
    }

    #[test]
    fn applying_same_create_twice_is_deterministic() {
        let a = pipeline(9).apply(Mutation::create("notice", notice())).unwrap();
        let b = pipeline(9).apply(Mutation::create("notice", notice())).unwrap();
        assert_eq!(a, b);
    }
}
