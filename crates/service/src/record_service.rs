use std::sync::Arc;

use noticeboard_core::constants::{EMAIL_FIELD, EMAIL_UNIQUE_CONSTRAINT};
use noticeboard_core::{
    AcceptedMutation, ConstraintViolation, EngineError, Mutation, MutationPipeline, Record,
    RecordKind,
};
use noticeboard_storage::{RecordStore, StorageError, StoredRecord};
use serde_json::Value;

use crate::ServiceError;

/// Runs create and update mutations through the pipeline and persists the
/// accepted result. The email unique check sits between the two.
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    pipeline: MutationPipeline,
}

impl RecordService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, pipeline: MutationPipeline) -> Self {
        Self { store, pipeline }
    }

    #[must_use]
    pub fn pipeline(&self) -> &MutationPipeline {
        &self.pipeline
    }

    /// Validates, indexes and stores a new record under a fresh id.
    pub async fn create(&self, kind: &str, record: Record) -> Result<StoredRecord, ServiceError> {
        let accepted = self.pipeline.apply(Mutation::create(kind, record))?;
        let id = uuid::Uuid::new_v4().to_string();
        self.ensure_email_unique(&accepted, None).await?;
        let stored = into_stored(id, accepted);
        self.store.put(stored.clone()).await?;
        tracing::info!(kind, id = %stored.id, "record created");
        Ok(stored)
    }

    /// Applies a shallow patch to an existing record.
    pub async fn update(
        &self,
        kind: &str,
        id: &str,
        patch: Record,
    ) -> Result<StoredRecord, ServiceError> {
        let current =
            self.store.get(kind, id).await?.ok_or_else(|| StorageError::not_found(kind, id))?;
        let accepted =
            self.pipeline.apply(Mutation::update(kind, current.record, current.document, patch))?;
        self.ensure_email_unique(&accepted, Some(id)).await?;
        let reindexed = accepted.reindexed;
        let stored = into_stored(id.to_owned(), accepted);
        self.store.put(stored.clone()).await?;
        tracing::info!(kind, id, reindexed, "record updated");
        Ok(stored)
    }

    pub async fn get(&self, kind: &str, id: &str) -> Result<StoredRecord, ServiceError> {
        self.pipeline.registry().lookup(kind)?;
        Ok(self.store.get(kind, id).await?.ok_or_else(|| StorageError::not_found(kind, id))?)
    }

    pub async fn list(&self, kind: &str) -> Result<Vec<StoredRecord>, ServiceError> {
        self.pipeline.registry().lookup(kind)?;
        Ok(self.store.list(kind).await?)
    }

    /// Reports a taken email as an `email_unique` violation. Runs only once the
    /// pipeline has accepted the record, so it is reported on its own and never
    /// next to other constraint failures. The store still enforces it on `put`
    /// for writers racing past this check.
    async fn ensure_email_unique(
        &self,
        accepted: &AcceptedMutation,
        except_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        if accepted.kind != RecordKind::User.as_str() {
            return Ok(());
        }
        let Some(email) = accepted.record.get(EMAIL_FIELD).and_then(Value::as_str) else {
            return Ok(());
        };
        if !self.store.email_taken(email, except_id).await? {
            return Ok(());
        }
        tracing::info!(kind = %accepted.kind, "email already registered");
        let violation = ConstraintViolation::new(
            EMAIL_FIELD,
            EMAIL_UNIQUE_CONSTRAINT,
            "email is already registered",
        );
        Err(EngineError::ValidationFailed(vec![violation].into()).into())
    }
}

fn into_stored(id: String, accepted: AcceptedMutation) -> StoredRecord {
    StoredRecord {
        id,
        kind: accepted.kind,
        record: accepted.record,
        document: accepted.document,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use noticeboard_core::{EngineConfig, FixedClock, SchemaRegistry, Tier, into_record};
    use noticeboard_storage::InMemoryStore;
    use serde_json::json;

    use super::*;

    fn service_at(store: Arc<dyn RecordStore>, hour: u32) -> RecordService {
        let registry = Arc::new(SchemaRegistry::builtin(&EngineConfig::default()));
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap());
        let pipeline = MutationPipeline::new(registry).with_clock(Arc::new(clock));
        RecordService::new(store, pipeline)
    }

    fn service() -> RecordService {
        service_at(Arc::new(InMemoryStore::new()), 9)
    }

    fn record(value: Value) -> Record {
        into_record(value).unwrap()
    }

    fn notice() -> Record {
        record(json!({
            "college_key": "engineering",
            "title": "Scholarship Notice",
            "url": "https://engineering.yonsei.ac.kr/notice/1",
            "hashtags_ai": ["#장학"]
        }))
    }

    #[tokio::test]
    async fn create_stores_normalized_indexed_record() {
        let service = service();
        let stored = service.create("notice", notice()).await.unwrap();
        assert_eq!(stored.kind, "notice");
        assert!(stored.document.as_ref().unwrap().tier(Tier::B).any(|t| t == "장학"));

        let fetched = service.get("notice", &stored.id).await.unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn invalid_record_is_not_stored() {
        let service = service();
        let err = service.create("notice", record(json!({"title": "t"}))).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.violations().len(), 2);
        assert!(service.list("notice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_reported_as_violation() {
        let service = service();
        service.create("user", record(json!({"email": "test@example.com"}))).await.unwrap();
        let err =
            service.create("user", record(json!({"email": " TEST@example.com"}))).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.violations()[0].constraint, EMAIL_UNIQUE_CONSTRAINT);
    }

    #[tokio::test]
    async fn user_may_keep_own_email_on_update() {
        let service = service();
        let user = service.create("user", record(json!({"email": "a@example.com"}))).await.unwrap();
        let updated = service
            .update("user", &user.id, record(json!({"email": "A@Example.com"})))
            .await
            .unwrap();
        assert_eq!(updated.record["email"], json!("a@example.com"));
    }

    #[tokio::test]
    async fn update_reindexes_only_when_sources_change() {
        let service = service();
        let created = service.create("notice", notice()).await.unwrap();

        let untouched = service
            .update("notice", &created.id, record(json!({"summary_raw": "요약"})))
            .await
            .unwrap();
        assert_eq!(untouched.document, created.document);

        let retitled = service
            .update("notice", &created.id, record(json!({"title": "기숙사 안내"})))
            .await
            .unwrap();
        assert!(retitled.document.unwrap().tier(Tier::A).any(|t| t == "기숙사"));
    }

    #[tokio::test]
    async fn rejected_update_leaves_stored_record_untouched() {
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
        let created = service_at(Arc::clone(&store), 9).create("notice", notice()).await.unwrap();

        let later = service_at(Arc::clone(&store), 10);
        let err = later
            .update("notice", &created.id, record(json!({"title": null, "hashtags_ai": ["장학"]})))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let fetched = later.get("notice", &created.id).await.unwrap();
        assert_eq!(fetched.record, created.record);
        assert_eq!(fetched.document, created.document);
        assert_eq!(fetched.record["updated_at"], json!("2025-03-01T09:00:00.000Z"));
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let service = service();
        let err = service.update("notice", "nope", Record::new()).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(service.get("notice", "nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn unknown_kind_is_rejected() {
        let service = service();
        let err = service.get("college", "x").await.unwrap_err();
        assert!(matches!(err, ServiceError::Engine(EngineError::UnknownSchema(_))));
    }
}
