use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use noticeboard_core::constants::EMAIL_FIELD;
use noticeboard_core::{RecordKind, normalize_email};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::traits::{RecordStore, StoredRecord};

#[derive(Debug, Default)]
struct Tables {
    /// Keyed by `(kind, id)` so listing a kind is an ordered range scan.
    records: BTreeMap<(String, String), StoredRecord>,
    /// Normalized user email to user id.
    emails: HashMap<String, String>,
}

fn user_email(stored: &StoredRecord) -> Option<String> {
    if stored.kind != RecordKind::User.as_str() {
        return None;
    }
    stored.record.get(EMAIL_FIELD).and_then(Value::as_str).map(normalize_email)
}

impl Tables {
    fn insert(&mut self, stored: StoredRecord) -> Result<(), StorageError> {
        let email = user_email(&stored);
        if let Some(email) = &email {
            if self.emails.get(email).is_some_and(|holder| *holder != stored.id) {
                return Err(StorageError::Duplicate(format!("email {email} is already registered")));
            }
        }

        let key = (stored.kind.clone(), stored.id.clone());
        if let Some(previous) = self.records.get(&key).and_then(user_email) {
            self.emails.remove(&previous);
        }
        if let Some(email) = email {
            self.emails.insert(email, stored.id.clone());
        }
        self.records.insert(key, stored);
        Ok(())
    }
}

/// Reference backend holding every record in memory behind one lock.
///
/// Writers are serialized, so the email check and the insert are atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns `Duplicate` if two user records share a normalized email.
    pub fn from_records<I>(records: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = StoredRecord>,
    {
        let mut tables = Tables::default();
        for stored in records {
            tables.insert(stored)?;
        }
        Ok(Self { tables: RwLock::new(tables) })
    }

    /// Loads a JSON snapshot written by [`persist`](Self::persist). A missing
    /// file yields an empty store.
    ///
    /// # Errors
    /// Fails on unreadable or malformed snapshots.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no snapshot, starting empty");
                return Ok(Self::new());
            },
            Err(e) => return Err(e.into()),
        };
        let records: Vec<StoredRecord> = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %path.display(), records = records.len(), "loaded snapshot");
        Self::from_records(records)
    }

    /// Writes every record to `path` as a JSON array, replacing it atomically.
    ///
    /// # Errors
    /// Fails if the file cannot be written.
    pub async fn persist(&self, path: &Path) -> Result<(), StorageError> {
        let json = {
            let tables = self.tables.read().await;
            let records: Vec<&StoredRecord> = tables.records.values().collect();
            serde_json::to_vec_pretty(&records)?
        };
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        tracing::debug!(path = %path.display(), "wrote snapshot");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get(&self, kind: &str, id: &str) -> Result<Option<StoredRecord>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.records.get(&(kind.to_owned(), id.to_owned())).cloned())
    }

    async fn put(&self, record: StoredRecord) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        tables.insert(record)
    }

    async fn email_taken(
        &self,
        email: &str,
        except_id: Option<&str>,
    ) -> Result<bool, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(&normalize_email(email))
            .is_some_and(|holder| Some(holder.as_str()) != except_id))
    }

    async fn list(&self, kind: &str) -> Result<Vec<StoredRecord>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .iter()
            .filter(|((k, _), _)| k == kind)
            .map(|(_, stored)| stored.clone())
            .collect())
    }
}
