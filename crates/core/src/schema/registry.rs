use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use super::{RecordKind, RecordSchema, notice_schema, user_profile_schema, user_schema};
use crate::env_config::EngineConfig;
use crate::error::{EngineError, Result};

static GLOBAL_REGISTRY: LazyLock<Arc<SchemaRegistry>> = LazyLock::new(|| {
    let config = EngineConfig::from_env();
    tracing::debug!(score_coercion = %config.score_coercion, "initializing schema registry");
    Arc::new(SchemaRegistry::builtin(&config))
});

/// Kind name to schema. Populated at startup, then shared read-only.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, RecordSchema>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `user`, `user_profile` and `notice` schemas.
    #[must_use]
    pub fn builtin(config: &EngineConfig) -> Self {
        let schemas = [user_schema(), user_profile_schema(config.score_coercion), notice_schema()]
            .into_iter()
            .map(|schema| (schema.kind().to_owned(), schema))
            .collect();
        Self { schemas }
    }

    /// Process-wide built-in registry, configured from the environment on first use.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// # Errors
    /// Returns `DuplicateSchema` if the kind is already registered.
    pub fn register(&mut self, schema: RecordSchema) -> Result<()> {
        if self.schemas.contains_key(schema.kind()) {
            return Err(EngineError::DuplicateSchema(schema.kind().to_owned()));
        }
        tracing::debug!(kind = schema.kind(), fields = schema.fields().len(), "registered schema");
        self.schemas.insert(schema.kind().to_owned(), schema);
        Ok(())
    }

    /// # Errors
    /// Returns `UnknownSchema` if no schema is registered under `kind`.
    pub fn lookup(&self, kind: &str) -> Result<&RecordSchema> {
        self.schemas.get(kind).ok_or_else(|| EngineError::UnknownSchema(kind.to_owned()))
    }

    /// # Errors
    /// Returns `UnknownSchema` if the built-in kind was not registered.
    pub fn schema_for(&self, kind: RecordKind) -> Result<&RecordSchema> {
        self.lookup(kind.as_str())
    }

    /// Registered kind names, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}
