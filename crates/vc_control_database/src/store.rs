//! The guild configuration store contract and its disabled implementation.

use crate::WriteShape;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::debug;
use vc_control_error::StorageError;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// What a single save did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The row was written with the given shape.
    Written(WriteShape),
    /// The store is disabled; nothing was written.
    Skipped,
}

/// Per-guild result of a batch save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveAllReport {
    /// Guilds written, with the shape each needed
    pub written: Vec<(String, WriteShape)>,
    /// Guilds whose every write shape failed, with the last failure
    pub failed: Vec<(String, String)>,
}

impl SaveAllReport {
    /// Whether every entry was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A guild's stored configuration with its metadata columns.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct GuildConfigRecord {
    guild_id: String,
    name: Option<String>,
    data: JsonValue,
    updated_at: Option<DateTime<Utc>>,
}

impl GuildConfigRecord {
    /// Create a record.
    pub fn new(
        guild_id: impl Into<String>,
        name: Option<String>,
        data: JsonValue,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            name,
            data,
            updated_at,
        }
    }
}

/// Persistence for guild id → settings object.
///
/// Every implementation checks whether it is enabled before anything else;
/// a disabled store answers loads with empty results and accepts saves
/// without error.
#[async_trait]
pub trait GuildConfigStore: Send + Sync {
    /// Whether a database endpoint backs this store.
    fn is_enabled(&self) -> bool;

    /// Create the table and add missing columns. Failures are logged and
    /// swallowed.
    async fn ensure_schema(&self);

    /// Every stored config keyed by guild id.
    async fn load_all(&self) -> StorageResult<BTreeMap<String, JsonValue>>;

    /// One guild's config, `None` when absent.
    async fn load_one(&self, guild_id: &str) -> StorageResult<Option<JsonValue>>;

    /// One guild's config with its name and last write time.
    async fn load_record(&self, guild_id: &str) -> StorageResult<Option<GuildConfigRecord>>;

    /// Upsert one guild's config.
    async fn save_one(&self, guild_id: &str, config: &JsonValue) -> StorageResult<SaveOutcome>;

    /// Upsert every entry in one transaction, continuing past failures.
    async fn save_all(&self, configs: &BTreeMap<String, JsonValue>) -> StorageResult<SaveAllReport>;
}

/// Store used when no database endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGuildConfigStore;

impl DisabledGuildConfigStore {
    /// Create a disabled store.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GuildConfigStore for DisabledGuildConfigStore {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn ensure_schema(&self) {
        debug!("Configuration store disabled, skipping schema");
    }

    async fn load_all(&self) -> StorageResult<BTreeMap<String, JsonValue>> {
        Ok(BTreeMap::new())
    }

    async fn load_one(&self, _guild_id: &str) -> StorageResult<Option<JsonValue>> {
        Ok(None)
    }

    async fn load_record(&self, _guild_id: &str) -> StorageResult<Option<GuildConfigRecord>> {
        Ok(None)
    }

    async fn save_one(&self, guild_id: &str, _config: &JsonValue) -> StorageResult<SaveOutcome> {
        debug!(guild_id, "Configuration store disabled, not persisting");
        Ok(SaveOutcome::Skipped)
    }

    async fn save_all(&self, configs: &BTreeMap<String, JsonValue>) -> StorageResult<SaveAllReport> {
        debug!(count = configs.len(), "Configuration store disabled, not persisting");
        Ok(SaveAllReport::default())
    }
}
