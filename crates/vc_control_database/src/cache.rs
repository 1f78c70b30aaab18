//! In-process guild configuration cache.

use crate::{GuildConfigStore, SaveOutcome, StorageResult};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};
use vc_control_core::{GuildId, GuildSettings};

/// Guild settings held in memory in front of a [`GuildConfigStore`].
///
/// Reads are served from memory once a guild has been seen. Updates patch a
/// copy, persist it, and replace the cached object only once the store
/// accepted it; with a disabled store every save is accepted, so settings
/// live for the process. Updates are serialized, so stored rows land in the
/// order their patches were applied. The entry map lock is never held across
/// a store call.
pub struct GuildConfigCache {
    store: Arc<dyn GuildConfigStore>,
    entries: RwLock<HashMap<GuildId, JsonValue>>,
    writes: Mutex<()>,
}

impl std::fmt::Debug for GuildConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuildConfigCache")
            .field("store_enabled", &self.store.is_enabled())
            .finish_non_exhaustive()
    }
}

impl GuildConfigCache {
    /// Create an empty cache over `store`.
    pub fn new(store: Arc<dyn GuildConfigStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
            writes: Mutex::new(()),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn GuildConfigStore> {
        &self.store
    }

    /// Seed the cache from every stored config. Returns how many guilds
    /// were loaded; rows whose key is not a guild id are skipped.
    #[instrument(skip(self))]
    pub async fn warm(&self) -> StorageResult<usize> {
        let stored = self.store.load_all().await?;
        let mut entries = self.entries.write().await;
        let mut loaded = 0;
        for (key, value) in stored {
            match key.trim().parse::<u64>() {
                Ok(id) => {
                    entries.insert(GuildId(id), value);
                    loaded += 1;
                }
                Err(_) => warn!(key, "Skipping config row with a non-numeric guild id"),
            }
        }
        debug!(loaded, "Config cache warmed");
        Ok(loaded)
    }

    /// The raw config for `guild`, loading it from the store on a miss.
    pub async fn get(&self, guild: GuildId) -> StorageResult<Option<JsonValue>> {
        if let Some(value) = self.entries.read().await.get(&guild) {
            return Ok(Some(value.clone()));
        }
        let loaded = self.store.load_one(&guild.to_string()).await?;
        if let Some(value) = &loaded {
            self.entries
                .write()
                .await
                .entry(guild)
                .or_insert_with(|| value.clone());
        }
        Ok(loaded)
    }

    /// Typed settings for `guild`; empty when nothing is stored.
    pub async fn settings(&self, guild: GuildId) -> StorageResult<GuildSettings> {
        Ok(self
            .get(guild)
            .await?
            .map(|value| GuildSettings::from_value(&value))
            .unwrap_or_default())
    }

    /// Read-modify-write `guild`'s config and persist the result.
    ///
    /// `name` is recorded as the display label when given. When persisting
    /// fails the cached copy is left as it was.
    #[instrument(skip(self, patch), fields(guild = %guild))]
    pub async fn update<F>(
        &self,
        guild: GuildId,
        name: Option<&str>,
        patch: F,
    ) -> StorageResult<SaveOutcome>
    where
        F: FnOnce(&mut JsonValue) + Send,
    {
        let _serialized = self.writes.lock().await;
        let mut updated = self
            .get(guild)
            .await?
            .unwrap_or_else(|| JsonValue::Object(Map::new()));
        patch(&mut updated);
        if let Some(name) = name {
            GuildSettings::stamp_name(&mut updated, name);
        }

        let outcome = self.store.save_one(&guild.to_string(), &updated).await?;
        self.entries.write().await.insert(guild, updated);
        Ok(outcome)
    }
}
