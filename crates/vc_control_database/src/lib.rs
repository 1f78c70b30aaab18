//! Guild configuration store for VC Control.
//!
//! Maps a guild id to an arbitrary JSON settings object persisted in the
//! `guild_configs` table.
//!
//! # Features
//!
//! - Diesel-based PostgreSQL store with an r2d2 connection pool
//! - Additive, best-effort schema migration at startup
//! - Tiered upserts that degrade to narrower write shapes on legacy tables
//! - A disabled store used when no database endpoint is configured
//! - An in-process cache that keeps settings available in either mode
//!
//! # Example
//!
//! ```rust,ignore
//! use vc_control_database::{GuildConfigCache, StoreSettings, open_store};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = StoreSettings::from_env();
//! let store = open_store(settings.as_ref())?;
//! store.ensure_schema().await;
//!
//! let cache = GuildConfigCache::new(store);
//! cache.warm().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod connection;
mod postgres;
mod store;
mod table;

pub use cache::GuildConfigCache;
pub use connection::{StoreSettings, StoreSettingsBuilder, open_store};
pub use postgres::PostgresGuildConfigStore;
pub use store::{
    DisabledGuildConfigStore, GuildConfigRecord, GuildConfigStore, SaveAllReport, SaveOutcome,
    StorageResult,
};
pub use table::{
    ConfigTable, ConfigWrite, SCHEMA_STATEMENTS, StoredRecord, TableColumns, WriteShape,
    decode_stored,
    ensure_schema, read_all, read_one, read_record, write_batch, write_tiered,
};

use vc_control_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
