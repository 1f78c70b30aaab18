//! Store connection settings.

use crate::{DatabaseResult, DisabledGuildConfigStore, GuildConfigStore, PostgresGuildConfigStore};
use derive_getters::Getters;
use std::sync::Arc;
use tracing::info;

/// Settings for the PostgreSQL-backed store.
///
/// # Example
///
/// ```
/// use vc_control_database::StoreSettingsBuilder;
///
/// let settings = StoreSettingsBuilder::default()
///     .database_url("postgres://bot@db/vc".to_string())
///     .build()
///     .expect("url is set");
///
/// assert_eq!(settings.connection_url(), "postgres://bot@db/vc?sslmode=require");
/// assert_eq!(*settings.pool_size(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct StoreSettings {
    /// Connection URL, normally taken from `DATABASE_URL`
    database_url: String,
    /// Append `sslmode=require` when the URL names no `sslmode`
    #[builder(default = "true")]
    require_ssl: bool,
    /// Maximum pooled connections
    #[builder(default = "4")]
    pool_size: u32,
    /// Seconds to wait for a pooled connection
    #[builder(default = "30")]
    connection_timeout_secs: u64,
}

impl StoreSettings {
    /// Settings from `DATABASE_URL`, or `None` when it is unset or empty.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;
        Self::from_url(url)
    }

    /// Settings for `url` with default pool options, `None` when it is blank.
    pub fn from_url(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return None;
        }
        StoreSettingsBuilder::default().database_url(url).build().ok()
    }

    /// Override whether `sslmode=require` is appended.
    pub fn with_require_ssl(mut self, require_ssl: bool) -> Self {
        self.require_ssl = require_ssl;
        self
    }

    /// Override the pool size.
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// The URL handed to the driver.
    pub fn connection_url(&self) -> String {
        if !self.require_ssl || self.database_url.contains("sslmode=") {
            return self.database_url.clone();
        }
        let separator = if self.database_url.contains('?') { '&' } else { '?' };
        format!("{}{}sslmode=require", self.database_url, separator)
    }
}

/// Open the store for `settings`, or a disabled store when there are none.
///
/// The PostgreSQL pool connects lazily, so an unreachable server surfaces
/// on first use rather than here.
pub fn open_store(settings: Option<&StoreSettings>) -> DatabaseResult<Arc<dyn GuildConfigStore>> {
    match settings {
        Some(settings) => {
            info!(pool_size = settings.pool_size, "Configuration store enabled");
            Ok(Arc::new(PostgresGuildConfigStore::connect(settings)?))
        }
        None => {
            info!("DATABASE_URL not set - configuration store disabled");
            Ok(Arc::new(DisabledGuildConfigStore::new()))
        }
    }
}
