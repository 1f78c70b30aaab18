//! Bot configuration loaded from an optional TOML file.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vc_control_core::GuildId;
use vc_control_database::StoreSettings;
use vc_control_error::ConfigError;

/// Top-level bot configuration.
///
/// Every section and field has a default, so an empty file is valid.
///
/// # Example
///
/// ```
/// use vc_control::BotConfig;
///
/// let config = BotConfig::from_toml_str(
///     r#"
/// [store]
/// require_ssl = false
///
/// [discord]
/// dev_guild = 1234
/// "#,
/// )
/// .expect("valid config");
///
/// assert!(!config.store().require_ssl());
/// assert_eq!(*config.store().pool_size(), 4);
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[serde(default)]
#[builder(default, setter(into))]
pub struct BotConfig {
    /// Guild config store options
    store: StoreSection,
    /// Log output options
    logging: LoggingSection,
    /// Gateway and command options
    discord: DiscordSection,
}

impl BotConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid TOML for this
    /// layout.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::new(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on invalid TOML or unknown value types.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::new(format!("Invalid bot configuration: {}", e)))
    }

    /// Store settings for `database_url`, or `None` when no database is
    /// configured.
    pub fn store_settings(&self, database_url: Option<&str>) -> Option<StoreSettings> {
        StoreSettings::from_url(database_url?).map(|settings| {
            settings
                .with_require_ssl(self.store.require_ssl)
                .with_pool_size(self.store.pool_size)
        })
    }
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct StoreSection {
    /// Maximum pooled connections
    pool_size: u32,
    /// Append `sslmode=require` to the database URL
    require_ssl: bool,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            pool_size: 4,
            require_ssl: true,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct LoggingSection {
    /// Emit JSON lines instead of human-readable output
    json: bool,
    /// Filter directives used when `RUST_LOG` is unset
    filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            json: false,
            filter: "info".to_string(),
        }
    }
}

/// `[discord]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct DiscordSection {
    /// Guild to register commands in while in test mode
    dev_guild: Option<u64>,
    /// Seconds between sweeps of finished and idle sessions
    sweep_interval_secs: u64,
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            dev_guild: None,
            sweep_interval_secs: 60,
        }
    }
}

impl DiscordSection {
    /// The development guild, if a non-zero one is set.
    pub fn dev_guild_id(&self) -> Option<GuildId> {
        self.dev_guild.filter(|id| *id != 0).map(GuildId)
    }

    /// Sweep period, at least one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}
