//! Command-line arguments and token selection.

use crate::BotConfig;
use clap::Parser;
use clap::builder::BoolishValueParser;
use std::path::PathBuf;
use vc_control_core::GuildId;
use vc_control_error::ConfigError;

/// Command-line arguments for the bot.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "vc-control")]
#[command(about = "VC Control - Discord verification, thread broadcast and raid tooling")]
#[command(version)]
pub struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "VC_CONTROL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run with the test token and register commands in the development guild
    #[arg(long, env = "TEST_MODE", value_parser = BoolishValueParser::new())]
    pub test_mode: bool,

    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: Option<String>,

    /// Discord bot token used in test mode
    #[arg(long, env = "DISCORD_TEST_TOKEN", hide_env_values = true)]
    pub discord_test_token: Option<String>,

    /// PostgreSQL URL for the guild config store; unset keeps settings in memory
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Development guild for command registration in test mode
    #[arg(long, env = "DEV_GUILD_ID")]
    pub dev_guild: Option<u64>,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl Args {
    /// The token for the selected mode.
    ///
    /// # Errors
    ///
    /// Fails when the mode's token is missing or blank.
    pub fn token(&self) -> Result<&str, ConfigError> {
        if self.test_mode {
            non_blank(self.discord_test_token.as_ref())
                .ok_or_else(|| ConfigError::new("DISCORD_TEST_TOKEN is required in test mode"))
        } else {
            non_blank(self.discord_token.as_ref())
                .ok_or_else(|| ConfigError::new("DISCORD_TOKEN is required"))
        }
    }

    /// Where to register commands: the development guild in test mode,
    /// globally otherwise.
    pub fn command_guild(&self, config: &BotConfig) -> Option<GuildId> {
        if !self.test_mode {
            return None;
        }
        self.dev_guild
            .filter(|id| *id != 0)
            .map(GuildId)
            .or_else(|| config.discord().dev_guild_id())
    }

    /// The database URL, ignoring a blank value.
    pub fn store_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_ref())
    }
}
