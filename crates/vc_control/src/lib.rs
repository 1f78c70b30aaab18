//! VC Control: a Discord moderation bot.
//!
//! Wires the guild config store, the wizard sessions and the Discord client
//! into the `vc-control` binary.
//!
//! # Configuration
//!
//! - `DISCORD_TOKEN`, or `DISCORD_TEST_TOKEN` with `--test-mode` / `TEST_MODE=true`
//! - `DATABASE_URL` for the PostgreSQL store; without it settings live in memory
//! - `--config <file>` for an optional TOML file (see [`BotConfig`])
//! - `.env` is loaded when present

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod app;
mod cli;
mod config;
mod logging;

pub use app::run;
pub use cli::Args;
pub use config::{BotConfig, BotConfigBuilder, DiscordSection, LoggingSection, StoreSection};
pub use logging::init_tracing;
