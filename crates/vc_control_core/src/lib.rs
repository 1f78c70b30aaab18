//! Core data types for VC Control.
//!
//! This crate defines the platform-neutral vocabulary shared by the
//! configuration store, the workflow engine and the Discord adapter:
//! snowflake identifiers, role ranks and the typed view over a guild's
//! JSON settings object.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ids;
mod settings;

pub use ids::{ChannelId, GuildId, RoleId, RoleRank, UserId, parse_snowflake};
pub use settings::{GuildSettings, RaidSettings, VerificationSettings, keys};
