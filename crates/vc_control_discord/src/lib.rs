//! Discord integration for VC Control.
//!
//! This crate connects the wizard sessions in `vc_control_workflow` to
//! Discord through serenity.
//!
//! # Features
//!
//! - Slash command definitions and registration, globally or per guild
//! - Ephemeral wizard messages whose component ids route back to sessions
//! - A [`GuildPlatform`](vc_control_workflow::GuildPlatform) over serenity's
//!   HTTP client for role changes, threads and audit posts
//! - A gateway event handler and client lifecycle
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vc_control_database::{DisabledGuildConfigStore, GuildConfigCache};
//! use vc_control_discord::{VcControlBot, VcControlHandler};
//! use vc_control_workflow::WorkflowService;
//!
//! # async fn run(token: String) -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(GuildConfigCache::new(Arc::new(DisabledGuildConfigStore::new())));
//! let handler = VcControlHandler::new(WorkflowService::new(cache), None);
//! VcControlBot::new(&token, handler).await?.start().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod commands;
mod conversions;
mod handler;
mod platform;
mod views;

pub use client::VcControlBot;
pub use commands::{SlashCommand, definitions, register_commands};
pub use conversions::{
    form_fields, from_channel, from_guild, from_role, from_user, member_info, to_channel,
    to_guild, to_role, to_user, widget_values,
};
pub use handler::{GENERIC_FAILURE, GUILD_ONLY, MISSING_PERMISSIONS, VcControlHandler, notice_for};
pub use platform::{SerenityPlatform, audit_embed, classify_status};
pub use views::{WizardView, message_form, wizard_view};
