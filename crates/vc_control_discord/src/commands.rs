//! Slash command definitions and registration.

use serenity::all::{Command, CreateCommand, Permissions};
use serenity::http::Http;
use std::str::FromStr;
use strum::IntoEnumIterator;
use tracing::{info, instrument};
use vc_control_core::GuildId;
use vc_control_error::{PlatformError, PlatformErrorKind};
use vc_control_workflow::{PlatformResult, WizardKind};

use crate::conversions::to_guild;

/// Every slash command the bot answers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum SlashCommand {
    /// Capture verified, allowed and guest roles plus the log channel
    SetupVerify,
    /// Grant verified roles
    Verify,
    /// Revoke verified roles
    Unverify,
    /// Create a private thread per member of some roles
    ThreadMessage,
    /// Capture the raid channel and roles
    SetupRaid,
    /// Summarize a raid line-up
    StartRaid,
    /// Show the guild's stored settings
    ShowConfig,
}

impl SlashCommand {
    /// Resolve an invoked command name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }

    /// The wizard the command opens, if any.
    pub fn wizard(self) -> Option<WizardKind> {
        match self {
            Self::SetupVerify => Some(WizardKind::SetupVerification),
            Self::Verify => Some(WizardKind::VerifyUsers),
            Self::Unverify => Some(WizardKind::UnverifyUsers),
            Self::ThreadMessage => Some(WizardKind::ThreadBroadcast),
            Self::SetupRaid => Some(WizardKind::SetupRaid),
            Self::StartRaid => Some(WizardKind::StartRaid),
            Self::ShowConfig => None,
        }
    }

    /// Shown in the client's command picker.
    pub fn description(self) -> &'static str {
        match self {
            Self::SetupVerify => "Configure verified, allowed and guest roles and the log channel",
            Self::Verify => "Give verified roles to members",
            Self::Unverify => "Take verified roles from members",
            Self::ThreadMessage => "Open a private thread with every member of some roles",
            Self::SetupRaid => "Configure the raid voice channel and roles",
            Self::StartRaid => "Pick channels, leads, back-ups and scouts for a raid",
            Self::ShowConfig => "Show this server's VC Control settings",
        }
    }

    /// Permissions a member needs by default. Guild admins may override.
    pub fn default_permissions(self) -> Option<Permissions> {
        match self {
            Self::SetupVerify | Self::SetupRaid | Self::ShowConfig => {
                Some(Permissions::MANAGE_GUILD)
            }
            Self::Verify | Self::Unverify | Self::ThreadMessage | Self::StartRaid => None,
        }
    }

    /// The registration payload.
    pub fn definition(self) -> CreateCommand {
        let command = CreateCommand::new(self.as_ref()).description(self.description());
        match self.default_permissions() {
            Some(permissions) => command.default_member_permissions(permissions),
            None => command,
        }
    }
}

/// Registration payloads for every command.
pub fn definitions() -> Vec<CreateCommand> {
    SlashCommand::iter().map(SlashCommand::definition).collect()
}

/// Replace the registered commands, either in one development guild or
/// globally.
///
/// # Errors
///
/// Fails when the platform rejects the registration.
#[instrument(skip(http))]
pub async fn register_commands(http: &Http, dev_guild: Option<GuildId>) -> PlatformResult<usize> {
    let registered = match dev_guild {
        Some(guild) => to_guild(guild).set_commands(http, definitions()).await,
        None => Command::set_global_commands(http, definitions()).await,
    }
    .map_err(|e| {
        PlatformError::new(PlatformErrorKind::Api(format!(
            "Failed to register commands: {}",
            e
        )))
    })?;
    info!(count = registered.len(), scope = ?dev_guild, "Registered slash commands");
    Ok(registered.len())
}
