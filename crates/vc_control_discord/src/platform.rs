//! [`GuildPlatform`] over serenity's HTTP client.

use crate::conversions::{
    from_channel, from_role, member_info, to_channel, to_guild, to_role, to_user,
};
use async_trait::async_trait;
use serenity::all::{ChannelType, Colour, CreateEmbed, CreateMessage, CreateThread};
use serenity::http::Http;
use std::sync::Arc;
use tracing::{debug, instrument};
use vc_control_core::{ChannelId, GuildId, RoleId, UserId};
use vc_control_error::{PlatformError, PlatformErrorKind};
use vc_control_workflow::{AuditRecord, GuildPlatform, MemberInfo, PlatformResult, RoleHierarchy};

/// Members fetched per page when listing a guild.
const MEMBER_PAGE: u64 = 1000;

/// Reason recorded in the guild audit log for role changes.
const AUDIT_REASON: &str = "VC Control verification";

/// Classify a failed call by its HTTP status.
///
/// ```
/// use vc_control_discord::classify_status;
/// use vc_control_error::PlatformErrorKind;
///
/// assert!(matches!(classify_status(Some(403), "x".into()), PlatformErrorKind::Forbidden(_)));
/// assert!(matches!(classify_status(Some(404), "x".into()), PlatformErrorKind::NotFound(_)));
/// assert!(matches!(classify_status(None, "x".into()), PlatformErrorKind::Api(_)));
/// ```
pub fn classify_status(status: Option<u16>, message: String) -> PlatformErrorKind {
    match status {
        Some(403) => PlatformErrorKind::Forbidden(message),
        Some(404) => PlatformErrorKind::NotFound(message),
        _ => PlatformErrorKind::Api(message),
    }
}

#[track_caller]
pub(crate) fn platform_error(action: &str, err: serenity::Error) -> PlatformError {
    let status = match &err {
        serenity::Error::Http(http) => http.status_code().map(|status| status.as_u16()),
        _ => None,
    };
    PlatformError::new(classify_status(status, format!("{}: {}", action, err)))
}

fn joined_mentions(mentions: Vec<String>) -> String {
    if mentions.is_empty() {
        "None".to_string()
    } else {
        mentions.join(", ")
    }
}

/// The audit embed posted to a guild's log channel.
pub fn audit_embed(record: &AuditRecord) -> CreateEmbed {
    let colour = if record.title == "User Verified" {
        Colour::DARK_GREEN
    } else {
        Colour::RED
    };
    CreateEmbed::new()
        .title(record.title)
        .colour(colour)
        .field("Moderator", record.moderator.mention(), false)
        .field(
            "Users",
            joined_mentions(record.users.iter().map(|user| user.mention()).collect()),
            false,
        )
        .field(
            record.roles_label,
            joined_mentions(record.roles.iter().map(|role| role.mention()).collect()),
            false,
        )
}

/// Guild operations through the bot's HTTP client.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl std::fmt::Debug for SerenityPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityPlatform").finish_non_exhaustive()
    }
}

impl SerenityPlatform {
    /// Share an existing HTTP client, typically the gateway context's.
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl GuildPlatform for SerenityPlatform {
    #[instrument(skip(self), fields(guild = %guild, user = %user))]
    async fn member(&self, guild: GuildId, user: UserId) -> PlatformResult<MemberInfo> {
        let member = self
            .http
            .get_member(to_guild(guild), to_user(user))
            .await
            .map_err(|e| platform_error("fetch member", e))?;
        Ok(member_info(&member))
    }

    #[instrument(skip(self), fields(guild = %guild))]
    async fn role_hierarchy(&self, guild: GuildId) -> PlatformResult<RoleHierarchy> {
        let roles = self
            .http
            .get_guild_roles(to_guild(guild))
            .await
            .map_err(|e| platform_error("fetch roles", e))?;
        let me = self
            .http
            .get_current_user()
            .await
            .map_err(|e| platform_error("fetch bot user", e))?;
        let bot = self
            .http
            .get_member(to_guild(guild), me.id)
            .await
            .map_err(|e| platform_error("fetch bot member", e))?;

        let positions: Vec<(RoleId, u16)> = roles
            .iter()
            .map(|role| (from_role(role.id), role.position))
            .collect();
        let bot_top = roles
            .iter()
            .filter(|role| bot.roles.contains(&role.id))
            .max_by_key(|role| (role.position, role.id))
            .map(|role| from_role(role.id));
        debug!(roles = positions.len(), bot_top = ?bot_top, "Loaded role hierarchy");
        Ok(RoleHierarchy::new(positions, bot_top))
    }

    #[instrument(skip(self), fields(guild = %guild, user = %user, role = %role))]
    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> PlatformResult<()> {
        self.http
            .add_member_role(to_guild(guild), to_user(user), to_role(role), Some(AUDIT_REASON))
            .await
            .map_err(|e| platform_error("add role", e))
    }

    #[instrument(skip(self), fields(guild = %guild, user = %user, role = %role))]
    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> PlatformResult<()> {
        self.http
            .remove_member_role(to_guild(guild), to_user(user), to_role(role), Some(AUDIT_REASON))
            .await
            .map_err(|e| platform_error("remove role", e))
    }

    #[instrument(skip(self, roles), fields(guild = %guild, roles = roles.len()))]
    async fn members_with_roles(
        &self,
        guild: GuildId,
        roles: &[RoleId],
    ) -> PlatformResult<Vec<MemberInfo>> {
        let wanted: Vec<_> = roles.iter().copied().map(to_role).collect();
        let mut found = Vec::new();
        let mut after = None;
        loop {
            let page = to_guild(guild)
                .members(&self.http, Some(MEMBER_PAGE), after)
                .await
                .map_err(|e| platform_error("list members", e))?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.user.id);
            let full = page.len() as u64 == MEMBER_PAGE;
            found.extend(
                page.iter()
                    .filter(|member| member.roles.iter().any(|role| wanted.contains(role)))
                    .map(member_info),
            );
            if !full {
                break;
            }
        }
        debug!(found = found.len(), "Listed members holding recipient roles");
        Ok(found)
    }

    #[instrument(skip(self), fields(channel = %channel))]
    async fn create_private_thread(
        &self,
        channel: ChannelId,
        name: &str,
    ) -> PlatformResult<ChannelId> {
        let builder = CreateThread::new(name)
            .kind(ChannelType::PrivateThread)
            .invitable(false);
        let thread = to_channel(channel)
            .create_thread(&*self.http, builder)
            .await
            .map_err(|e| platform_error("create thread", e))?;
        Ok(from_channel(thread.id))
    }

    async fn add_thread_member(&self, thread: ChannelId, user: UserId) -> PlatformResult<()> {
        to_channel(thread)
            .add_thread_member(&self.http, to_user(user))
            .await
            .map_err(|e| platform_error("add thread member", e))
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> PlatformResult<()> {
        to_channel(channel)
            .say(&*self.http, content)
            .await
            .map(|_| ())
            .map_err(|e| platform_error("send message", e))
    }

    #[instrument(skip(self, record), fields(channel = %channel, title = record.title))]
    async fn send_audit(&self, channel: ChannelId, record: &AuditRecord) -> PlatformResult<()> {
        to_channel(channel)
            .send_message(&*self.http, CreateMessage::new().embed(audit_embed(record)))
            .await
            .map(|_| ())
            .map_err(|e| platform_error("post audit record", e))
    }
}
