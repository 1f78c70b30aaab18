//! Command-level entry points tying sessions, settings and side effects
//! together.

use crate::{
    Ack, Actor, Commit, GuildPlatform, RaidRoster, RoleAssignmentResult, RoleChangeWizard,
    Session, SessionId, SessionRegistry, SetupRaidWizard, SetupVerificationWizard,
    StartRaidWizard, ThreadBroadcastWizard, ThreadCreationResult, Widget, WidgetValues,
    WizardKind, WorkflowResult, apply_role_change, broadcast_threads,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use vc_control_core::{GuildId, GuildSettings, RoleId, UserId};
use vc_control_database::{GuildConfigCache, SaveOutcome};
use vc_control_error::{VcControlResult, WorkflowError, WorkflowErrorKind};

/// A freshly opened session, with what the UI needs to render it.
#[derive(Debug, Clone)]
pub struct Started {
    /// Session id to embed in component ids
    pub id: SessionId,
    /// Which wizard was opened
    pub kind: WizardKind,
    /// The guild's settings when the session opened
    pub settings: GuildSettings,
}

/// What a successful confirm did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Verification settings merged into the guild config
    VerificationSaved(SaveOutcome),
    /// Raid settings merged into the guild config
    RaidSaved(SaveOutcome),
    /// Verify or unverify applied
    Roles(RoleAssignmentResult),
    /// Threads created
    Threads(ThreadCreationResult),
    /// Raid line-up summarized
    Roster(RaidRoster),
}

impl Completion {
    /// The notice shown to the invoker.
    pub fn notice(&self) -> String {
        match self {
            Self::VerificationSaved(outcome) | Self::RaidSaved(outcome) => match outcome {
                SaveOutcome::Written(_) => "✅ Setup complete!".to_string(),
                SaveOutcome::Skipped => {
                    "✅ Setup complete! (kept in memory only; no database is configured)"
                        .to_string()
                }
            },
            Self::Roles(result) => result.summary(),
            Self::Threads(result) => result.summary(),
            Self::Roster(roster) => roster.summary(),
        }
    }
}

/// Entry points behind every slash command and component.
#[derive(Debug, Clone)]
pub struct WorkflowService {
    registry: Arc<SessionRegistry>,
    cache: Arc<GuildConfigCache>,
}

impl WorkflowService {
    /// Serve sessions against `cache`.
    pub fn new(cache: Arc<GuildConfigCache>) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            cache,
        }
    }

    /// The live sessions.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// The guild settings cache.
    pub fn cache(&self) -> &Arc<GuildConfigCache> {
        &self.cache
    }

    /// Open a `kind` session for `invoker` in `guild`.
    ///
    /// # Errors
    ///
    /// Verify and unverify refuse to open until verified roles are
    /// configured. Reading the guild's settings may fail with a storage
    /// error.
    #[instrument(skip(self), fields(kind = %kind, guild = %guild))]
    pub async fn start(
        &self,
        kind: WizardKind,
        invoker: UserId,
        guild: GuildId,
    ) -> VcControlResult<Started> {
        let settings = self.cache.settings(guild).await?;
        let id = match kind {
            WizardKind::SetupVerification => {
                self.open(invoker, guild, SetupVerificationWizard::new()).await
            }
            WizardKind::VerifyUsers | WizardKind::UnverifyUsers => {
                if !settings.is_verification_configured() {
                    return Err(WorkflowError::new(WorkflowErrorKind::NotConfigured(
                        "setup_verify",
                    ))
                    .into());
                }
                let wizard = if kind == WizardKind::VerifyUsers {
                    RoleChangeWizard::verify(settings.clone())
                } else {
                    RoleChangeWizard::unverify(settings.clone())
                };
                self.open(invoker, guild, wizard).await
            }
            WizardKind::ThreadBroadcast => {
                self.open(invoker, guild, ThreadBroadcastWizard::new()).await
            }
            WizardKind::SetupRaid => self.open(invoker, guild, SetupRaidWizard::new()).await,
            WizardKind::StartRaid => self.open(invoker, guild, StartRaidWizard::new()).await,
        };
        Ok(Started { id, kind, settings })
    }

    async fn open<W>(&self, invoker: UserId, guild: GuildId, wizard: W) -> SessionId
    where
        W: crate::Wizard,
        W::Selection: TryFrom<crate::Selection, Error = WorkflowError>,
        W::Commit: Into<Commit>,
    {
        self.registry
            .open(Session::new(invoker, guild, wizard))
            .await
    }

    /// Apply a widget's values to a session.
    pub async fn select(
        &self,
        id: SessionId,
        widget: Widget,
        values: WidgetValues,
    ) -> WorkflowResult<Ack> {
        self.registry.select_widget(id, widget, values).await
    }

    /// Check that `actor` may open the thread message form for a session.
    pub async fn open_form(&self, id: SessionId, actor: UserId) -> WorkflowResult<()> {
        match self.registry.ensure_invoker(id, actor).await? {
            WizardKind::ThreadBroadcast => Ok(()),
            other => Err(WorkflowError::new(WorkflowErrorKind::InvalidSelection(
                format!("{} has no message form", other),
            ))),
        }
    }

    /// Cancel a session.
    pub async fn cancel(&self, id: SessionId, actor: UserId) -> WorkflowResult<WizardKind> {
        self.registry.cancel(id, actor).await
    }

    /// Confirm a session and carry out its commit.
    ///
    /// Setup commits are merged into the guild's stored settings, labelled
    /// with `guild_name` when given. Verify, unverify and thread broadcast
    /// act on the guild through `platform`.
    ///
    /// # Errors
    ///
    /// Guard rejections leave the session live. Once the guards pass the
    /// session is gone, so later storage or platform failures are final.
    #[instrument(skip(self, actor, guild_name, platform), fields(session = %id))]
    pub async fn confirm<P>(
        &self,
        id: SessionId,
        actor: &Actor,
        guild_name: Option<&str>,
        platform: &P,
    ) -> VcControlResult<Completion>
    where
        P: GuildPlatform + ?Sized,
    {
        let sealed = self.registry.confirm(id, actor).await?;
        let guild = sealed.guild;
        let completion = match sealed.commit {
            Commit::Verification(settings) => Completion::VerificationSaved(
                self.cache
                    .update(guild, guild_name, |data| settings.apply_to(data))
                    .await?,
            ),
            Commit::Raid(settings) => Completion::RaidSaved(
                self.cache
                    .update(guild, guild_name, |data| settings.apply_to(data))
                    .await?,
            ),
            Commit::RoleChange(commit) => {
                Completion::Roles(apply_role_change(platform, guild, actor.id, &commit).await?)
            }
            Commit::ThreadBroadcast(commit) => {
                Completion::Threads(broadcast_threads(platform, guild, &commit).await?)
            }
            Commit::RaidRoster(roster) => Completion::Roster(roster),
        };
        info!(kind = %sealed.kind, guild = %guild, "Session completed");
        Ok(completion)
    }

    /// A readable dump of a guild's settings for `/show_config`.
    pub async fn describe(&self, guild: GuildId) -> VcControlResult<String> {
        let settings = self.cache.settings(guild).await?;
        let updated_at = self
            .cache
            .store()
            .load_record(&guild.to_string())
            .await?
            .and_then(|record| *record.updated_at());
        Ok(render_settings(guild, &settings, updated_at))
    }
}

fn roles_or_unset<'a>(roles: impl IntoIterator<Item = &'a RoleId>) -> String {
    let mentions: Vec<String> = roles.into_iter().map(|role| role.mention()).collect();
    if mentions.is_empty() {
        "not set".to_string()
    } else {
        mentions.join(", ")
    }
}

fn or_unset(value: Option<String>) -> String {
    value.unwrap_or_else(|| "not set".to_string())
}

/// Format settings as the `/show_config` reply.
pub fn render_settings(
    guild: GuildId,
    settings: &GuildSettings,
    updated_at: Option<DateTime<Utc>>,
) -> String {
    let raid = settings.raid();
    let title = settings
        .name()
        .clone()
        .unwrap_or_else(|| format!("guild {}", guild));
    let mut lines = vec![
        format!("**Configuration for {}**", title),
        format!("Verified roles: {}", roles_or_unset(settings.verified_roles())),
        format!("Allowed roles: {}", roles_or_unset(settings.allowed_roles())),
        format!("Guest role: {}", or_unset(settings.guest_role().map(RoleId::mention))),
        format!("Log channel: {}", or_unset(settings.log_channel().map(|c| c.mention()))),
        format!("Raid channel: {}", or_unset(raid.channel().map(|c| c.mention()))),
        format!("Raid lead role: {}", or_unset(raid.lead_role().map(RoleId::mention))),
        format!("Back-up role: {}", or_unset(raid.backup_role().map(RoleId::mention))),
        format!("Scout role: {}", or_unset(raid.scout_role().map(RoleId::mention))),
    ];
    if let Some(updated_at) = updated_at {
        lines.push(format!("Last updated: {}", updated_at.format("%Y-%m-%d %H:%M UTC")));
    }
    lines.join("\n")
}
