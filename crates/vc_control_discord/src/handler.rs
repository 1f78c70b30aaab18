//! Gateway event handler routing slash commands, components and modals to
//! the workflow service.

use crate::commands::{SlashCommand, register_commands};
use crate::conversions::{form_fields, from_guild, from_role, from_user, widget_values};
use crate::platform::{SerenityPlatform, platform_error};
use crate::views::{message_form, wizard_view};
use async_trait::async_trait;
use serenity::all::{
    CommandInteraction, ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, EditInteractionResponse,
    EventHandler, GatewayIntents, Interaction, Member, ModalInteraction, Ready,
};
use serenity::model::id as discord;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, error, info, instrument, warn};
use vc_control_core::{GuildId, RoleId};
use vc_control_error::{
    VcControlError, VcControlErrorKind, VcControlResult, WorkflowError, WorkflowErrorKind,
};
use vc_control_workflow::{Ack, Actor, ComponentId, Widget, WorkflowService};

/// Shown when something fails that the invoker cannot fix.
pub const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again later.";

/// Shown when the platform refuses an action for lack of permissions.
pub const MISSING_PERMISSIONS: &str =
    "❌ I don't have permission to do that. Check my role position and channel permissions.";

/// Shown when a command is used outside a server.
pub const GUILD_ONLY: &str = "This command must be used in a server.";

/// The ephemeral notice for a failed interaction.
///
/// Workflow rejections carry their own wording. Everything else is logged
/// by the caller and answered generically.
pub fn notice_for(err: &VcControlError) -> String {
    match err.kind() {
        VcControlErrorKind::Workflow(e) => e.notice(),
        VcControlErrorKind::Platform(e) if e.is_forbidden() => MISSING_PERMISSIONS.to_string(),
        _ => GENERIC_FAILURE.to_string(),
    }
}

fn is_rejection(err: &VcControlError) -> bool {
    matches!(err.kind(), VcControlErrorKind::Workflow(_))
}

fn report(err: &VcControlError) {
    if is_rejection(err) {
        debug!(error = %err, "Interaction rejected");
    } else {
        error!(error = %err, "Interaction failed");
    }
}

fn actor(user: discord::UserId, member: Option<&Member>) -> Actor {
    let roles = member
        .map(|member| member.roles.clone())
        .unwrap_or_default();
    Actor::new(from_user(user), roles.into_iter().map(from_role))
}

fn component_id(custom_id: &str) -> VcControlResult<ComponentId> {
    Ok(ComponentId::from_str(custom_id)?)
}

fn ephemeral(content: impl Into<String>) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

/// Routes gateway events to a [`WorkflowService`].
#[derive(Debug, Clone)]
pub struct VcControlHandler {
    service: WorkflowService,
    dev_guild: Option<GuildId>,
}

impl VcControlHandler {
    /// Serve `service`. Commands register in `dev_guild` when given,
    /// globally otherwise.
    pub fn new(service: WorkflowService, dev_guild: Option<GuildId>) -> Self {
        Self { service, dev_guild }
    }

    /// The service behind the handler.
    pub fn service(&self) -> &WorkflowService {
        &self.service
    }

    /// Gateway intents the handler needs.
    ///
    /// Listing recipients for thread broadcasts needs the privileged
    /// members intent.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS
    }

    /// Role names for labelling select options, from the cache when the
    /// guild is cached.
    async fn role_names(&self, ctx: &Context, guild: discord::GuildId) -> HashMap<RoleId, String> {
        let cached: Option<HashMap<RoleId, String>> = ctx.cache.guild(guild).map(|guild| {
            guild
                .roles
                .values()
                .map(|role| (from_role(role.id), role.name.clone()))
                .collect()
        });
        if let Some(names) = cached {
            return names;
        }
        match ctx.http.get_guild_roles(guild).await {
            Ok(roles) => roles
                .into_iter()
                .map(|role| (from_role(role.id), role.name))
                .collect(),
            Err(e) => {
                warn!(guild = %guild, error = %e, "Could not load role names");
                HashMap::new()
            }
        }
    }

    #[instrument(skip_all, fields(command = %command.data.name, user = %command.user.id))]
    async fn on_command(&self, ctx: &Context, command: &CommandInteraction) -> VcControlResult<()> {
        let Some(guild) = command.guild_id else {
            return command
                .create_response(&ctx.http, ephemeral(GUILD_ONLY))
                .await
                .map_err(|e| platform_error("reply", e).into());
        };
        let Some(slash) = SlashCommand::from_name(&command.data.name) else {
            warn!("Unknown command");
            return Ok(());
        };

        let reply = match slash.wizard() {
            Some(kind) => {
                let started = self
                    .service
                    .start(kind, from_user(command.user.id), from_guild(guild))
                    .await?;
                let names = self.role_names(ctx, guild).await;
                let view = wizard_view(&started, &names);
                CreateInteractionResponseMessage::new()
                    .content(view.content)
                    .components(view.components)
            }
            None => CreateInteractionResponseMessage::new()
                .content(self.service.describe(from_guild(guild)).await?),
        };
        command
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(reply.ephemeral(true)),
            )
            .await
            .map_err(|e| platform_error("reply", e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(custom_id = %component.data.custom_id, user = %component.user.id))]
    async fn on_component(
        &self,
        ctx: &Context,
        component: &ComponentInteraction,
    ) -> VcControlResult<()> {
        let id = component_id(&component.data.custom_id)?;
        let user = from_user(component.user.id);
        let response = match id.widget {
            Widget::Confirm => return self.on_confirm(ctx, component, id).await,
            Widget::Cancel => {
                let kind = self.service.cancel(id.session, user).await?;
                CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new()
                        .content(kind.cancelled_notice())
                        .components(Vec::new()),
                )
            }
            Widget::Compose => {
                self.service.open_form(id.session, user).await?;
                CreateInteractionResponse::Modal(message_form(id.session))
            }
            widget => {
                let values = widget_values(&component.data.kind).ok_or_else(|| {
                    WorkflowError::new(WorkflowErrorKind::InvalidSelection(format!(
                        "{} expects a selection",
                        widget
                    )))
                })?;
                match self.service.select(id.session, widget, values).await? {
                    Ack::Silent => CreateInteractionResponse::Acknowledge,
                    Ack::Notice(text) => ephemeral(text),
                }
            }
        };
        component
            .create_response(&ctx.http, response)
            .await
            .map_err(|e| platform_error("respond to component", e))?;
        Ok(())
    }

    /// Acknowledge first, since commits may take several platform calls.
    /// Success replaces the wizard message; a rejection leaves it in place
    /// and answers with a follow-up.
    async fn on_confirm(
        &self,
        ctx: &Context,
        component: &ComponentInteraction,
        id: ComponentId,
    ) -> VcControlResult<()> {
        component
            .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
            .await
            .map_err(|e| platform_error("acknowledge", e))?;

        let actor = actor(component.user.id, component.member.as_ref());
        let guild_name = component
            .guild_id
            .and_then(|guild| guild.name(&ctx.cache));
        let platform = SerenityPlatform::new(ctx.http.clone());

        match self
            .service
            .confirm(id.session, &actor, guild_name.as_deref(), &platform)
            .await
        {
            Ok(completion) => {
                component
                    .edit_response(
                        &ctx.http,
                        EditInteractionResponse::new()
                            .content(completion.notice())
                            .components(Vec::new()),
                    )
                    .await
                    .map_err(|e| platform_error("replace wizard message", e))?;
            }
            Err(err) => {
                report(&err);
                component
                    .create_followup(
                        &ctx.http,
                        CreateInteractionResponseFollowup::new()
                            .content(notice_for(&err))
                            .ephemeral(true),
                    )
                    .await
                    .map_err(|e| platform_error("send follow-up", e))?;
            }
        }
        Ok(())
    }

    #[instrument(skip_all, fields(custom_id = %modal.data.custom_id, user = %modal.user.id))]
    async fn on_modal(&self, ctx: &Context, modal: &ModalInteraction) -> VcControlResult<()> {
        let id = component_id(&modal.data.custom_id)?;
        let ack = self
            .service
            .select(id.session, id.widget, form_fields(&modal.data.components))
            .await?;
        let response = match ack {
            Ack::Notice(text) => ephemeral(text),
            Ack::Silent => CreateInteractionResponse::Acknowledge,
        };
        modal
            .create_response(&ctx.http, response)
            .await
            .map_err(|e| platform_error("respond to form", e))?;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for VcControlHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Connected to Discord"
        );
        if let Err(e) = register_commands(&ctx.http, self.dev_guild).await {
            error!(error = %e, "Failed to register slash commands");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let (outcome, answer) = match &interaction {
            Interaction::Command(command) => (
                self.on_command(&ctx, command).await,
                Responder::Command(command),
            ),
            Interaction::Component(component) => (
                self.on_component(&ctx, component).await,
                Responder::Component(component),
            ),
            Interaction::Modal(modal) => {
                (self.on_modal(&ctx, modal).await, Responder::Modal(modal))
            }
            _ => return,
        };
        if let Err(err) = outcome {
            report(&err);
            if let Err(e) = answer.reply(&ctx, notice_for(&err)).await {
                warn!(error = %e, "Could not deliver error notice");
            }
        }
    }
}

/// The interaction an error notice answers.
enum Responder<'a> {
    Command(&'a CommandInteraction),
    Component(&'a ComponentInteraction),
    Modal(&'a ModalInteraction),
}

impl Responder<'_> {
    async fn reply(&self, ctx: &Context, notice: String) -> serenity::Result<()> {
        let response = ephemeral(notice);
        match self {
            Self::Command(command) => command.create_response(&ctx.http, response).await,
            Self::Component(component) => component.create_response(&ctx.http, response).await,
            Self::Modal(modal) => modal.create_response(&ctx.http, response).await,
        }
    }
}
