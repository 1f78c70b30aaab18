//! Wizard messages and the thread message form.
//!
//! Every component's custom id is a [`ComponentId`], so the handler can route
//! its interaction back to the session that rendered it. A message holds at
//! most five action rows; each wizard fits in that.

use serenity::all::{
    ButtonStyle, ChannelType, CreateActionRow, CreateButton, CreateInputText, CreateModal,
    CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, InputTextStyle,
};
use std::collections::HashMap;
use vc_control_core::{GuildSettings, RoleId};
use vc_control_workflow::{
    ComponentId, GREETING_FIELD, GREETING_MAX_CHARS, MESSAGE_FIELD, MESSAGE_MAX_CHARS, SessionId,
    Started, Widget, WizardKind,
};

/// The ephemeral message a command replies with.
#[derive(Debug, Clone)]
pub struct WizardView {
    /// Prompt text
    pub content: String,
    /// Select menus and buttons
    pub components: Vec<CreateActionRow>,
}

fn custom_id(session: SessionId, widget: Widget) -> String {
    ComponentId::new(session, widget).to_string()
}

fn select(
    session: SessionId,
    widget: Widget,
    kind: CreateSelectMenuKind,
    placeholder: &str,
    (min, max): (u8, u8),
) -> CreateActionRow {
    CreateActionRow::SelectMenu(
        CreateSelectMenu::new(custom_id(session, widget), kind)
            .placeholder(placeholder)
            .min_values(min)
            .max_values(max),
    )
}

fn roles(session: SessionId, widget: Widget, placeholder: &str, range: (u8, u8)) -> CreateActionRow {
    select(
        session,
        widget,
        CreateSelectMenuKind::Role {
            default_roles: None,
        },
        placeholder,
        range,
    )
}

fn users(session: SessionId, widget: Widget, placeholder: &str, range: (u8, u8)) -> CreateActionRow {
    select(
        session,
        widget,
        CreateSelectMenuKind::User {
            default_users: None,
        },
        placeholder,
        range,
    )
}

fn channels(
    session: SessionId,
    widget: Widget,
    channel_type: ChannelType,
    placeholder: &str,
    range: (u8, u8),
) -> CreateActionRow {
    select(
        session,
        widget,
        CreateSelectMenuKind::Channel {
            channel_types: Some(vec![channel_type]),
            default_channels: None,
        },
        placeholder,
        range,
    )
}

fn buttons(session: SessionId, confirm_label: &str, compose: bool) -> CreateActionRow {
    let mut row = Vec::new();
    if compose {
        row.push(
            CreateButton::new(custom_id(session, Widget::Compose))
                .label("Set Greeting & Message")
                .style(ButtonStyle::Primary),
        );
    }
    row.push(
        CreateButton::new(custom_id(session, Widget::Confirm))
            .label(confirm_label)
            .style(ButtonStyle::Success),
    );
    row.push(
        CreateButton::new(custom_id(session, Widget::Cancel))
            .label("Cancel")
            .style(ButtonStyle::Danger),
    );
    CreateActionRow::Buttons(row)
}

fn role_label(role: RoleId, names: &HashMap<RoleId, String>) -> String {
    names.get(&role).cloned().unwrap_or_else(|| role.to_string())
}

/// Discord rejects select menus with more options than this.
const MAX_SELECT_OPTIONS: usize = 25;

/// Verified roles offered by verify/unverify, labelled with their names.
/// Only the first [`MAX_SELECT_OPTIONS`] roles are offered.
fn verified_role_options(
    settings: &GuildSettings,
    names: &HashMap<RoleId, String>,
    verb: &str,
) -> Vec<CreateSelectMenuOption> {
    settings
        .verified_roles()
        .iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|&role| {
            let label = role_label(role, names);
            CreateSelectMenuOption::new(label.clone(), role.to_string())
                .description(format!("{} {}", verb, label))
        })
        .collect()
}

/// Render the message for a freshly opened session.
///
/// `role_names` labels the verified and guest role options; roles missing
/// from it are labelled by id.
pub fn wizard_view(started: &Started, role_names: &HashMap<RoleId, String>) -> WizardView {
    let session = started.id;
    match started.kind {
        WizardKind::SetupVerification => WizardView {
            content: "Configure verification: pick the verified roles, the roles allowed to \
                      verify members, the guest role and a log channel."
                .to_string(),
            components: vec![
                roles(session, Widget::VerifiedRoles, "Select VERIFIED roles", (1, 5)),
                roles(session, Widget::AllowedRoles, "Select ALLOWED roles", (1, 5)),
                roles(session, Widget::GuestRole, "Select GUEST role", (1, 1)),
                channels(
                    session,
                    Widget::LogChannel,
                    ChannelType::Text,
                    "Select LOGGING channel",
                    (1, 1),
                ),
                buttons(session, "Confirm", false),
            ],
        },
        WizardKind::VerifyUsers | WizardKind::UnverifyUsers => {
            let verify = started.kind == WizardKind::VerifyUsers;
            let (verb, content, users_placeholder, roles_placeholder, guest_placeholder) =
                if verify {
                    (
                        "Assign",
                        "Select the members to verify and the roles to assign.",
                        "Select users to verify",
                        "Select roles to assign",
                        "Select to remove guest role (optional)",
                    )
                } else {
                    (
                        "Remove",
                        "Select the members to unverify and the roles to remove.",
                        "Select users to unverify",
                        "Select roles to remove",
                        "Select to add guest role back (optional)",
                    )
                };
            let options = verified_role_options(&started.settings, role_names, verb);
            let mut components = vec![
                users(session, Widget::Targets, users_placeholder, (1, 5)),
                CreateActionRow::SelectMenu(
                    CreateSelectMenu::new(
                        custom_id(session, Widget::Roles),
                        CreateSelectMenuKind::String {
                            options: options.clone(),
                        },
                    )
                    .placeholder(roles_placeholder)
                    .min_values(1)
                    .max_values(options.len().clamp(1, MAX_SELECT_OPTIONS) as u8),
                ),
            ];
            if let Some(guest) = *started.settings.guest_role() {
                let description = if verify {
                    "Remove this role when verifying"
                } else {
                    "Add this role back when unverifying"
                };
                components.push(CreateActionRow::SelectMenu(
                    CreateSelectMenu::new(
                        custom_id(session, Widget::GuestToggle),
                        CreateSelectMenuKind::String {
                            options: vec![
                                CreateSelectMenuOption::new(
                                    role_label(guest, role_names),
                                    guest.to_string(),
                                )
                                .description(description),
                            ],
                        },
                    )
                    .placeholder(guest_placeholder)
                    .min_values(0)
                    .max_values(1),
                ));
            }
            components.push(buttons(session, if verify { "Verify" } else { "Unverify" }, false));
            WizardView {
                content: content.to_string(),
                components,
            }
        }
        WizardKind::ThreadBroadcast => WizardView {
            content: "Pick the roles whose members each get a thread, the channel to create \
                      them in and the roles to mention, then set the greeting and message."
                .to_string(),
            components: vec![
                roles(
                    session,
                    Widget::RecipientRoles,
                    "Select roles (members to receive threads)",
                    (1, 10),
                ),
                channels(
                    session,
                    Widget::Channel,
                    ChannelType::Text,
                    "Select channel for threads",
                    (1, 1),
                ),
                roles(
                    session,
                    Widget::MentionRoles,
                    "Select roles to mention in messages",
                    (1, 10),
                ),
                buttons(session, "Create Threads", true),
            ],
        },
        WizardKind::SetupRaid => WizardView {
            content: "Pick the raid voice channel and the lead, back-up and scout roles."
                .to_string(),
            components: vec![
                channels(
                    session,
                    Widget::Channel,
                    ChannelType::Voice,
                    "Select Raid Voice Channel",
                    (1, 1),
                ),
                roles(session, Widget::LeadRole, "Select Raid lead role", (1, 1)),
                roles(session, Widget::BackupRole, "Select Back-up role", (1, 1)),
                roles(session, Widget::ScoutRole, "Select Scout role", (1, 1)),
                buttons(session, "Confirm", false),
            ],
        },
        WizardKind::StartRaid => WizardView {
            content: "Pick the channels to pull from and the raid lead(s). Back-ups and scouts \
                      are optional."
                .to_string(),
            components: vec![
                channels(
                    session,
                    Widget::Channels,
                    ChannelType::Voice,
                    "Select channels to pull from",
                    (1, 10),
                ),
                users(session, Widget::Leads, "Select raid lead(s)", (1, 5)),
                users(
                    session,
                    Widget::Backups,
                    "Select back-up lead(s) (optional)",
                    (0, 5),
                ),
                users(session, Widget::Scouts, "Select scout(s) (optional)", (0, 5)),
                buttons(session, "Start Raid", false),
            ],
        },
    }
}

/// The greeting and message form for a thread-broadcast session.
pub fn message_form(session: SessionId) -> CreateModal {
    CreateModal::new(
        custom_id(session, Widget::MessageForm),
        "Thread Message Configuration",
    )
    .components(vec![
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "Greeting", GREETING_FIELD)
                .placeholder("e.g., Hello")
                .required(true)
                .max_length(GREETING_MAX_CHARS as u16),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Paragraph, "Message", MESSAGE_FIELD)
                .placeholder("Your message here...")
                .required(true)
                .max_length(MESSAGE_MAX_CHARS as u16),
        ),
    ])
}
