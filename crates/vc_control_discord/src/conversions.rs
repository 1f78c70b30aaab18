//! Conversions between serenity's models and the workflow's.
//!
//! Serenity ids are non-zero snowflakes; ours are plain `u64` newtypes that
//! never hold zero once parsed, so the conversions are total.

use serenity::all::{ActionRow, ActionRowComponent, ComponentInteractionDataKind, Member};
use serenity::model::id as discord;
use vc_control_core::{ChannelId, GuildId, RoleId, UserId};
use vc_control_workflow::{MemberInfo, WidgetValues};

/// Serenity guild id.
pub fn to_guild(id: GuildId) -> discord::GuildId {
    discord::GuildId::new(id.get())
}

/// Serenity user id.
pub fn to_user(id: UserId) -> discord::UserId {
    discord::UserId::new(id.get())
}

/// Serenity role id.
pub fn to_role(id: RoleId) -> discord::RoleId {
    discord::RoleId::new(id.get())
}

/// Serenity channel id.
pub fn to_channel(id: ChannelId) -> discord::ChannelId {
    discord::ChannelId::new(id.get())
}

/// Workflow guild id.
pub fn from_guild(id: discord::GuildId) -> GuildId {
    GuildId(id.get())
}

/// Workflow user id.
pub fn from_user(id: discord::UserId) -> UserId {
    UserId(id.get())
}

/// Workflow role id.
pub fn from_role(id: discord::RoleId) -> RoleId {
    RoleId(id.get())
}

/// Workflow channel id.
pub fn from_channel(id: discord::ChannelId) -> ChannelId {
    ChannelId(id.get())
}

/// The facts the executors need about a guild member.
pub fn member_info(member: &Member) -> MemberInfo {
    let info = MemberInfo::new(from_user(member.user.id), member.display_name())
        .with_roles(member.roles.iter().copied().map(from_role));
    if member.user.bot { info.as_bot() } else { info }
}

/// Values submitted by a select menu. Buttons carry none.
///
/// # Examples
///
/// ```
/// use serenity::all::{ComponentInteractionDataKind, RoleId};
/// use vc_control_core::RoleId as Role;
/// use vc_control_discord::widget_values;
/// use vc_control_workflow::WidgetValues;
///
/// let kind = ComponentInteractionDataKind::RoleSelect {
///     values: vec![RoleId::new(20)],
/// };
/// assert_eq!(widget_values(&kind), Some(WidgetValues::Roles(vec![Role(20)])));
/// assert_eq!(widget_values(&ComponentInteractionDataKind::Button), None);
/// ```
pub fn widget_values(kind: &ComponentInteractionDataKind) -> Option<WidgetValues> {
    match kind {
        ComponentInteractionDataKind::StringSelect { values } => {
            Some(WidgetValues::Strings(values.clone()))
        }
        ComponentInteractionDataKind::UserSelect { values } => Some(WidgetValues::Users(
            values.iter().copied().map(from_user).collect(),
        )),
        ComponentInteractionDataKind::RoleSelect { values } => Some(WidgetValues::Roles(
            values.iter().copied().map(from_role).collect(),
        )),
        ComponentInteractionDataKind::ChannelSelect { values } => Some(WidgetValues::Channels(
            values.iter().copied().map(from_channel).collect(),
        )),
        _ => None,
    }
}

/// `(field, value)` pairs of a submitted modal.
pub fn form_fields(rows: &[ActionRow]) -> WidgetValues {
    WidgetValues::Form(
        rows.iter()
            .flat_map(|row| row.components.iter())
            .filter_map(|component| match component {
                ActionRowComponent::InputText(input) => Some((
                    input.custom_id.clone(),
                    input.value.clone().unwrap_or_default(),
                )),
                _ => None,
            })
            .collect(),
    )
}
