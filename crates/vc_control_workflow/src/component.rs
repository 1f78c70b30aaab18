//! Component custom ids and widget decoding.
//!
//! Every interactive component a wizard renders carries a custom id of the
//! form `wiz:<session uuid>:<widget>`. The widget name plus the session's
//! kind decide which slot the submitted values land in.

use crate::{
    RoleChangeSelection, Selection, SessionId, SetupRaidSelection, SetupVerificationSelection,
    StartRaidSelection, ThreadBroadcastSelection, WizardKind, WorkflowResult,
};
use std::str::FromStr;
use uuid::Uuid;
use vc_control_core::{ChannelId, RoleId, UserId};
use vc_control_error::{WorkflowError, WorkflowErrorKind};

const PREFIX: &str = "wiz";

/// A widget inside a wizard's message or form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Widget {
    /// Setup: verified roles
    VerifiedRoles,
    /// Setup: allowed roles
    AllowedRoles,
    /// Setup: guest role
    GuestRole,
    /// Setup: log channel
    LogChannel,
    /// Verify/unverify: target members
    Targets,
    /// Verify/unverify: verified roles to change
    Roles,
    /// Verify/unverify: guest role toggle
    GuestToggle,
    /// Thread broadcast: recipient roles
    RecipientRoles,
    /// Thread broadcast / raid setup: channel
    Channel,
    /// Thread broadcast: mention roles
    MentionRoles,
    /// Thread broadcast: button opening the message form
    Compose,
    /// Thread broadcast: the message form itself
    MessageForm,
    /// Raid setup: lead role
    LeadRole,
    /// Raid setup: back-up role
    BackupRole,
    /// Raid setup: scout role
    ScoutRole,
    /// Raid start: voice channels
    Channels,
    /// Raid start: leads
    Leads,
    /// Raid start: back-ups
    Backups,
    /// Raid start: scouts
    Scouts,
    /// Confirm button
    Confirm,
    /// Cancel button
    Cancel,
}

/// A parsed component custom id.
///
/// # Examples
///
/// ```
/// use vc_control_workflow::{ComponentId, SessionId, Widget};
///
/// let id = ComponentId::new(SessionId::new(), Widget::Confirm);
/// let parsed: ComponentId = id.to_string().parse().expect("round trip");
/// assert_eq!(parsed, id);
/// assert!("verify-button".parse::<ComponentId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId {
    /// Session the component belongs to
    pub session: SessionId,
    /// Widget within the session
    pub widget: Widget,
}

impl ComponentId {
    /// Id for `widget` in `session`.
    pub fn new(session: SessionId, widget: Widget) -> Self {
        Self { session, widget }
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", PREFIX, self.session.0.simple(), self.widget)
    }
}

impl FromStr for ComponentId {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || WorkflowError::new(WorkflowErrorKind::UnknownSession(s.to_string()));
        let mut parts = s.splitn(3, ':');
        let (Some(PREFIX), Some(session), Some(widget)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(unknown());
        };
        let session = Uuid::parse_str(session).map_err(|_| unknown())?;
        let widget = Widget::from_str(widget).map_err(|_| unknown())?;
        Ok(Self::new(SessionId(session), widget))
    }
}

/// Values submitted by one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetValues {
    /// A role select
    Roles(Vec<RoleId>),
    /// A user select
    Users(Vec<UserId>),
    /// A channel select
    Channels(Vec<ChannelId>),
    /// A string select
    Strings(Vec<String>),
    /// A submitted form, as `(field, value)` pairs
    Form(Vec<(String, String)>),
}

/// Form field holding the thread greeting.
pub const GREETING_FIELD: &str = "greeting";
/// Form field holding the thread message body.
pub const MESSAGE_FIELD: &str = "message";

fn mismatch(kind: WizardKind, widget: Widget) -> WorkflowError {
    WorkflowError::new(WorkflowErrorKind::InvalidSelection(format!(
        "{} does not accept {} values",
        kind, widget
    )))
}

/// Turn a widget's submitted values into a selection for a `kind` session.
///
/// # Errors
///
/// [`WorkflowErrorKind::InvalidSelection`] when the widget does not belong
/// to `kind` or the values have the wrong shape.
pub fn decode_selection(
    kind: WizardKind,
    widget: Widget,
    values: WidgetValues,
) -> WorkflowResult<Selection> {
    use WidgetValues as V;
    use WizardKind as K;

    let selection: Selection = match (kind, widget, values) {
        (K::SetupVerification, Widget::VerifiedRoles, V::Roles(roles)) => {
            SetupVerificationSelection::VerifiedRoles(roles).into()
        }
        (K::SetupVerification, Widget::AllowedRoles, V::Roles(roles)) => {
            SetupVerificationSelection::AllowedRoles(roles).into()
        }
        (K::SetupVerification, Widget::GuestRole, V::Roles(roles)) => {
            SetupVerificationSelection::GuestRole(roles.first().copied()).into()
        }
        (K::SetupVerification, Widget::LogChannel, V::Channels(channels)) => {
            SetupVerificationSelection::LogChannel(channels.first().copied()).into()
        }

        (K::VerifyUsers | K::UnverifyUsers, Widget::Targets, V::Users(users)) => {
            RoleChangeSelection::Targets(users).into()
        }
        (K::VerifyUsers | K::UnverifyUsers, Widget::Roles, V::Strings(values)) => {
            RoleChangeSelection::Roles(parse_ids(&values).map(RoleId).collect()).into()
        }
        (K::VerifyUsers | K::UnverifyUsers, Widget::Roles, V::Roles(roles)) => {
            RoleChangeSelection::Roles(roles).into()
        }
        (K::VerifyUsers | K::UnverifyUsers, Widget::GuestToggle, V::Strings(values)) => {
            RoleChangeSelection::GuestToggle(!values.is_empty()).into()
        }

        (K::ThreadBroadcast, Widget::RecipientRoles, V::Roles(roles)) => {
            ThreadBroadcastSelection::RecipientRoles(roles).into()
        }
        (K::ThreadBroadcast, Widget::Channel, V::Channels(channels)) => {
            ThreadBroadcastSelection::Channel(channels.first().copied()).into()
        }
        (K::ThreadBroadcast, Widget::MentionRoles, V::Roles(roles)) => {
            ThreadBroadcastSelection::MentionRoles(roles).into()
        }
        (K::ThreadBroadcast, Widget::MessageForm, V::Form(fields)) => {
            let field = |name: &str| {
                fields
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default()
            };
            ThreadBroadcastSelection::Message {
                greeting: field(GREETING_FIELD),
                body: field(MESSAGE_FIELD),
            }
            .into()
        }

        (K::SetupRaid, Widget::Channel, V::Channels(channels)) => {
            SetupRaidSelection::Channel(channels.first().copied()).into()
        }
        (K::SetupRaid, Widget::LeadRole, V::Roles(roles)) => {
            SetupRaidSelection::LeadRole(roles.first().copied()).into()
        }
        (K::SetupRaid, Widget::BackupRole, V::Roles(roles)) => {
            SetupRaidSelection::BackupRole(roles.first().copied()).into()
        }
        (K::SetupRaid, Widget::ScoutRole, V::Roles(roles)) => {
            SetupRaidSelection::ScoutRole(roles.first().copied()).into()
        }

        (K::StartRaid, Widget::Channels, V::Channels(channels)) => {
            StartRaidSelection::Channels(channels).into()
        }
        (K::StartRaid, Widget::Leads, V::Users(users)) => StartRaidSelection::Leads(users).into(),
        (K::StartRaid, Widget::Backups, V::Users(users)) => {
            StartRaidSelection::Backups(users).into()
        }
        (K::StartRaid, Widget::Scouts, V::Users(users)) => StartRaidSelection::Scouts(users).into(),

        (kind, widget, _) => return Err(mismatch(kind, widget)),
    };
    Ok(selection)
}

fn parse_ids(values: &[String]) -> impl Iterator<Item = u64> + '_ {
    values.iter().filter_map(|value| value.trim().parse().ok())
}
