use crate::{Ack, Wizard, WizardKind, WorkflowResult};
use vc_control_core::{ChannelId, RoleId, UserId};
use vc_control_error::{WorkflowError, WorkflowErrorKind};

/// Longest accepted greeting, in characters.
pub const GREETING_MAX_CHARS: usize = 100;
/// Longest accepted message body, in characters.
pub const MESSAGE_MAX_CHARS: usize = 1000;

/// A value from one thread-broadcast widget or the message form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadBroadcastSelection {
    /// Roles whose members each receive a thread
    RecipientRoles(Vec<RoleId>),
    /// Channel the threads are created under
    Channel(Option<ChannelId>),
    /// Roles pinged at the end of every message
    MentionRoles(Vec<RoleId>),
    /// Greeting and body from the message form
    Message {
        /// Opening word(s) placed before the member's mention
        greeting: String,
        /// Message body
        body: String,
    },
}

/// A sealed thread-broadcast draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadBroadcastCommit {
    /// Roles whose members each receive a thread
    pub recipient_roles: Vec<RoleId>,
    /// Parent channel
    pub channel: ChannelId,
    /// Roles pinged at the end of every message
    pub mention_roles: Vec<RoleId>,
    /// Greeting
    pub greeting: String,
    /// Message body
    pub body: String,
}

impl ThreadBroadcastCommit {
    /// The message posted into `member`'s thread.
    ///
    /// ```
    /// use vc_control_core::{ChannelId, RoleId, UserId};
    /// use vc_control_workflow::ThreadBroadcastCommit;
    ///
    /// let commit = ThreadBroadcastCommit {
    ///     recipient_roles: vec![RoleId(1)],
    ///     channel: ChannelId(2),
    ///     mention_roles: vec![RoleId(3), RoleId(4)],
    ///     greeting: "Hello".into(),
    ///     body: "Raid tonight".into(),
    /// };
    /// assert_eq!(
    ///     commit.compose(UserId(5)),
    ///     "Hello <@5>\nRaid tonight\n<@&3>\n<@&4>\n"
    /// );
    /// ```
    pub fn compose(&self, member: UserId) -> String {
        let mut content = format!("{} {}\n{}\n", self.greeting, member.mention(), self.body);
        for role in &self.mention_roles {
            content.push_str(&role.mention());
            content.push('\n');
        }
        content
    }
}

/// Draft for `/thread_message`.
#[derive(Debug, Clone, Default)]
pub struct ThreadBroadcastWizard {
    recipient_roles: Vec<RoleId>,
    channel: Option<ChannelId>,
    mention_roles: Vec<RoleId>,
    greeting: Option<String>,
    body: Option<String>,
}

impl ThreadBroadcastWizard {
    /// An empty draft.
    pub fn new() -> Self {
        Self::default()
    }
}

fn role_list(roles: &[RoleId]) -> String {
    roles
        .iter()
        .map(|role| role.mention())
        .collect::<Vec<_>>()
        .join(", ")
}

fn preview(text: &str, chars: usize) -> String {
    let mut shown: String = text.chars().take(chars).collect();
    if text.chars().count() > chars {
        shown.push_str("...");
    }
    shown
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

impl Wizard for ThreadBroadcastWizard {
    type Selection = ThreadBroadcastSelection;
    type Commit = ThreadBroadcastCommit;

    fn kind(&self) -> WizardKind {
        WizardKind::ThreadBroadcast
    }

    fn apply(&mut self, selection: Self::Selection) -> WorkflowResult<Ack> {
        let notice = match selection {
            ThreadBroadcastSelection::RecipientRoles(roles) => {
                let notice = format!(
                    "✅ Selected {} recipient role(s): {}",
                    roles.len(),
                    role_list(&roles)
                );
                self.recipient_roles = roles;
                notice
            }
            ThreadBroadcastSelection::Channel(channel) => {
                self.channel = channel;
                match channel {
                    Some(channel) => format!("✅ Selected channel: {}", channel.mention()),
                    None => "Channel cleared.".to_string(),
                }
            }
            ThreadBroadcastSelection::MentionRoles(roles) => {
                let notice = format!(
                    "✅ Selected {} mention role(s): {}",
                    roles.len(),
                    role_list(&roles)
                );
                self.mention_roles = roles;
                notice
            }
            ThreadBroadcastSelection::Message { greeting, body } => {
                if greeting.chars().count() > GREETING_MAX_CHARS {
                    return Err(WorkflowError::new(WorkflowErrorKind::InvalidSelection(
                        format!("Greeting must be at most {} characters.", GREETING_MAX_CHARS),
                    )));
                }
                if body.chars().count() > MESSAGE_MAX_CHARS {
                    return Err(WorkflowError::new(WorkflowErrorKind::InvalidSelection(
                        format!("Message must be at most {} characters.", MESSAGE_MAX_CHARS),
                    )));
                }
                let notice = format!(
                    "✅ Greeting and message saved!\nGreeting: {}\nMessage: {}",
                    greeting,
                    preview(&body, 50)
                );
                self.greeting = non_blank(greeting);
                self.body = non_blank(body);
                notice
            }
        };
        Ok(Ack::Notice(notice))
    }

    fn seal(&self) -> Result<Self::Commit, Vec<&'static str>> {
        match (&self.channel, &self.greeting, &self.body) {
            (Some(channel), Some(greeting), Some(body))
                if !self.recipient_roles.is_empty() && !self.mention_roles.is_empty() =>
            {
                Ok(ThreadBroadcastCommit {
                    recipient_roles: self.recipient_roles.clone(),
                    channel: *channel,
                    mention_roles: self.mention_roles.clone(),
                    greeting: greeting.clone(),
                    body: body.clone(),
                })
            }
            _ => {
                let slots = [
                    ("recipient_roles", !self.recipient_roles.is_empty()),
                    ("channel", self.channel.is_some()),
                    ("mention_roles", !self.mention_roles.is_empty()),
                    ("greeting", self.greeting.is_some()),
                    ("message", self.body.is_some()),
                ];
                Err(slots
                    .into_iter()
                    .filter(|(_, filled)| !filled)
                    .map(|(name, _)| name)
                    .collect())
            }
        }
    }
}
