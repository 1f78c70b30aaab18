//! The state machine every wizard shares.
//!
//! A [`Session`] binds one wizard's draft to its invoker and guild. Selection
//! events fill the draft's slots, confirm runs the guard chain and seals the
//! draft into a commit, cancel discards it. Once a session leaves
//! [`SessionState::Selecting`] it accepts nothing further.

use crate::WorkflowResult;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;
use vc_control_core::{GuildId, RoleId, UserId};
use vc_control_error::{WorkflowError, WorkflowErrorKind};

/// The six wizard kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum WizardKind {
    /// Capture verified/allowed/guest roles and the log channel
    SetupVerification,
    /// Grant verified roles
    VerifyUsers,
    /// Revoke verified roles
    UnverifyUsers,
    /// Create one private thread per recipient
    ThreadBroadcast,
    /// Capture the raid channel and roles
    SetupRaid,
    /// Summarize a raid line-up
    StartRaid,
}

impl WizardKind {
    /// Inactivity window after which the session times out.
    pub fn timeout(self) -> Duration {
        match self {
            Self::ThreadBroadcast | Self::StartRaid => Duration::from_secs(300),
            Self::SetupVerification | Self::VerifyUsers | Self::UnverifyUsers | Self::SetupRaid => {
                Duration::from_secs(180)
            }
        }
    }

    /// Notice shown when confirm is pressed with required slots empty.
    pub fn incomplete_notice(self) -> &'static str {
        match self {
            Self::SetupVerification | Self::SetupRaid => "❌ Please complete all selections.",
            Self::VerifyUsers | Self::UnverifyUsers => "Select users and roles first.",
            Self::ThreadBroadcast => {
                "❌ Please complete all selections: recipient roles, channel, mention roles, greeting, and message."
            }
            Self::StartRaid => "❌ Please select at least a channel and raid lead(s).",
        }
    }

    /// Notice shown when the invoker cancels.
    pub fn cancelled_notice(self) -> &'static str {
        match self {
            Self::SetupVerification | Self::SetupRaid => "❌ Setup cancelled.",
            Self::VerifyUsers | Self::UnverifyUsers => "❌ Verification cancelled.",
            Self::ThreadBroadcast => "❌ Thread message setup cancelled.",
            Self::StartRaid => "❌ Raid start cancelled.",
        }
    }
}

/// Identifier of one wizard invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// Accepting selections
    Selecting,
    /// Confirmed; the draft was sealed into a commit
    Committed,
    /// Cancelled by the invoker
    Cancelled,
    /// Inactivity window elapsed
    TimedOut,
}

/// How a selection event is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// Acknowledge without a visible reply.
    Silent,
    /// Acknowledge with an ephemeral echo.
    Notice(String),
}

/// The user acting on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User id
    pub id: UserId,
    /// Roles the user holds in the session's guild
    pub roles: BTreeSet<RoleId>,
}

impl Actor {
    /// An actor holding `roles`.
    pub fn new(id: UserId, roles: impl IntoIterator<Item = RoleId>) -> Self {
        Self {
            id,
            roles: roles.into_iter().collect(),
        }
    }
}

/// A wizard's draft: named slots plus the rules for filling and sealing them.
pub trait Wizard: Send + 'static {
    /// A value from one widget.
    type Selection: Send;
    /// What a complete draft seals into.
    type Commit: Send;

    /// Which wizard this is.
    fn kind(&self) -> WizardKind;

    /// Write a selection into its slot. Last value wins.
    fn apply(&mut self, selection: Self::Selection) -> WorkflowResult<Ack>;

    /// Seal a complete draft, or name the empty required slots.
    fn seal(&self) -> Result<Self::Commit, Vec<&'static str>>;

    /// Business authorization beyond the invoker lock.
    fn authorize(&self, _actor: &Actor) -> WorkflowResult<()> {
        Ok(())
    }
}

/// One wizard invocation.
#[derive(Debug)]
pub struct Session<W> {
    id: SessionId,
    invoker: UserId,
    guild: GuildId,
    wizard: W,
    state: SessionState,
    last_activity: Instant,
}

impl<W: Wizard> Session<W> {
    /// Start a session for `invoker` in `guild`.
    pub fn new(invoker: UserId, guild: GuildId, wizard: W) -> Self {
        Self {
            id: SessionId::new(),
            invoker,
            guild,
            wizard,
            state: SessionState::Selecting,
            last_activity: Instant::now(),
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// User who started the session.
    pub fn invoker(&self) -> UserId {
        self.invoker
    }

    /// Guild the session belongs to.
    pub fn guild(&self) -> GuildId {
        self.guild
    }

    /// The wizard's draft.
    pub fn wizard(&self) -> &W {
        &self.wizard
    }

    /// Which wizard this is.
    pub fn kind(&self) -> WizardKind {
        self.wizard.kind()
    }

    /// Current state, accounting for an elapsed inactivity window.
    pub fn state(&self) -> SessionState {
        if self.is_idle() {
            SessionState::TimedOut
        } else {
            self.state
        }
    }

    /// Whether the session no longer accepts events.
    pub fn is_finished(&self) -> bool {
        self.state() != SessionState::Selecting
    }

    fn is_idle(&self) -> bool {
        self.state == SessionState::Selecting
            && self.last_activity.elapsed() >= self.wizard.kind().timeout()
    }

    fn ensure_live(&mut self) -> WorkflowResult<()> {
        if self.is_idle() {
            debug!(session = %self.id, kind = %self.kind(), "Session timed out");
            self.state = SessionState::TimedOut;
        }
        match self.state {
            SessionState::Selecting => Ok(()),
            closed => Err(WorkflowError::new(WorkflowErrorKind::SessionClosed(
                closed.to_string(),
            ))),
        }
    }

    /// Reject anyone but the invoker.
    pub fn ensure_invoker(&mut self, actor: UserId) -> WorkflowResult<()> {
        self.ensure_live()?;
        if actor != self.invoker {
            return Err(WorkflowError::new(WorkflowErrorKind::NotInvoker {
                actor: actor.get(),
            }));
        }
        Ok(())
    }

    /// Fill a slot. Selections are passive: any user may make them.
    pub fn select(&mut self, selection: W::Selection) -> WorkflowResult<Ack> {
        self.ensure_live()?;
        let ack = self.wizard.apply(selection)?;
        self.last_activity = Instant::now();
        Ok(ack)
    }

    /// Run the confirm guards and seal the draft.
    ///
    /// Guards run in order: live session, invoker, complete draft, business
    /// authorization. Any rejection leaves the draft untouched and the
    /// session live. On success the session is committed before the caller
    /// runs any side effect, so a second confirm can never succeed.
    pub fn confirm(&mut self, actor: &Actor) -> WorkflowResult<W::Commit> {
        self.ensure_invoker(actor.id)?;
        let commit = self.wizard.seal().map_err(|missing| {
            WorkflowError::new(WorkflowErrorKind::Incomplete {
                missing,
                notice: self.wizard.kind().incomplete_notice(),
            })
        })?;
        self.wizard.authorize(actor)?;
        self.state = SessionState::Committed;
        debug!(session = %self.id, kind = %self.kind(), "Session committed");
        Ok(commit)
    }

    /// Discard the draft. Invoker only.
    pub fn cancel(&mut self, actor: UserId) -> WorkflowResult<()> {
        self.ensure_invoker(actor)?;
        self.state = SessionState::Cancelled;
        debug!(session = %self.id, kind = %self.kind(), "Session cancelled");
        Ok(())
    }
}
