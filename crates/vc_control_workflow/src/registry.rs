//! Live sessions keyed by id.
//!
//! The registry's lock guards only in-memory transitions. Confirm removes the
//! session and hands back the sealed commit; the caller runs side effects
//! after the lock is released.

use crate::{
    Ack, Actor, Commit, Selection, Session, SessionId, Widget, WidgetValues, Wizard, WizardKind,
    WorkflowResult, decode_selection,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};
use vc_control_core::{GuildId, UserId};
use vc_control_error::{WorkflowError, WorkflowErrorKind};

/// A session with its wizard type erased.
trait ActiveSession: Send {
    fn kind(&self) -> WizardKind;
    fn guild(&self) -> GuildId;
    fn is_finished(&self) -> bool;
    fn ensure_invoker(&mut self, actor: UserId) -> WorkflowResult<()>;
    fn select(&mut self, selection: Selection) -> WorkflowResult<Ack>;
    fn confirm(&mut self, actor: &Actor) -> WorkflowResult<Commit>;
    fn cancel(&mut self, actor: UserId) -> WorkflowResult<()>;
}

impl<W> ActiveSession for Session<W>
where
    W: Wizard,
    W::Selection: TryFrom<Selection, Error = WorkflowError>,
    W::Commit: Into<Commit>,
{
    fn kind(&self) -> WizardKind {
        Session::kind(self)
    }

    fn guild(&self) -> GuildId {
        Session::guild(self)
    }

    fn is_finished(&self) -> bool {
        Session::is_finished(self)
    }

    fn ensure_invoker(&mut self, actor: UserId) -> WorkflowResult<()> {
        Session::ensure_invoker(self, actor)
    }

    fn select(&mut self, selection: Selection) -> WorkflowResult<Ack> {
        Session::select(self, W::Selection::try_from(selection)?)
    }

    fn confirm(&mut self, actor: &Actor) -> WorkflowResult<Commit> {
        Session::confirm(self, actor).map(Into::into)
    }

    fn cancel(&mut self, actor: UserId) -> WorkflowResult<()> {
        Session::cancel(self, actor)
    }
}

/// A commit handed out by [`SessionRegistry::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Which wizard produced it
    pub kind: WizardKind,
    /// Guild the session belonged to
    pub guild: GuildId,
    /// The sealed draft
    pub commit: Commit,
}

/// All live wizard sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Box<dyn ActiveSession>>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").finish_non_exhaustive()
    }
}

fn unknown(id: SessionId) -> WorkflowError {
    WorkflowError::new(WorkflowErrorKind::UnknownSession(id.to_string()))
}

impl SessionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return its id.
    pub async fn open<W>(&self, session: Session<W>) -> SessionId
    where
        W: Wizard,
        W::Selection: TryFrom<Selection, Error = WorkflowError>,
        W::Commit: Into<Commit>,
    {
        let id = session.id();
        debug!(session = %id, kind = %session.kind(), guild = %session.guild(), "Session opened");
        self.sessions.lock().await.insert(id, Box::new(session));
        id
    }

    /// Number of sessions held, including ones awaiting a sweep.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether no sessions are held.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Kind of a live session.
    pub async fn kind(&self, id: SessionId) -> WorkflowResult<WizardKind> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&id).ok_or_else(|| unknown(id))?;
        Ok(session.kind())
    }

    /// Apply a selection to a session.
    #[instrument(skip(self, selection), fields(session = %id))]
    pub async fn select(&self, id: SessionId, selection: Selection) -> WorkflowResult<Ack> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| unknown(id))?;
        session.select(selection)
    }

    /// Decode a widget's values for the session's wizard and apply them.
    pub async fn select_widget(
        &self,
        id: SessionId,
        widget: Widget,
        values: WidgetValues,
    ) -> WorkflowResult<Ack> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| unknown(id))?;
        let selection = decode_selection(session.kind(), widget, values)?;
        session.select(selection)
    }

    /// Check that `actor` invoked a live session.
    pub async fn ensure_invoker(&self, id: SessionId, actor: UserId) -> WorkflowResult<WizardKind> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| unknown(id))?;
        session.ensure_invoker(actor)?;
        Ok(session.kind())
    }

    /// Run the confirm guards and, on success, remove the session and return
    /// its commit.
    #[instrument(skip(self, actor), fields(session = %id, actor = %actor.id))]
    pub async fn confirm(&self, id: SessionId, actor: &Actor) -> WorkflowResult<Sealed> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| unknown(id))?;
        let commit = session.confirm(actor)?;
        let sealed = Sealed {
            kind: session.kind(),
            guild: session.guild(),
            commit,
        };
        sessions.remove(&id);
        Ok(sealed)
    }

    /// Cancel a session. Invoker only.
    #[instrument(skip(self), fields(session = %id))]
    pub async fn cancel(&self, id: SessionId, actor: UserId) -> WorkflowResult<WizardKind> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| unknown(id))?;
        session.cancel(actor)?;
        let kind = session.kind();
        sessions.remove(&id);
        Ok(kind)
    }

    /// Drop every finished or idle session. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_finished());
        let swept = before - sessions.len();
        if swept > 0 {
            debug!(swept, remaining = sessions.len(), "Swept sessions");
        }
        swept
    }

    /// Sweep every `period` until the returned task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }
}
