//! Workflow (wizard session) error types.
//!
//! Every kind here is an expected outcome of a user interaction. The
//! [`WorkflowErrorKind::notice`] text is what the invoker sees in an
//! ephemeral reply.

/// Workflow rejection conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum WorkflowErrorKind {
    /// A locked action was attempted by someone other than the invoker.
    #[display("Actor {} is not the session invoker", actor)]
    NotInvoker {
        /// User id of the rejected actor
        actor: u64,
    },
    /// Confirm attempted while required slots are still empty.
    #[display("Required selections missing: {}", missing.join(", "))]
    Incomplete {
        /// Names of the empty required slots
        missing: Vec<&'static str>,
        /// Wizard-specific notice shown to the invoker
        notice: &'static str,
    },
    /// The invoker holds none of the roles allowed to commit this wizard.
    #[display("Invoker lacks a permitted role")]
    NotPermitted,
    /// The session already committed, was cancelled or timed out.
    #[display("Session is {}", _0)]
    SessionClosed(String),
    /// No live session matches the interaction.
    #[display("Unknown session: {}", _0)]
    UnknownSession(String),
    /// A selection or form value was rejected.
    #[display("Invalid selection: {}", _0)]
    InvalidSelection(String),
    /// The guild has not captured the settings this wizard needs.
    #[display("Guild is missing settings: {}", _0)]
    NotConfigured(&'static str),
}

impl WorkflowErrorKind {
    /// User-facing notice for this rejection.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_control_error::WorkflowErrorKind;
    ///
    /// let kind = WorkflowErrorKind::NotInvoker { actor: 42 };
    /// assert_eq!(kind.notice(), "This setup is not for you.");
    /// ```
    pub fn notice(&self) -> String {
        match self {
            Self::NotInvoker { .. } => "This setup is not for you.".to_string(),
            Self::Incomplete { notice, .. } => (*notice).to_string(),
            Self::NotPermitted => "You are not allowed to use this command.".to_string(),
            Self::SessionClosed(_) | Self::UnknownSession(_) => {
                "This session has expired. Run the command again.".to_string()
            }
            Self::InvalidSelection(reason) => format!("❌ {}", reason),
            Self::NotConfigured(command) => {
                format!("⚠️ This server is not set up yet. Run /{} first.", command)
            }
        }
    }
}

/// Workflow error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Workflow Error: {} at line {} in {}", kind, line, file)]
pub struct WorkflowError {
    /// The kind of error that occurred
    pub kind: WorkflowErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl WorkflowError {
    /// Create a new WorkflowError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: WorkflowErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// User-facing notice for this rejection.
    pub fn notice(&self) -> String {
        self.kind.notice()
    }
}
