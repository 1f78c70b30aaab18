//! Chat platform error types.

/// Platform call failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PlatformErrorKind {
    /// The bot lacks permission for the call.
    #[display("Forbidden: {}", _0)]
    Forbidden(String),
    /// A guild, member, role or channel does not exist.
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Any other API or transport failure.
    #[display("Platform API error: {}", _0)]
    Api(String),
    /// The gateway client could not be built or stopped with an error.
    #[display("Gateway error: {}", _0)]
    Gateway(String),
}

/// Platform error with source location tracking.
///
/// # Examples
///
/// ```
/// use vc_control_error::{PlatformError, PlatformErrorKind};
///
/// let err = PlatformError::new(PlatformErrorKind::Forbidden("Missing Permissions".into()));
/// assert!(err.is_forbidden());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Platform Error: {} at line {} in {}", kind, line, file)]
pub struct PlatformError {
    /// The kind of error that occurred
    pub kind: PlatformErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PlatformError {
    /// Create a new PlatformError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PlatformErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the failure was a permission denial.
    pub fn is_forbidden(&self) -> bool {
        matches!(self.kind, PlatformErrorKind::Forbidden(_))
    }
}
