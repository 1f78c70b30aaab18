//! Storage error types.

/// Kinds of storage errors surfaced to callers of the configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Reading configuration rows failed
    #[display("Failed to read guild configuration: {}", _0)]
    Read(String),
    /// Every write shape was rejected for a guild
    #[display("Failed to write configuration for guild {}: {}", guild_id, reason)]
    Write {
        /// Guild whose row could not be written
        guild_id: String,
        /// Last failure reported by the backend
        reason: String,
    },
    /// Storage backend is unavailable
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use vc_control_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::Unavailable("pool closed".to_string()));
/// assert!(format!("{}", err).contains("pool closed"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
