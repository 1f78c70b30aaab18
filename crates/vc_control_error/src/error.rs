//! Top-level error wrapper types.

#[cfg(feature = "database")]
use crate::DatabaseError;
use crate::{ConfigError, PlatformError, StorageError, WorkflowError};

/// Every error a VC Control crate can surface.
///
/// # Examples
///
/// ```
/// use vc_control_error::{VcControlError, ConfigError};
///
/// let err: VcControlError = ConfigError::new("bad file").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VcControlErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Database error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Workflow rejection
    #[from(WorkflowError)]
    Workflow(WorkflowError),
    /// Chat platform error
    #[from(PlatformError)]
    Platform(PlatformError),
}

/// VC Control error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("VC Control Error: {}", _0)]
pub struct VcControlError(Box<VcControlErrorKind>);

impl VcControlError {
    /// Create a new error from a kind.
    pub fn new(kind: VcControlErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VcControlErrorKind {
        &self.0
    }
}

impl<T> From<T> for VcControlError
where
    T: Into<VcControlErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for VC Control operations.
pub type VcControlResult<T> = std::result::Result<T, VcControlError>;
