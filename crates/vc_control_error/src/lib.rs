//! Error types for VC Control.
//!
//! This crate provides the error types shared by every VC Control crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use vc_control_error::{ConfigError, VcControlResult};
//!
//! fn read_token() -> VcControlResult<String> {
//!     Err(ConfigError::new("DISCORD_TOKEN not provided"))?
//! }
//!
//! assert!(read_token().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
#[cfg(feature = "database")]
mod database;
mod error;
mod platform;
mod storage;
mod workflow;

pub use config::ConfigError;
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{VcControlError, VcControlErrorKind, VcControlResult};
pub use platform::{PlatformError, PlatformErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use workflow::{WorkflowError, WorkflowErrorKind};
