//! Interactive wizard sessions for VC Control.
//!
//! Six wizards share one state machine: selections fill a draft's slots,
//! confirm runs a guard chain and seals the draft, cancel discards it.
//!
//! # Architecture
//!
//! - **Sessions**: [`Session`] drives any [`Wizard`] through
//!   selecting → committed / cancelled / timed out
//! - **Registry**: [`SessionRegistry`] routes component events by session id
//! - **Executors**: [`apply_role_change`] and [`broadcast_threads`] carry out
//!   commits against a [`GuildPlatform`]
//! - **Service**: [`WorkflowService`] is what command handlers call
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vc_control_core::{GuildId, UserId};
//! use vc_control_database::{DisabledGuildConfigStore, GuildConfigCache};
//! use vc_control_workflow::{WizardKind, WorkflowService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(GuildConfigCache::new(Arc::new(DisabledGuildConfigStore::new())));
//! let service = WorkflowService::new(cache);
//!
//! let started = service
//!     .start(WizardKind::SetupRaid, UserId(1), GuildId(2))
//!     .await?;
//! assert_eq!(started.kind, WizardKind::SetupRaid);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod component;
mod executor;
mod platform;
mod registry;
mod service;
mod session;
mod wizards;

pub use component::{
    ComponentId, GREETING_FIELD, MESSAGE_FIELD, Widget, WidgetValues, decode_selection,
};
pub use executor::{
    RoleAssignmentResult, ThreadCreationResult, apply_role_change, broadcast_threads,
};
pub use platform::{AuditRecord, GuildPlatform, MemberInfo, PlatformResult, RoleHierarchy};
pub use registry::{Sealed, SessionRegistry};
pub use service::{Completion, Started, WorkflowService, render_settings};
pub use session::{Ack, Actor, Session, SessionId, SessionState, Wizard, WizardKind};
pub use wizards::{
    Commit, GREETING_MAX_CHARS, MESSAGE_MAX_CHARS, RaidRoster, RoleChangeCommit,
    RoleChangeSelection, RoleChangeWizard, RoleDirection, Selection, SetupRaidSelection,
    SetupRaidWizard, SetupVerificationSelection, SetupVerificationWizard, StartRaidSelection,
    StartRaidWizard, ThreadBroadcastCommit, ThreadBroadcastSelection, ThreadBroadcastWizard,
};

use vc_control_error::WorkflowError;

/// Result type for session operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
