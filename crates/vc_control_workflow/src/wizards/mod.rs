//! The six wizard drafts and the selection/commit envelopes the registry
//! routes between them.

mod raid;
mod role_change;
mod setup_verification;
mod thread_broadcast;

pub use raid::{RaidRoster, SetupRaidSelection, SetupRaidWizard, StartRaidSelection, StartRaidWizard};
pub use role_change::{RoleChangeCommit, RoleChangeSelection, RoleChangeWizard, RoleDirection};
pub use setup_verification::{SetupVerificationSelection, SetupVerificationWizard};
pub use thread_broadcast::{
    GREETING_MAX_CHARS, MESSAGE_MAX_CHARS, ThreadBroadcastCommit, ThreadBroadcastSelection,
    ThreadBroadcastWizard,
};

use vc_control_core::{RaidSettings, VerificationSettings};
use vc_control_error::{WorkflowError, WorkflowErrorKind};

/// A selection for any wizard.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum Selection {
    /// `/setup_verify`
    SetupVerification(SetupVerificationSelection),
    /// `/verify` and `/unverify`
    RoleChange(RoleChangeSelection),
    /// `/thread_message`
    ThreadBroadcast(ThreadBroadcastSelection),
    /// `/setup_raid`
    SetupRaid(SetupRaidSelection),
    /// `/start_raid`
    StartRaid(StartRaidSelection),
}

/// A sealed draft from any wizard.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum Commit {
    /// Verification settings to persist
    Verification(VerificationSettings),
    /// Role changes to apply
    RoleChange(RoleChangeCommit),
    /// Threads to create
    ThreadBroadcast(ThreadBroadcastCommit),
    /// Raid settings to persist
    Raid(RaidSettings),
    /// Raid line-up to summarize
    RaidRoster(RaidRoster),
}

macro_rules! selection_variant {
    ($variant:ident => $ty:ty) => {
        impl TryFrom<Selection> for $ty {
            type Error = WorkflowError;

            #[track_caller]
            fn try_from(selection: Selection) -> Result<Self, Self::Error> {
                match selection {
                    Selection::$variant(inner) => Ok(inner),
                    other => Err(WorkflowError::new(WorkflowErrorKind::InvalidSelection(
                        format!("{:?} does not belong to this form", other),
                    ))),
                }
            }
        }
    };
}

selection_variant!(SetupVerification => SetupVerificationSelection);
selection_variant!(RoleChange => RoleChangeSelection);
selection_variant!(ThreadBroadcast => ThreadBroadcastSelection);
selection_variant!(SetupRaid => SetupRaidSelection);
selection_variant!(StartRaid => StartRaidSelection);
