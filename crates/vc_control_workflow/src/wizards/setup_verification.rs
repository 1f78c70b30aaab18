use crate::{Ack, Wizard, WizardKind, WorkflowResult};
use vc_control_core::{ChannelId, RoleId, VerificationSettings};

/// A value from one setup-verification widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupVerificationSelection {
    /// Roles the verify wizard may grant
    VerifiedRoles(Vec<RoleId>),
    /// Roles allowed to run verify/unverify
    AllowedRoles(Vec<RoleId>),
    /// Guest role
    GuestRole(Option<RoleId>),
    /// Audit log channel
    LogChannel(Option<ChannelId>),
}

/// Draft for `/setup_verify`.
#[derive(Debug, Clone, Default)]
pub struct SetupVerificationWizard {
    verified_roles: Vec<RoleId>,
    allowed_roles: Vec<RoleId>,
    guest_role: Option<RoleId>,
    log_channel: Option<ChannelId>,
}

impl SetupVerificationWizard {
    /// An empty draft.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Wizard for SetupVerificationWizard {
    type Selection = SetupVerificationSelection;
    type Commit = VerificationSettings;

    fn kind(&self) -> WizardKind {
        WizardKind::SetupVerification
    }

    fn apply(&mut self, selection: Self::Selection) -> WorkflowResult<Ack> {
        match selection {
            SetupVerificationSelection::VerifiedRoles(roles) => self.verified_roles = roles,
            SetupVerificationSelection::AllowedRoles(roles) => self.allowed_roles = roles,
            SetupVerificationSelection::GuestRole(role) => self.guest_role = role,
            SetupVerificationSelection::LogChannel(channel) => self.log_channel = channel,
        }
        Ok(Ack::Silent)
    }

    fn seal(&self) -> Result<Self::Commit, Vec<&'static str>> {
        let mut missing = Vec::new();
        if self.verified_roles.is_empty() {
            missing.push("verified_roles");
        }
        if self.allowed_roles.is_empty() {
            missing.push("allowed_roles");
        }
        if self.guest_role.is_none() {
            missing.push("guest_role");
        }
        if self.log_channel.is_none() {
            missing.push("log_channel");
        }

        match (self.guest_role, self.log_channel) {
            (Some(guest), Some(log)) if missing.is_empty() => Ok(VerificationSettings::new(
                self.verified_roles.clone(),
                self.allowed_roles.clone(),
                guest,
                log,
            )),
            _ => Err(missing),
        }
    }
}
