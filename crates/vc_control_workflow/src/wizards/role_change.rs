use crate::{Ack, Actor, Wizard, WizardKind, WorkflowResult};
use tracing::debug;
use vc_control_core::{ChannelId, GuildSettings, RoleId, UserId};
use vc_control_error::{WorkflowError, WorkflowErrorKind};

/// Whether a role change grants or revokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RoleDirection {
    /// Verify: grant roles, optionally strip the guest role
    Grant,
    /// Unverify: revoke roles, optionally restore the guest role
    Revoke,
}

/// A value from one verify/unverify widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleChangeSelection {
    /// Members to change
    Targets(Vec<UserId>),
    /// Verified roles to grant or revoke
    Roles(Vec<RoleId>),
    /// Whether to strip (verify) or restore (unverify) the guest role
    GuestToggle(bool),
}

/// A sealed verify/unverify draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChangeCommit {
    /// Grant or revoke
    pub direction: RoleDirection,
    /// Members to change
    pub targets: Vec<UserId>,
    /// Roles to grant or revoke
    pub roles: Vec<RoleId>,
    /// Guest role to strip or restore, when the toggle was set
    pub guest_role: Option<RoleId>,
    /// Where to post the audit record
    pub log_channel: Option<ChannelId>,
}

/// Draft for `/verify` and `/unverify`, seeded from the guild's settings.
#[derive(Debug, Clone)]
pub struct RoleChangeWizard {
    direction: RoleDirection,
    settings: GuildSettings,
    targets: Vec<UserId>,
    roles: Vec<RoleId>,
    toggle_guest: bool,
}

impl RoleChangeWizard {
    /// A verify draft.
    pub fn verify(settings: GuildSettings) -> Self {
        Self::new(RoleDirection::Grant, settings)
    }

    /// An unverify draft.
    pub fn unverify(settings: GuildSettings) -> Self {
        Self::new(RoleDirection::Revoke, settings)
    }

    fn new(direction: RoleDirection, settings: GuildSettings) -> Self {
        Self {
            direction,
            settings,
            targets: Vec::new(),
            roles: Vec::new(),
            toggle_guest: false,
        }
    }

    /// Grant or revoke.
    pub fn direction(&self) -> RoleDirection {
        self.direction
    }

    /// Settings the draft was seeded with.
    pub fn settings(&self) -> &GuildSettings {
        &self.settings
    }
}

impl Wizard for RoleChangeWizard {
    type Selection = RoleChangeSelection;
    type Commit = RoleChangeCommit;

    fn kind(&self) -> WizardKind {
        match self.direction {
            RoleDirection::Grant => WizardKind::VerifyUsers,
            RoleDirection::Revoke => WizardKind::UnverifyUsers,
        }
    }

    fn apply(&mut self, selection: Self::Selection) -> WorkflowResult<Ack> {
        match selection {
            RoleChangeSelection::Targets(users) => self.targets = users,
            RoleChangeSelection::Roles(roles) => {
                let offered = self.settings.verified_roles();
                let (kept, dropped): (Vec<RoleId>, Vec<RoleId>) =
                    roles.into_iter().partition(|role| offered.contains(role));
                if !dropped.is_empty() {
                    debug!(?dropped, "Ignoring roles outside the configured verified set");
                }
                self.roles = kept;
            }
            RoleChangeSelection::GuestToggle(on) => self.toggle_guest = on,
        }
        Ok(Ack::Silent)
    }

    fn seal(&self) -> Result<Self::Commit, Vec<&'static str>> {
        let mut missing = Vec::new();
        if self.targets.is_empty() {
            missing.push("targets");
        }
        if self.roles.is_empty() {
            missing.push("roles");
        }
        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(RoleChangeCommit {
            direction: self.direction,
            targets: self.targets.clone(),
            roles: self.roles.clone(),
            guest_role: if self.toggle_guest {
                *self.settings.guest_role()
            } else {
                None
            },
            log_channel: *self.settings.log_channel(),
        })
    }

    fn authorize(&self, actor: &Actor) -> WorkflowResult<()> {
        if self.settings.permits(&actor.roles) {
            Ok(())
        } else {
            Err(WorkflowError::new(WorkflowErrorKind::NotPermitted))
        }
    }
}
