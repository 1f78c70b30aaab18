use crate::{Ack, Wizard, WizardKind, WorkflowResult};
use vc_control_core::{ChannelId, RaidSettings, RoleId, UserId};

/// A value from one setup-raid widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupRaidSelection {
    /// Raid voice channel
    Channel(Option<ChannelId>),
    /// Raid lead role
    LeadRole(Option<RoleId>),
    /// Back-up role
    BackupRole(Option<RoleId>),
    /// Scout role
    ScoutRole(Option<RoleId>),
}

/// Draft for `/setup_raid`.
#[derive(Debug, Clone, Default)]
pub struct SetupRaidWizard {
    channel: Option<ChannelId>,
    lead_role: Option<RoleId>,
    backup_role: Option<RoleId>,
    scout_role: Option<RoleId>,
}

impl SetupRaidWizard {
    /// An empty draft.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Wizard for SetupRaidWizard {
    type Selection = SetupRaidSelection;
    type Commit = RaidSettings;

    fn kind(&self) -> WizardKind {
        WizardKind::SetupRaid
    }

    fn apply(&mut self, selection: Self::Selection) -> WorkflowResult<Ack> {
        match selection {
            SetupRaidSelection::Channel(channel) => self.channel = channel,
            SetupRaidSelection::LeadRole(role) => self.lead_role = role,
            SetupRaidSelection::BackupRole(role) => self.backup_role = role,
            SetupRaidSelection::ScoutRole(role) => self.scout_role = role,
        }
        Ok(Ack::Silent)
    }

    fn seal(&self) -> Result<Self::Commit, Vec<&'static str>> {
        match (self.channel, self.lead_role, self.backup_role, self.scout_role) {
            (Some(channel), Some(lead), Some(backup), Some(scout)) => Ok(RaidSettings::default()
                .with_channel(channel)
                .with_lead_role(lead)
                .with_backup_role(backup)
                .with_scout_role(scout)),
            _ => {
                let slots = [
                    ("raid_channel", self.channel.is_some()),
                    ("raid_lead_role", self.lead_role.is_some()),
                    ("raid_backup_role", self.backup_role.is_some()),
                    ("raid_scout_role", self.scout_role.is_some()),
                ];
                Err(slots
                    .into_iter()
                    .filter(|(_, filled)| !filled)
                    .map(|(name, _)| name)
                    .collect())
            }
        }
    }
}

/// A value from one start-raid widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartRaidSelection {
    /// Voice channels to pull from
    Channels(Vec<ChannelId>),
    /// Raid leads
    Leads(Vec<UserId>),
    /// Back-up leads
    Backups(Vec<UserId>),
    /// Scouts
    Scouts(Vec<UserId>),
}

/// A sealed start-raid draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaidRoster {
    /// Voice channels
    pub channels: Vec<ChannelId>,
    /// Raid leads
    pub leads: Vec<UserId>,
    /// Back-up leads
    pub backups: Vec<UserId>,
    /// Scouts
    pub scouts: Vec<UserId>,
}

impl RaidRoster {
    /// The line-up summary shown to the invoker.
    ///
    /// ```
    /// use vc_control_core::{ChannelId, UserId};
    /// use vc_control_workflow::RaidRoster;
    ///
    /// let roster = RaidRoster {
    ///     channels: vec![ChannelId(1)],
    ///     leads: vec![UserId(2), UserId(3)],
    ///     ..RaidRoster::default()
    /// };
    /// assert_eq!(
    ///     roster.summary(),
    ///     "✅ Raid configuration complete!\nChannels: <#1>\nLeads: <@2>, <@3>\nBack-ups: None\nScouts: None"
    /// );
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "✅ Raid configuration complete!\nChannels: {}\nLeads: {}\nBack-ups: {}\nScouts: {}",
            join_or_none(self.channels.iter().map(|c| c.mention())),
            join_or_none(self.leads.iter().map(|u| u.mention())),
            join_or_none(self.backups.iter().map(|u| u.mention())),
            join_or_none(self.scouts.iter().map(|u| u.mention())),
        )
    }
}

fn join_or_none(items: impl Iterator<Item = String>) -> String {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Draft for `/start_raid`.
#[derive(Debug, Clone, Default)]
pub struct StartRaidWizard {
    roster: RaidRoster,
}

impl StartRaidWizard {
    /// An empty draft.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Wizard for StartRaidWizard {
    type Selection = StartRaidSelection;
    type Commit = RaidRoster;

    fn kind(&self) -> WizardKind {
        WizardKind::StartRaid
    }

    fn apply(&mut self, selection: Self::Selection) -> WorkflowResult<Ack> {
        match selection {
            StartRaidSelection::Channels(channels) => self.roster.channels = channels,
            StartRaidSelection::Leads(users) => self.roster.leads = users,
            StartRaidSelection::Backups(users) => self.roster.backups = users,
            StartRaidSelection::Scouts(users) => self.roster.scouts = users,
        }
        Ok(Ack::Silent)
    }

    fn seal(&self) -> Result<Self::Commit, Vec<&'static str>> {
        let mut missing = Vec::new();
        if self.roster.channels.is_empty() {
            missing.push("channels");
        }
        if self.roster.leads.is_empty() {
            missing.push("leads");
        }
        if missing.is_empty() {
            Ok(self.roster.clone())
        } else {
            Err(missing)
        }
    }
}
