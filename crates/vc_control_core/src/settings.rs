//! Typed view over a guild's JSON settings object.
//!
//! The store persists an arbitrary JSON object per guild. Workflows only read
//! a handful of keys, so [`GuildSettings::from_value`] picks those out and
//! tolerates anything malformed by treating it as unset. Writers go the other
//! way: [`VerificationSettings::apply_to`] and [`RaidSettings::apply_to`]
//! patch their keys into the existing object and leave every other key alone.

use crate::{ChannelId, RoleId, parse_snowflake};
use derive_getters::Getters;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;
use tracing::warn;

/// Recognized keys in a guild's settings object.
pub mod keys {
    /// Display label, mirrored into the `name` column.
    pub const NAME: &str = "name";
    /// Roles granted by the verify wizard.
    pub const VERIFIED_ROLES: &str = "verified_roles";
    /// Roles permitted to run verify/unverify.
    pub const ALLOWED_ROLES: &str = "allowed_roles";
    /// Role stripped on verify and restored on unverify.
    pub const GUEST_ROLE: &str = "guest_role";
    /// Channel receiving audit records.
    pub const LOG_CHANNEL: &str = "log_channel";
    /// Raid voice channel.
    pub const RAID_CHANNEL: &str = "raid_channel";
    /// Raid lead role.
    pub const RAID_LEAD_ROLE: &str = "raid_lead_role";
    /// Raid back-up role.
    pub const RAID_BACKUP_ROLE: &str = "raid_backup_role";
    /// Raid scout role.
    pub const RAID_SCOUT_ROLE: &str = "raid_scout_role";
}

/// Settings a guild has captured so far.
///
/// # Examples
///
/// ```
/// use vc_control_core::{GuildSettings, RoleId};
/// use serde_json::json;
///
/// let settings = GuildSettings::from_value(&json!({
///     "allowed_roles": [10],
///     "verified_roles": ["20"],
///     "guest_role": 30,
///     "log_channel": 40,
/// }));
///
/// assert!(settings.verified_roles().contains(&RoleId(20)));
/// assert!(settings.permits([RoleId(10)].iter()));
/// assert!(!settings.permits([RoleId(11)].iter()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct GuildSettings {
    /// Display label
    name: Option<String>,
    /// Roles the verify wizard may grant
    verified_roles: BTreeSet<RoleId>,
    /// Roles allowed to commit verify/unverify
    allowed_roles: BTreeSet<RoleId>,
    /// Guest role
    guest_role: Option<RoleId>,
    /// Audit log channel
    log_channel: Option<ChannelId>,
    /// Raid settings
    raid: RaidSettings,
}

impl GuildSettings {
    /// Read the recognized keys out of a stored settings value.
    ///
    /// Non-object values (for instance a raw string kept from an
    /// unparseable row) yield empty settings.
    pub fn from_value(value: &JsonValue) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        Self {
            name: object
                .get(keys::NAME)
                .and_then(JsonValue::as_str)
                .map(str::to_string),
            verified_roles: id_set(object, keys::VERIFIED_ROLES),
            allowed_roles: id_set(object, keys::ALLOWED_ROLES),
            guest_role: object.get(keys::GUEST_ROLE).and_then(parse_snowflake).map(RoleId),
            log_channel: object
                .get(keys::LOG_CHANNEL)
                .and_then(parse_snowflake)
                .map(ChannelId),
            raid: RaidSettings {
                channel: object
                    .get(keys::RAID_CHANNEL)
                    .and_then(parse_snowflake)
                    .map(ChannelId),
                lead_role: object.get(keys::RAID_LEAD_ROLE).and_then(parse_snowflake).map(RoleId),
                backup_role: object
                    .get(keys::RAID_BACKUP_ROLE)
                    .and_then(parse_snowflake)
                    .map(RoleId),
                scout_role: object
                    .get(keys::RAID_SCOUT_ROLE)
                    .and_then(parse_snowflake)
                    .map(RoleId),
            },
        }
    }

    /// Whether the verify/unverify wizards have roles to offer.
    pub fn is_verification_configured(&self) -> bool {
        !self.verified_roles.is_empty()
    }

    /// Whether a member holding `roles` may commit verify/unverify.
    pub fn permits<'a>(&self, roles: impl IntoIterator<Item = &'a RoleId>) -> bool {
        roles.into_iter().any(|role| self.allowed_roles.contains(role))
    }
}

/// Verification settings captured by the setup wizard.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct VerificationSettings {
    verified_roles: Vec<RoleId>,
    allowed_roles: Vec<RoleId>,
    guest_role: RoleId,
    log_channel: ChannelId,
}

impl VerificationSettings {
    /// Create verification settings.
    pub fn new(
        verified_roles: Vec<RoleId>,
        allowed_roles: Vec<RoleId>,
        guest_role: RoleId,
        log_channel: ChannelId,
    ) -> Self {
        Self {
            verified_roles,
            allowed_roles,
            guest_role,
            log_channel,
        }
    }

    /// Patch these settings into a stored settings value.
    ///
    /// ```
    /// use vc_control_core::{ChannelId, RoleId, VerificationSettings};
    /// use serde_json::json;
    ///
    /// let mut data = json!({"raid_channel": 7});
    /// VerificationSettings::new(vec![RoleId(20)], vec![RoleId(10)], RoleId(30), ChannelId(40))
    ///     .apply_to(&mut data);
    ///
    /// assert_eq!(data["verified_roles"], json!([20]));
    /// assert_eq!(data["raid_channel"], json!(7));
    /// ```
    pub fn apply_to(&self, data: &mut JsonValue) {
        with_object(data, |object| {
            object.insert(keys::VERIFIED_ROLES.into(), id_array(&self.verified_roles));
            object.insert(keys::ALLOWED_ROLES.into(), id_array(&self.allowed_roles));
            object.insert(keys::GUEST_ROLE.into(), self.guest_role.get().into());
            object.insert(keys::LOG_CHANNEL.into(), self.log_channel.get().into());
        });
    }
}

/// Raid settings, either read from storage or captured by the setup wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, derive_setters::Setters)]
#[setters(strip_option, prefix = "with_")]
pub struct RaidSettings {
    /// Channel raid announcements are posted to.
    channel: Option<ChannelId>,
    /// Role that leads a raid.
    lead_role: Option<RoleId>,
    /// Role that backs up the lead.
    backup_role: Option<RoleId>,
    /// Role that scouts ahead.
    scout_role: Option<RoleId>,
}

impl RaidSettings {
    /// Whether every raid slot has been set.
    pub fn is_complete(&self) -> bool {
        self.channel.is_some()
            && self.lead_role.is_some()
            && self.backup_role.is_some()
            && self.scout_role.is_some()
    }

    /// Patch the set raid keys into a stored settings value.
    pub fn apply_to(&self, data: &mut JsonValue) {
        let entries = [
            (keys::RAID_CHANNEL, self.channel.map(u64::from)),
            (keys::RAID_LEAD_ROLE, self.lead_role.map(u64::from)),
            (keys::RAID_BACKUP_ROLE, self.backup_role.map(u64::from)),
            (keys::RAID_SCOUT_ROLE, self.scout_role.map(u64::from)),
        ];
        with_object(data, |object| {
            for (key, id) in entries {
                if let Some(id) = id {
                    object.insert(key.into(), id.into());
                }
            }
        });
    }
}

impl GuildSettings {
    /// Record a display label in a stored settings value.
    pub fn stamp_name(data: &mut JsonValue, name: &str) {
        with_object(data, |object| {
            object.insert(keys::NAME.into(), name.into());
        });
    }
}

/// Run `edit` on the settings object, replacing a non-object value first.
fn with_object(data: &mut JsonValue, edit: impl FnOnce(&mut Map<String, JsonValue>)) {
    if !data.is_object() {
        warn!(previous = %data, "Replacing non-object guild settings with an empty object");
        *data = JsonValue::Object(Map::new());
    }
    if let Some(object) = data.as_object_mut() {
        edit(object);
    }
}

fn id_set(object: &Map<String, JsonValue>, key: &str) -> BTreeSet<RoleId> {
    match object.get(key) {
        Some(JsonValue::Array(items)) => items.iter().filter_map(parse_snowflake).map(RoleId).collect(),
        Some(single) => parse_snowflake(single).map(RoleId).into_iter().collect(),
        None => BTreeSet::new(),
    }
}

fn id_array(ids: &[RoleId]) -> JsonValue {
    JsonValue::Array(ids.iter().map(|id| JsonValue::from(id.get())).collect())
}
