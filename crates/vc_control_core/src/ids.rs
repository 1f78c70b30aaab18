//! Snowflake identifiers.
//!
//! The platform hands out 64-bit snowflakes. Stored configuration may carry
//! them as JSON numbers or as numeric strings, so every id deserializes from
//! either and serializes back as a number.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Parse a snowflake from a JSON number or numeric string.
///
/// # Examples
///
/// ```
/// use vc_control_core::parse_snowflake;
/// use serde_json::json;
///
/// assert_eq!(parse_snowflake(&json!(10)), Some(10));
/// assert_eq!(parse_snowflake(&json!("20")), Some(20));
/// assert_eq!(parse_snowflake(&json!("guest")), None);
/// assert_eq!(parse_snowflake(&json!(null)), None);
/// assert_eq!(parse_snowflake(&json!(0)), None);
/// ```
pub fn parse_snowflake(value: &JsonValue) -> Option<u64> {
    let id = match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    // Snowflakes are never zero.
    id.filter(|id| *id != 0)
}

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            derive_more::Display,
            derive_more::From,
        )]
        #[serde(try_from = "JsonValue", into = "u64")]
        pub struct $name(pub u64);

        impl $name {
            /// Raw snowflake value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl TryFrom<JsonValue> for $name {
            type Error = String;

            fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
                parse_snowflake(&value)
                    .map(Self)
                    .ok_or_else(|| format!("not a snowflake: {}", value))
            }
        }
    };
}

snowflake!(
    /// A guild (server) id.
    GuildId
);
snowflake!(
    /// A user or member id.
    UserId
);
snowflake!(
    /// A role id.
    RoleId
);
snowflake!(
    /// A channel or thread id.
    ChannelId
);

impl UserId {
    /// Mention markup for this user.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl RoleId {
    /// Mention markup for this role.
    ///
    /// ```
    /// use vc_control_core::RoleId;
    /// assert_eq!(RoleId(20).mention(), "<@&20>");
    /// ```
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }
}

impl ChannelId {
    /// Mention markup for this channel.
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

/// A role's place in the guild hierarchy.
///
/// Roles order by position, with the id breaking ties, so one rank is
/// "below" another exactly when it compares less.
///
/// # Examples
///
/// ```
/// use vc_control_core::{RoleId, RoleRank};
///
/// let verified = RoleRank::new(RoleId(20), 3);
/// let bot_top = RoleRank::new(RoleId(99), 5);
/// assert!(verified < bot_top);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleRank {
    /// Position in the guild's role list (higher is more powerful)
    pub position: u16,
    /// Role id, used to break position ties
    pub id: RoleId,
}

impl RoleRank {
    /// Create a rank for `id` at `position`.
    pub fn new(id: RoleId, position: u16) -> Self {
        Self { position, id }
    }
}
