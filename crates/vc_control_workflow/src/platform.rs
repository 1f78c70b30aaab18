//! The chat platform as seen by the commit executors.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use vc_control_core::{ChannelId, GuildId, RoleId, RoleRank, UserId};
use vc_control_error::PlatformError;

/// Result type for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// A guild member with the facts the executors need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Member id
    pub id: UserId,
    /// Name shown in the guild
    pub display_name: String,
    /// Roles currently held
    pub roles: BTreeSet<RoleId>,
    /// Whether the account is a bot
    pub bot: bool,
}

impl MemberInfo {
    /// A human member holding no roles.
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            roles: BTreeSet::new(),
            bot: false,
        }
    }

    /// Replace the held roles.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    /// Mark the member as a bot account.
    pub fn as_bot(mut self) -> Self {
        self.bot = true;
        self
    }

    /// Whether the member holds `role`.
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

/// A guild's role ordering together with the bot's highest role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleHierarchy {
    ranks: HashMap<RoleId, RoleRank>,
    bot_top: Option<RoleRank>,
}

impl RoleHierarchy {
    /// Build a hierarchy from `(role, position)` pairs and the bot's top role.
    pub fn new(
        positions: impl IntoIterator<Item = (RoleId, u16)>,
        bot_top: Option<RoleId>,
    ) -> Self {
        let ranks: HashMap<RoleId, RoleRank> = positions
            .into_iter()
            .map(|(id, position)| (id, RoleRank::new(id, position)))
            .collect();
        let bot_top = bot_top.and_then(|id| ranks.get(&id).copied());
        Self { ranks, bot_top }
    }

    /// The bot's highest role, if it holds any.
    pub fn bot_top(&self) -> Option<RoleRank> {
        self.bot_top
    }

    /// Whether the bot may grant or revoke `role`.
    ///
    /// Unknown roles and a bot holding no roles both answer `false`.
    ///
    /// ```
    /// use vc_control_core::RoleId;
    /// use vc_control_workflow::RoleHierarchy;
    ///
    /// let hierarchy = RoleHierarchy::new(
    ///     [(RoleId(20), 2), (RoleId(30), 1), (RoleId(99), 5), (RoleId(100), 6)],
    ///     Some(RoleId(99)),
    /// );
    /// assert!(hierarchy.is_below_bot(RoleId(20)));
    /// assert!(!hierarchy.is_below_bot(RoleId(99)));
    /// assert!(!hierarchy.is_below_bot(RoleId(100)));
    /// assert!(!hierarchy.is_below_bot(RoleId(7)));
    /// ```
    pub fn is_below_bot(&self, role: RoleId) -> bool {
        match (self.ranks.get(&role), self.bot_top) {
            (Some(rank), Some(top)) => *rank < top,
            _ => false,
        }
    }
}

/// An audit entry posted to a guild's log channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Embed title
    pub title: &'static str,
    /// Moderator who committed the change
    pub moderator: UserId,
    /// Members the change targeted
    pub users: Vec<UserId>,
    /// Label for the role field
    pub roles_label: &'static str,
    /// Roles granted or revoked
    pub roles: Vec<RoleId>,
}

/// Guild operations the wizards' commits perform.
///
/// Implemented over the Discord HTTP client in `vc_control_discord`; tests
/// use in-memory doubles.
#[async_trait]
pub trait GuildPlatform: Send + Sync {
    /// Look up one member.
    async fn member(&self, guild: GuildId, user: UserId) -> PlatformResult<MemberInfo>;

    /// The guild's role ordering and the bot's top role.
    async fn role_hierarchy(&self, guild: GuildId) -> PlatformResult<RoleHierarchy>;

    /// Grant `role` to `user`.
    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> PlatformResult<()>;

    /// Revoke `role` from `user`.
    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> PlatformResult<()>;

    /// Every member holding at least one of `roles`. May repeat members.
    async fn members_with_roles(
        &self,
        guild: GuildId,
        roles: &[RoleId],
    ) -> PlatformResult<Vec<MemberInfo>>;

    /// Create a private, non-invitable thread under `channel`.
    async fn create_private_thread(&self, channel: ChannelId, name: &str)
    -> PlatformResult<ChannelId>;

    /// Add `user` to `thread`.
    async fn add_thread_member(&self, thread: ChannelId, user: UserId) -> PlatformResult<()>;

    /// Post a plain message.
    async fn send_message(&self, channel: ChannelId, content: &str) -> PlatformResult<()>;

    /// Post an audit record.
    async fn send_audit(&self, channel: ChannelId, record: &AuditRecord) -> PlatformResult<()>;
}
