//! In-memory guild platform that records every mutation.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use vc_control_core::{ChannelId, GuildId, RoleId, UserId};
use vc_control_error::{PlatformError, PlatformErrorKind};
use vc_control_workflow::{AuditRecord, GuildPlatform, MemberInfo, PlatformResult, RoleHierarchy};

/// A recorded platform mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AddRole(UserId, RoleId),
    RemoveRole(UserId, RoleId),
    CreateThread(ChannelId, String),
    AddThreadMember(ChannelId, UserId),
    Send(ChannelId, String),
    Audit(ChannelId, AuditRecord),
}

/// Guild double with one role hierarchy and a fixed member list.
pub struct MockPlatform {
    members: Mutex<Vec<MemberInfo>>,
    hierarchy: RoleHierarchy,
    calls: Mutex<Vec<Call>>,
    refused_threads: BTreeSet<UserId>,
    refused_roles: BTreeSet<RoleId>,
    next_thread: AtomicU64,
}

impl MockPlatform {
    /// A guild whose roles sit at the given positions, with the bot's top
    /// role at position 5.
    pub fn new(positions: &[(RoleId, u16)]) -> Self {
        let bot_top = RoleId(99);
        let mut all = positions.to_vec();
        all.push((bot_top, 5));
        Self {
            members: Mutex::new(Vec::new()),
            hierarchy: RoleHierarchy::new(all, Some(bot_top)),
            calls: Mutex::new(Vec::new()),
            refused_threads: BTreeSet::new(),
            refused_roles: BTreeSet::new(),
            next_thread: AtomicU64::new(1000),
        }
    }

    /// Add a member.
    pub fn with_member(self, member: MemberInfo) -> Self {
        self.members.lock().expect("lock").push(member);
        self
    }

    /// Refuse thread creation for `user`'s thread.
    pub fn refusing_thread_for(mut self, user: UserId) -> Self {
        self.refused_threads.insert(user);
        self
    }

    /// Refuse every grant or revoke of `role`.
    pub fn refusing_role(mut self, role: RoleId) -> Self {
        self.refused_roles.insert(role);
        self
    }

    /// Every mutation so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    /// Roles `user` currently holds.
    pub fn roles_of(&self, user: UserId) -> BTreeSet<RoleId> {
        self.members
            .lock()
            .expect("lock")
            .iter()
            .find(|member| member.id == user)
            .map(|member| member.roles.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("lock").push(call);
    }

    fn mutate(&self, user: UserId, role: RoleId, grant: bool) -> PlatformResult<()> {
        if self.refused_roles.contains(&role) {
            return Err(PlatformError::new(PlatformErrorKind::Forbidden(
                "Missing Permissions".to_string(),
            )));
        }
        let mut members = self.members.lock().expect("lock");
        let member = members
            .iter_mut()
            .find(|member| member.id == user)
            .ok_or_else(|| PlatformError::new(PlatformErrorKind::NotFound(user.to_string())))?;
        if grant {
            member.roles.insert(role);
        } else {
            member.roles.remove(&role);
        }
        Ok(())
    }
}

#[async_trait]
impl GuildPlatform for MockPlatform {
    async fn member(&self, _guild: GuildId, user: UserId) -> PlatformResult<MemberInfo> {
        self.members
            .lock()
            .expect("lock")
            .iter()
            .find(|member| member.id == user)
            .cloned()
            .ok_or_else(|| PlatformError::new(PlatformErrorKind::NotFound(user.to_string())))
    }

    async fn role_hierarchy(&self, _guild: GuildId) -> PlatformResult<RoleHierarchy> {
        Ok(self.hierarchy.clone())
    }

    async fn add_role(&self, _guild: GuildId, user: UserId, role: RoleId) -> PlatformResult<()> {
        self.mutate(user, role, true)?;
        self.record(Call::AddRole(user, role));
        Ok(())
    }

    async fn remove_role(&self, _guild: GuildId, user: UserId, role: RoleId) -> PlatformResult<()> {
        self.mutate(user, role, false)?;
        self.record(Call::RemoveRole(user, role));
        Ok(())
    }

    async fn members_with_roles(
        &self,
        _guild: GuildId,
        roles: &[RoleId],
    ) -> PlatformResult<Vec<MemberInfo>> {
        let members = self.members.lock().expect("lock");
        // One entry per (role, member) pair, as a per-role listing would give.
        Ok(roles
            .iter()
            .flat_map(|role| members.iter().filter(move |member| member.has_role(*role)))
            .cloned()
            .collect())
    }

    async fn create_private_thread(
        &self,
        channel: ChannelId,
        name: &str,
    ) -> PlatformResult<ChannelId> {
        let refused = self.members.lock().expect("lock").iter().any(|member| {
            self.refused_threads.contains(&member.id)
                && name == format!("Message for {}", member.display_name)
        });
        if refused {
            return Err(PlatformError::new(PlatformErrorKind::Forbidden(
                "Missing Permissions".to_string(),
            )));
        }
        self.record(Call::CreateThread(channel, name.to_string()));
        Ok(ChannelId(self.next_thread.fetch_add(1, Ordering::SeqCst)))
    }

    async fn add_thread_member(&self, thread: ChannelId, user: UserId) -> PlatformResult<()> {
        self.record(Call::AddThreadMember(thread, user));
        Ok(())
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> PlatformResult<()> {
        self.record(Call::Send(channel, content.to_string()));
        Ok(())
    }

    async fn send_audit(&self, channel: ChannelId, record: &AuditRecord) -> PlatformResult<()> {
        self.record(Call::Audit(channel, record.clone()));
        Ok(())
    }
}
