//! Side effects of committed verify, unverify and thread-broadcast drafts.
//!
//! Each target is handled independently: a failed platform call is counted
//! and logged, and the batch moves on.

use crate::{
    AuditRecord, GuildPlatform, MemberInfo, PlatformResult, RoleChangeCommit, RoleDirection,
    ThreadBroadcastCommit,
};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};
use vc_control_core::{GuildId, UserId};

/// Outcome of a verify or unverify commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleAssignmentResult {
    /// Grant or revoke
    pub direction: RoleDirection,
    /// Members the commit targeted
    pub users: usize,
    /// Verified-role grants or revocations performed
    pub role_changes: usize,
    /// Guest-role removals or restorations performed
    pub guest_changes: usize,
    /// Platform calls that failed
    pub failures: usize,
    /// Whether an audit record reached the log channel
    pub audited: bool,
}

impl RoleAssignmentResult {
    /// The notice shown to the moderator.
    ///
    /// ```
    /// use vc_control_workflow::{RoleAssignmentResult, RoleDirection};
    ///
    /// let result = RoleAssignmentResult {
    ///     direction: RoleDirection::Grant,
    ///     users: 1,
    ///     role_changes: 1,
    ///     guest_changes: 1,
    ///     failures: 0,
    ///     audited: true,
    /// };
    /// assert_eq!(result.summary(), "✅ Assigned roles to 1 user(s).");
    /// ```
    pub fn summary(&self) -> String {
        let mut summary = match self.direction {
            RoleDirection::Grant => format!("✅ Assigned roles to {} user(s).", self.users),
            RoleDirection::Revoke => format!("✅ Removed roles off {} user(s).", self.users),
        };
        if self.failures > 0 {
            summary.push_str(&format!(
                "\n⚠️ {} role change(s) failed (permissions or API error)",
                self.failures
            ));
        }
        summary
    }
}

/// Outcome of a thread-broadcast commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadCreationResult {
    /// Distinct human members found in the recipient roles
    pub members: usize,
    /// Threads created and messaged
    pub created: usize,
    /// Members whose thread could not be completed
    pub failed: usize,
}

impl ThreadCreationResult {
    /// The notice shown to the invoker.
    pub fn summary(&self) -> String {
        if self.members == 0 {
            return "❌ No members found in the selected recipient roles.".to_string();
        }
        let mut summary = format!(
            "✅ Created {} thread(s) for {} member(s)",
            self.created, self.members
        );
        if self.failed > 0 {
            summary.push_str(&format!(
                "\n⚠️ Failed to create {} thread(s) (permissions or API error)",
                self.failed
            ));
        }
        summary
    }
}

/// Apply a verify or unverify commit.
///
/// Verify strips the guest role when toggled and held, then grants each role
/// the member lacks. Unverify restores the guest role when toggled and not
/// held, then revokes each role the member holds. Only roles strictly below
/// the bot's top role are ever granted or revoked.
///
/// # Errors
///
/// Fails only when the guild's role hierarchy cannot be read; per-member
/// failures are counted in the result.
#[instrument(skip(platform, commit), fields(direction = %commit.direction, targets = commit.targets.len()))]
pub async fn apply_role_change<P>(
    platform: &P,
    guild: GuildId,
    moderator: UserId,
    commit: &RoleChangeCommit,
) -> PlatformResult<RoleAssignmentResult>
where
    P: GuildPlatform + ?Sized,
{
    let hierarchy = platform.role_hierarchy(guild).await?;
    let mut result = RoleAssignmentResult {
        direction: commit.direction,
        users: commit.targets.len(),
        role_changes: 0,
        guest_changes: 0,
        failures: 0,
        audited: false,
    };

    for &target in &commit.targets {
        let member = match platform.member(guild, target).await {
            Ok(member) => member,
            Err(e) => {
                warn!(user = %target, error = %e, "Could not load member, skipping");
                result.failures += 1;
                continue;
            }
        };

        if let Some(guest) = commit.guest_role {
            let call = match commit.direction {
                RoleDirection::Grant if member.has_role(guest) => {
                    Some(platform.remove_role(guild, target, guest).await)
                }
                RoleDirection::Revoke if !member.has_role(guest) => {
                    Some(platform.add_role(guild, target, guest).await)
                }
                _ => None,
            };
            match call {
                Some(Ok(())) => result.guest_changes += 1,
                Some(Err(e)) => {
                    warn!(user = %target, role = %guest, error = %e, "Guest role change failed");
                    result.failures += 1;
                }
                None => {}
            }
        }

        for &role in &commit.roles {
            if !hierarchy.is_below_bot(role) {
                continue;
            }
            let call = match commit.direction {
                RoleDirection::Grant if !member.has_role(role) => {
                    platform.add_role(guild, target, role).await
                }
                RoleDirection::Revoke if member.has_role(role) => {
                    platform.remove_role(guild, target, role).await
                }
                _ => continue,
            };
            match call {
                Ok(()) => result.role_changes += 1,
                Err(e) => {
                    warn!(user = %target, role = %role, error = %e, "Role change failed");
                    result.failures += 1;
                }
            }
        }
    }

    if let Some(channel) = commit.log_channel {
        let record = match commit.direction {
            RoleDirection::Grant => AuditRecord {
                title: "User Verified",
                moderator,
                users: commit.targets.clone(),
                roles_label: "Roles Assigned",
                roles: commit.roles.clone(),
            },
            RoleDirection::Revoke => AuditRecord {
                title: "User Unverified",
                moderator,
                users: commit.targets.clone(),
                roles_label: "Roles Removed",
                roles: commit.roles.clone(),
            },
        };
        match platform.send_audit(channel, &record).await {
            Ok(()) => result.audited = true,
            Err(e) => warn!(channel = %channel, error = %e, "Could not post audit record"),
        }
    }

    info!(
        role_changes = result.role_changes,
        guest_changes = result.guest_changes,
        failures = result.failures,
        "Role change applied"
    );
    Ok(result)
}

/// Thread names are capped by the platform.
const THREAD_NAME_MAX_CHARS: usize = 100;

fn thread_name(member: &MemberInfo) -> String {
    format!("Message for {}", member.display_name)
        .chars()
        .take(THREAD_NAME_MAX_CHARS)
        .collect()
}

/// Create one private thread per human member of the recipient roles and
/// post the composed message in it.
///
/// # Errors
///
/// Fails only when the recipient roles' members cannot be listed.
#[instrument(skip(platform, commit), fields(channel = %commit.channel))]
pub async fn broadcast_threads<P>(
    platform: &P,
    guild: GuildId,
    commit: &ThreadBroadcastCommit,
) -> PlatformResult<ThreadCreationResult>
where
    P: GuildPlatform + ?Sized,
{
    let recipients: BTreeMap<UserId, MemberInfo> = platform
        .members_with_roles(guild, &commit.recipient_roles)
        .await?
        .into_iter()
        .filter(|member| !member.bot)
        .map(|member| (member.id, member))
        .collect();

    let mut result = ThreadCreationResult {
        members: recipients.len(),
        created: 0,
        failed: 0,
    };

    for member in recipients.values() {
        match deliver(platform, commit, member).await {
            Ok(()) => result.created += 1,
            Err(e) => {
                warn!(user = %member.id, error = %e, "Thread delivery failed");
                result.failed += 1;
            }
        }
    }

    info!(
        members = result.members,
        created = result.created,
        failed = result.failed,
        "Thread broadcast finished"
    );
    Ok(result)
}

async fn deliver<P>(
    platform: &P,
    commit: &ThreadBroadcastCommit,
    member: &MemberInfo,
) -> PlatformResult<()>
where
    P: GuildPlatform + ?Sized,
{
    let thread = platform
        .create_private_thread(commit.channel, &thread_name(member))
        .await?;
    platform.add_thread_member(thread, member.id).await?;
    platform
        .send_message(thread, &commit.compose(member.id))
        .await
}
