//! Test utilities for workflow tests.
//!
//! This module provides an in-memory guild platform and session helpers.

pub mod mock_platform;

#[allow(unused_imports)]
pub use mock_platform::{Call, MockPlatform};

use serde_json::json;
use std::sync::Arc;
use vc_control_core::{ChannelId, GuildId, RoleId, VerificationSettings};
use vc_control_database::{DisabledGuildConfigStore, GuildConfigCache};
use vc_control_workflow::WorkflowService;

/// Guild used throughout the tests.
#[allow(dead_code)]
pub const GUILD: GuildId = GuildId(1);

/// A service over an in-memory cache with no database behind it.
#[allow(dead_code)]
pub fn service() -> WorkflowService {
    WorkflowService::new(Arc::new(GuildConfigCache::new(Arc::new(
        DisabledGuildConfigStore::new(),
    ))))
}

/// A service whose guild holds
/// `{allowed_roles: [10], verified_roles: [20], guest_role: 30, log_channel: 40}`.
#[allow(dead_code)]
pub async fn configured_service() -> WorkflowService {
    let service = service();
    service
        .cache()
        .update(GUILD, None, |data| {
            VerificationSettings::new(vec![RoleId(20)], vec![RoleId(10)], RoleId(30), ChannelId(40))
                .apply_to(data);
            data["unrelated"] = json!("kept");
        })
        .await
        .expect("in-memory update");
    service
}
