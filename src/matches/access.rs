//! Host authorization

use crate::error::Result;
use crate::platform::Platform;
use crate::types::{GuildSettings, RoleId, UserId};
use tracing::debug;

/// Roles and permissions the platform attached to an inbound interaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberAccess {
    pub is_administrator: bool,
    pub role_ids: Vec<RoleId>,
}

/// The member running a command
///
/// When the interaction carried the member's roles and permissions they are
/// used as-is; otherwise checks fall back to asking the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
    pub access: Option<MemberAccess>,
}

impl Requester {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            access: None,
        }
    }

    pub fn with_access(mut self, access: MemberAccess) -> Self {
        self.access = Some(access);
        self
    }

    pub fn id(&self) -> &str {
        &self.user_id
    }

    /// Whether the member holds administrator rights in the guild
    pub async fn is_administrator(&self, platform: &dyn Platform, guild_id: &str) -> Result<bool> {
        match &self.access {
            Some(access) => Ok(access.is_administrator),
            None => platform.is_administrator(guild_id, &self.user_id).await,
        }
    }
}

impl From<&str> for Requester {
    fn from(user_id: &str) -> Self {
        Self::new(user_id)
    }
}

/// A host is a guild administrator or a holder of any configured host role
pub async fn is_host(
    platform: &dyn Platform,
    settings: &GuildSettings,
    guild_id: &str,
    requester: &Requester,
) -> Result<bool> {
    let user_id = requester.id();
    if requester.is_administrator(platform, guild_id).await? {
        debug!("'{}' is an administrator in guild '{}'", user_id, guild_id);
        return Ok(true);
    }

    if let Some(access) = &requester.access {
        let held = settings
            .host_role_ids
            .iter()
            .find(|role_id| access.role_ids.contains(role_id));
        if let Some(role_id) = held {
            debug!("'{}' holds host role '{}'", user_id, role_id);
        }
        return Ok(held.is_some());
    }

    for role_id in &settings.host_role_ids {
        if platform.has_role(guild_id, user_id, role_id).await? {
            debug!("'{}' holds host role '{}'", user_id, role_id);
            return Ok(true);
        }
    }

    Ok(false)
}
