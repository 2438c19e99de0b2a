//! Chat platform port
//!
//! Everything the coordinator needs from the chat platform goes through the
//! [`Platform`] trait: permission checks, private room management, message
//! posting and user lookups. The Discord implementation lives in
//! [`crate::discord`]; [`MockPlatform`] records calls for tests.

pub mod message;
pub mod mock;

pub use message::{Button, ButtonStyle, Panel, PanelField, Post};
pub use mock::MockPlatform;

use crate::error::Result;
use crate::types::{ChannelId, GuildId, MessageId, RoleId, RoomId, UserId};
use async_trait::async_trait;

/// Request to open a private match room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRequest {
    pub guild_id: GuildId,
    pub name: String,
    /// Category the room is created under, if configured
    pub category_id: Option<ChannelId>,
    /// Member that gets view/send access alongside the host roles
    pub creator_id: UserId,
    pub host_role_ids: Vec<RoleId>,
}

/// Public identity of a platform user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// A message that still exists on the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
}

/// Trait for the chat platform operations the coordinator depends on
///
/// Every failure is reported as [`crate::error::RankedError::ExternalCallFailure`].
#[async_trait]
pub trait Platform: Send + Sync {
    /// Whether the member holds administrator rights in the guild
    async fn is_administrator(&self, guild_id: &str, user_id: &str) -> Result<bool>;

    /// Whether the member holds the given role
    async fn has_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<bool>;

    /// Create a private room visible only to the creator and host roles
    async fn create_room(&self, request: RoomRequest) -> Result<RoomId>;

    /// Give a member view and send access to a room
    async fn grant_access(&self, room_id: &str, user_id: &str) -> Result<()>;

    /// Delete a room
    async fn delete_room(&self, room_id: &str) -> Result<()>;

    /// Post a message, returning its id
    async fn send_message(&self, channel_id: &str, post: &Post) -> Result<MessageId>;

    /// Replace the contents of an existing message; `false` if it has been deleted
    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        post: &Post,
    ) -> Result<bool>;

    /// Look up a message by id; `None` if it has been deleted
    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<PostedMessage>>;

    /// Resolve a user's display identity
    async fn user_profile(&self, user_id: &str) -> Result<UserProfile>;
}
