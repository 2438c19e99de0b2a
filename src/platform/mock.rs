//! In-process platform for testing
//!
//! Keeps rooms and messages in memory, records every side effect and can be
//! told to fail individual operations.

use crate::error::{RankedError, Result};
use crate::platform::{Platform, Post, PostedMessage, RoomRequest, UserProfile};
use crate::types::{MessageId, RoomId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A room created through the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRoom {
    pub request: RoomRequest,
    /// Members granted access, creator first
    pub members: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    admins: HashSet<(String, String)>,
    roles: HashSet<(String, String, String)>,
    profiles: HashMap<String, UserProfile>,
    rooms: BTreeMap<RoomId, MockRoom>,
    deleted_rooms: Vec<RoomId>,
    messages: BTreeMap<(String, MessageId), Post>,
    sent: Vec<(String, Post)>,
    edits: Vec<(String, MessageId, Post)>,
    failing: HashSet<String>,
}

/// Mock platform for testing
#[derive(Debug)]
pub struct MockPlatform {
    state: Mutex<MockState>,
    next_id: AtomicU64,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            next_id: AtomicU64::new(1000),
        }
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>> {
        self.state.lock().map_err(|_| RankedError::Internal {
            message: "Mock platform lock poisoned".to_string(),
        })
    }

    fn with_state(&self, f: impl FnOnce(&mut MockState)) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
    }

    fn read<T: Default>(&self, f: impl FnOnce(&MockState) -> T) -> T {
        self.state.lock().map(|state| f(&state)).unwrap_or_default()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check(&self, state: &MockState, operation: &str) -> Result<()> {
        if state.failing.contains(operation) {
            return Err(RankedError::external(operation, "simulated platform failure"));
        }
        Ok(())
    }

    /// Grant administrator rights (for testing)
    pub fn with_admin(self, guild_id: &str, user_id: &str) -> Self {
        self.with_state(|state| {
            state
                .admins
                .insert((guild_id.to_string(), user_id.to_string()));
        });
        self
    }

    /// Give a member a role (for testing)
    pub fn with_role(self, guild_id: &str, user_id: &str, role_id: &str) -> Self {
        self.with_state(|state| {
            state.roles.insert((
                guild_id.to_string(),
                user_id.to_string(),
                role_id.to_string(),
            ));
        });
        self
    }

    /// Register a display name for a user (for testing)
    pub fn with_profile(self, user_id: &str, display_name: &str) -> Self {
        self.with_state(|state| {
            state.profiles.insert(
                user_id.to_string(),
                UserProfile {
                    id: user_id.to_string(),
                    display_name: display_name.to_string(),
                    avatar_url: Some(format!("https://cdn.example/avatars/{}.png", user_id)),
                },
            );
        });
        self
    }

    /// Make an operation fail until [`MockPlatform::restore`] is called
    pub fn fail(&self, operation: &str) {
        self.with_state(|state| {
            state.failing.insert(operation.to_string());
        });
    }

    pub fn restore(&self, operation: &str) {
        self.with_state(|state| {
            state.failing.remove(operation);
        });
    }

    /// Remove a posted message, as if someone deleted it by hand
    pub fn delete_message(&self, channel_id: &str, message_id: &str) {
        self.with_state(|state| {
            state
                .messages
                .remove(&(channel_id.to_string(), message_id.to_string()));
        });
    }

    pub fn rooms(&self) -> BTreeMap<RoomId, MockRoom> {
        self.read(|state| state.rooms.clone())
    }

    pub fn room(&self, room_id: &str) -> Option<MockRoom> {
        self.read(|state| state.rooms.get(room_id).cloned())
    }

    pub fn deleted_rooms(&self) -> Vec<RoomId> {
        self.read(|state| state.deleted_rooms.clone())
    }

    /// Every message sent, in order
    pub fn sent_messages(&self) -> Vec<(String, Post)> {
        self.read(|state| state.sent.clone())
    }

    /// Messages sent to one channel, in order
    pub fn sent_to(&self, channel_id: &str) -> Vec<Post> {
        self.read(|state| {
            state
                .sent
                .iter()
                .filter(|(channel, _)| channel == channel_id)
                .map(|(_, post)| post.clone())
                .collect()
        })
    }

    pub fn edits(&self) -> Vec<(String, MessageId, Post)> {
        self.read(|state| state.edits.clone())
    }

    /// Current contents of a live message
    pub fn message(&self, channel_id: &str, message_id: &str) -> Option<Post> {
        self.read(|state| {
            state
                .messages
                .get(&(channel_id.to_string(), message_id.to_string()))
                .cloned()
        })
    }

    /// Number of live messages in a channel
    pub fn live_message_count(&self, channel_id: &str) -> usize {
        self.read(|state| {
            state
                .messages
                .keys()
                .filter(|(channel, _)| channel == channel_id)
                .count()
        })
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn is_administrator(&self, guild_id: &str, user_id: &str) -> Result<bool> {
        let state = self.state()?;
        self.check(&state, "is_administrator")?;
        Ok(state
            .admins
            .contains(&(guild_id.to_string(), user_id.to_string())))
    }

    async fn has_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<bool> {
        let state = self.state()?;
        self.check(&state, "has_role")?;
        Ok(state.roles.contains(&(
            guild_id.to_string(),
            user_id.to_string(),
            role_id.to_string(),
        )))
    }

    async fn create_room(&self, request: RoomRequest) -> Result<RoomId> {
        let mut state = self.state()?;
        self.check(&state, "create_room")?;
        let room_id = self.next_id("room");
        let members = vec![request.creator_id.clone()];
        state
            .rooms
            .insert(room_id.clone(), MockRoom { request, members });
        Ok(room_id)
    }

    async fn grant_access(&self, room_id: &str, user_id: &str) -> Result<()> {
        let mut state = self.state()?;
        self.check(&state, "grant_access")?;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RankedError::external("grant_access", "Unknown Channel"))?;
        if !room.members.iter().any(|m| m == user_id) {
            room.members.push(user_id.to_string());
        }
        Ok(())
    }

    async fn delete_room(&self, room_id: &str) -> Result<()> {
        let mut state = self.state()?;
        self.check(&state, "delete_room")?;
        if state.rooms.remove(room_id).is_none() {
            return Err(RankedError::external("delete_room", "Unknown Channel"));
        }
        state.deleted_rooms.push(room_id.to_string());
        Ok(())
    }

    async fn send_message(&self, channel_id: &str, post: &Post) -> Result<MessageId> {
        let mut state = self.state()?;
        self.check(&state, "send_message")?;
        let message_id = self.next_id("msg");
        state
            .messages
            .insert((channel_id.to_string(), message_id.clone()), post.clone());
        state.sent.push((channel_id.to_string(), post.clone()));
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        post: &Post,
    ) -> Result<bool> {
        let mut state = self.state()?;
        self.check(&state, "edit_message")?;
        let key = (channel_id.to_string(), message_id.to_string());
        let Some(existing) = state.messages.get_mut(&key) else {
            return Ok(false);
        };
        *existing = post.clone();
        state
            .edits
            .push((channel_id.to_string(), message_id.to_string(), post.clone()));
        Ok(true)
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<PostedMessage>> {
        let state = self.state()?;
        self.check(&state, "fetch_message")?;
        let exists = state
            .messages
            .contains_key(&(channel_id.to_string(), message_id.to_string()));
        Ok(exists.then(|| PostedMessage {
            id: message_id.to_string(),
            channel_id: channel_id.to_string(),
        }))
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile> {
        let state = self.state()?;
        self.check(&state, "user_profile")?;
        state
            .profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| RankedError::external("user_profile", "Unknown User"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_request() -> RoomRequest {
        RoomRequest {
            guild_id: "g".to_string(),
            name: "1v1-alice".to_string(),
            category_id: None,
            creator_id: "alice".to_string(),
            host_role_ids: vec!["host".to_string()],
        }
    }

    #[tokio::test]
    async fn test_room_lifecycle() {
        let platform = MockPlatform::new();
        let room_id = platform.create_room(room_request()).await.unwrap();
        platform.grant_access(&room_id, "bob").await.unwrap();
        platform.grant_access(&room_id, "bob").await.unwrap();

        assert_eq!(platform.room(&room_id).unwrap().members, vec!["alice", "bob"]);

        platform.delete_room(&room_id).await.unwrap();
        assert!(platform.room(&room_id).is_none());
        assert_eq!(platform.deleted_rooms(), vec![room_id.clone()]);
        assert!(platform.delete_room(&room_id).await.is_err());
    }

    #[tokio::test]
    async fn test_messages_can_disappear() {
        let platform = MockPlatform::new();
        let id = platform.send_message("c", &Post::text("hi")).await.unwrap();
        assert!(platform.fetch_message("c", &id).await.unwrap().is_some());

        platform.delete_message("c", &id);
        assert!(platform.fetch_message("c", &id).await.unwrap().is_none());
        assert!(!platform
            .edit_message("c", &id, &Post::text("again"))
            .await
            .unwrap());
        assert!(platform.edits().is_empty());
    }

    #[tokio::test]
    async fn test_failure_switch() {
        let platform = MockPlatform::new();
        platform.fail("send_message");
        let err = platform.send_message("c", &Post::text("x")).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ExternalCallFailure);

        platform.restore("send_message");
        assert!(platform.send_message("c", &Post::text("x")).await.is_ok());
        assert_eq!(platform.sent_to("c").len(), 1);
    }

    #[tokio::test]
    async fn test_roles_and_admins() {
        let platform = MockPlatform::new()
            .with_admin("g", "boss")
            .with_role("g", "h", "host");

        assert!(platform.is_administrator("g", "boss").await.unwrap());
        assert!(!platform.is_administrator("other", "boss").await.unwrap());
        assert!(platform.has_role("g", "h", "host").await.unwrap());
        assert!(!platform.has_role("g", "h", "other").await.unwrap());
    }
}
