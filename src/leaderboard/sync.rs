//! Leaderboard panel synchronization
//!
//! Keeps at most one live panel per guild and mode: the stored message is
//! edited while it exists and replaced when it has been deleted.

use crate::error::{RankedError, Result};
use crate::leaderboard::render::leaderboard_panel;
use crate::leaderboard::standings::{standings, Standing, DEFAULT_LEADERBOARD_SIZE};
use crate::metrics::MetricsCollector;
use crate::platform::{Panel, Platform, Post};
use crate::store::Store;
use crate::types::{ChannelId, GuildId, MatchType, MessageId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// What a sync did to the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelAction {
    /// The stored message was edited in place
    Edited,
    /// No message was stored; a new one was posted
    Created,
    /// The stored message was gone; a new one was posted
    Recreated,
}

impl PanelAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelAction::Edited => "edited",
            PanelAction::Created => "created",
            PanelAction::Recreated => "recreated",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelUpdateResult {
    pub mode: MatchType,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub action: PanelAction,
    pub standings: Vec<Standing>,
}

/// Leaderboard synchronizer
pub struct LeaderboardSync {
    store: Arc<Store>,
    platform: Arc<dyn Platform>,
    metrics_collector: Arc<MetricsCollector>,
    limit: usize,
    /// Serializes syncs per guild so two requests cannot both post a panel
    guild_locks: Mutex<HashMap<GuildId, Arc<tokio::sync::Mutex<()>>>>,
}

impl LeaderboardSync {
    pub fn new(store: Arc<Store>, platform: Arc<dyn Platform>) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(store, platform, metrics_collector)
    }

    pub fn with_metrics(
        store: Arc<Store>,
        platform: Arc<dyn Platform>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            platform,
            metrics_collector,
            limit: DEFAULT_LEADERBOARD_SIZE,
            guild_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Number of players listed per panel
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn standings(&self, guild_id: &str, mode: MatchType) -> Result<Vec<Standing>> {
        standings(&self.store, guild_id, mode, self.limit)
    }

    /// Render the current leaderboard without touching any panel
    pub fn panel(&self, guild_id: &str, mode: MatchType) -> Result<(Panel, Vec<Standing>)> {
        let standings = self.standings(guild_id, mode)?;
        Ok((leaderboard_panel(mode, &standings, self.limit), standings))
    }

    fn guild_lock(&self, guild_id: &str) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self.guild_locks.lock().map_err(|_| RankedError::Internal {
            message: "Failed to acquire leaderboard lock table".to_string(),
        })?;
        Ok(locks
            .entry(guild_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone())
    }

    /// Bring the mode's panel in the leaderboard channel up to date
    pub async fn sync(&self, guild_id: &str, mode: MatchType) -> Result<PanelUpdateResult> {
        let lock = self.guild_lock(guild_id)?;
        let _guard = lock.lock().await;

        let settings = self.store.settings(guild_id)?;
        let channel_id = settings.leaderboard_channel_id.clone().ok_or_else(|| {
            RankedError::not_found(
                "No leaderboard channel has been configured. An administrator needs to use /setleaderboardchannel first.",
            )
        })?;

        let (panel, standings) = self.panel(guild_id, mode)?;
        let post = Post::panel(panel);

        let stored_id = settings.leaderboard_message_id(mode).cloned();
        let action = match &stored_id {
            Some(message_id) => {
                let existing = self
                    .platform
                    .fetch_message(&channel_id, message_id)
                    .await
                    .map_err(|e| self.external_failure("fetch_message", e))?;

                // The panel can disappear between the lookup and the edit
                let edited = match existing {
                    Some(_) => self
                        .platform
                        .edit_message(&channel_id, message_id, &post)
                        .await
                        .map_err(|e| self.external_failure("edit_message", e))?,
                    None => false,
                };

                if edited {
                    self.metrics_collector
                        .record_leaderboard_sync(mode, PanelAction::Edited.as_str());
                    debug!(
                        "Edited {} leaderboard panel '{}' in guild '{}'",
                        mode, message_id, guild_id
                    );
                    return Ok(PanelUpdateResult {
                        mode,
                        channel_id,
                        message_id: message_id.clone(),
                        action: PanelAction::Edited,
                        standings,
                    });
                }

                info!(
                    "{} leaderboard panel '{}' in guild '{}' is gone, posting a new one",
                    mode, message_id, guild_id
                );
                PanelAction::Recreated
            }
            None => PanelAction::Created,
        };

        let message_id = self
            .platform
            .send_message(&channel_id, &post)
            .await
            .map_err(|e| self.external_failure("send_message", e))?;

        self.store.update_settings(guild_id, |settings| {
            settings
                .leaderboard_message_ids
                .insert(mode, Some(message_id.clone()));
        })?;

        self.metrics_collector
            .record_leaderboard_sync(mode, action.as_str());
        info!(
            "Posted {} leaderboard panel '{}' in guild '{}' ({})",
            mode,
            message_id,
            guild_id,
            action.as_str()
        );

        Ok(PanelUpdateResult {
            mode,
            channel_id,
            message_id,
            action,
            standings,
        })
    }

    /// Sync both modes
    ///
    /// Every mode is attempted even when an earlier one fails; the first
    /// failure is returned after the rest have run.
    pub async fn sync_all(&self, guild_id: &str) -> Result<Vec<PanelUpdateResult>> {
        let mut results = Vec::with_capacity(MatchType::ALL.len());
        let mut first_error = None;
        for mode in MatchType::ALL {
            match self.sync(guild_id, mode).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(
                        "{} leaderboard sync for guild '{}' failed: {}",
                        mode, guild_id, e
                    );
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }

    fn external_failure(&self, operation: &str, error: RankedError) -> RankedError {
        warn!("Leaderboard {} failed: {}", operation, error);
        self.metrics_collector.record_external_failure(operation);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::platform::MockPlatform;

    fn setup() -> (LeaderboardSync, Arc<MockPlatform>, Arc<Store>) {
        let store = Arc::new(Store::in_memory());
        store
            .update_settings("g", |s| s.leaderboard_channel_id = Some("lb".to_string()))
            .unwrap();
        store.update_player("g", "a", |r| r.elo_1v1 = 1200).unwrap();
        let platform = Arc::new(MockPlatform::new());
        let sync = LeaderboardSync::new(store.clone(), platform.clone());
        (sync, platform, store)
    }

    #[tokio::test]
    async fn test_requires_channel() {
        let store = Arc::new(Store::in_memory());
        let sync = LeaderboardSync::new(store, Arc::new(MockPlatform::new()));
        let err = sync.sync("g", MatchType::OneVsOne).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_then_edit_in_place() {
        let (sync, platform, store) = setup();

        let first = sync.sync("g", MatchType::OneVsOne).await.unwrap();
        assert_eq!(first.action, PanelAction::Created);

        store.update_player("g", "b", |r| r.elo_1v1 = 1500).unwrap();
        let second = sync.sync("g", MatchType::OneVsOne).await.unwrap();
        assert_eq!(second.action, PanelAction::Edited);
        assert_eq!(second.message_id, first.message_id);
        assert_eq!(second.standings[0].user_id, "b");

        assert_eq!(platform.sent_to("lb").len(), 1);
        assert_eq!(platform.edits().len(), 1);
        assert_eq!(platform.live_message_count("lb"), 1);
    }

    #[tokio::test]
    async fn test_deleted_panel_is_recreated() {
        let (sync, platform, store) = setup();
        let first = sync.sync("g", MatchType::TwoVsTwo).await.unwrap();
        platform.delete_message("lb", &first.message_id);

        let second = sync.sync("g", MatchType::TwoVsTwo).await.unwrap();
        assert_eq!(second.action, PanelAction::Recreated);
        assert_ne!(second.message_id, first.message_id);
        assert_eq!(
            store
                .settings("g")
                .unwrap()
                .leaderboard_message_id(MatchType::TwoVsTwo),
            Some(&second.message_id)
        );
    }

    /// Deletes the target message right before editing it
    struct VanishingPanels {
        inner: Arc<MockPlatform>,
    }

    #[async_trait::async_trait]
    impl Platform for VanishingPanels {
        async fn is_administrator(&self, guild_id: &str, user_id: &str) -> Result<bool> {
            self.inner.is_administrator(guild_id, user_id).await
        }

        async fn has_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<bool> {
            self.inner.has_role(guild_id, user_id, role_id).await
        }

        async fn create_room(&self, request: crate::platform::RoomRequest) -> Result<String> {
            self.inner.create_room(request).await
        }

        async fn grant_access(&self, room_id: &str, user_id: &str) -> Result<()> {
            self.inner.grant_access(room_id, user_id).await
        }

        async fn delete_room(&self, room_id: &str) -> Result<()> {
            self.inner.delete_room(room_id).await
        }

        async fn send_message(&self, channel_id: &str, post: &Post) -> Result<String> {
            self.inner.send_message(channel_id, post).await
        }

        async fn edit_message(
            &self,
            channel_id: &str,
            message_id: &str,
            post: &Post,
        ) -> Result<bool> {
            self.inner.delete_message(channel_id, message_id);
            self.inner.edit_message(channel_id, message_id, post).await
        }

        async fn fetch_message(
            &self,
            channel_id: &str,
            message_id: &str,
        ) -> Result<Option<crate::platform::PostedMessage>> {
            self.inner.fetch_message(channel_id, message_id).await
        }

        async fn user_profile(&self, user_id: &str) -> Result<crate::platform::UserProfile> {
            self.inner.user_profile(user_id).await
        }
    }

    #[tokio::test]
    async fn test_panel_deleted_during_edit_is_recreated() {
        let (_, mock, store) = setup();
        let sync = LeaderboardSync::new(
            store.clone(),
            Arc::new(VanishingPanels {
                inner: mock.clone(),
            }),
        );

        let first = sync.sync("g", MatchType::OneVsOne).await.unwrap();
        assert_eq!(first.action, PanelAction::Created);

        let second = sync.sync("g", MatchType::OneVsOne).await.unwrap();
        assert_eq!(second.action, PanelAction::Recreated);
        assert_ne!(second.message_id, first.message_id);
        assert_eq!(mock.live_message_count("lb"), 1);
        assert!(mock.message("lb", &second.message_id).is_some());
        assert_eq!(
            store
                .settings("g")
                .unwrap()
                .leaderboard_message_id(MatchType::OneVsOne),
            Some(&second.message_id)
        );
    }

    #[tokio::test]
    async fn test_sync_all_attempts_every_mode() {
        let (sync, platform, store) = setup();
        sync.sync_all("g").await.unwrap();
        let panel_2v2 = store
            .settings("g")
            .unwrap()
            .leaderboard_message_id(MatchType::TwoVsTwo)
            .cloned()
            .unwrap();

        // Forget the 1v1 panel so that mode has to post, then make posting fail
        store
            .update_settings("g", |s| {
                s.leaderboard_message_ids.insert(MatchType::OneVsOne, None);
            })
            .unwrap();
        platform.fail("send_message");

        let err = sync.sync_all("g").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalCallFailure);

        let edits = platform.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].1, panel_2v2);
    }

    #[tokio::test]
    async fn test_modes_have_separate_panels() {
        let (sync, platform, _store) = setup();
        let results = sync.sync_all("g").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_ne!(results[0].message_id, results[1].message_id);
        assert_eq!(platform.live_message_count("lb"), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_without_posting() {
        let (sync, platform, _store) = setup();
        sync.sync("g", MatchType::OneVsOne).await.unwrap();
        platform.fail("fetch_message");

        let err = sync.sync("g", MatchType::OneVsOne).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalCallFailure);
        assert_eq!(platform.sent_to("lb").len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_syncs_post_one_panel() {
        let (sync, platform, _store) = setup();
        let sync = Arc::new(sync);

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let sync = sync.clone();
                tokio::spawn(async move { sync.sync("g", MatchType::OneVsOne).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(platform.sent_to("lb").len(), 1);
        assert_eq!(platform.edits().len(), 4);
    }
}
