//! Match lifecycle manager
//!
//! Opens private rooms on request, admits participants and closes rooms.
//! A room's state is NONE -> OPEN (recorded in the store) -> CLOSED (record
//! removed, external room deleted after a grace delay).

use crate::error::{RankedError, Result};
use crate::matches::access::{is_host, Requester};
use crate::matches::scheduler::{schedule_deletion, ScheduledDeletion};
use crate::metrics::MetricsCollector;
use crate::platform::{Panel, Platform, Post, RoomRequest};
use crate::store::Store;
use crate::types::{MatchRoom, MatchType, MessageId, RoomId};
use crate::utils::{mention_role, mention_user};
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default grace period between closing a match and deleting its room
pub const DEFAULT_DELETION_DELAY: Duration = Duration::from_secs(5);

const WELCOME_COLOR: u32 = 0x8B0000;

/// A freshly opened match
#[derive(Debug, Clone)]
pub struct OpenedMatch {
    pub room_id: RoomId,
    pub room_name: String,
    pub room: MatchRoom,
    /// Welcome message, if posting it succeeded
    pub welcome_message_id: Option<MessageId>,
}

/// Outcome of admitting a participant
#[derive(Debug, Clone)]
pub struct ParticipantAdded {
    pub room: MatchRoom,
    /// False if the user was already a participant
    pub newly_added: bool,
}

/// A closed match with its pending room deletion
#[derive(Debug)]
pub struct ClosedMatch {
    pub room_id: RoomId,
    pub room: MatchRoom,
    pub deletion: ScheduledDeletion,
}

/// The match lifecycle manager
#[derive(Clone)]
pub struct MatchManager {
    store: Arc<Store>,
    platform: Arc<dyn Platform>,
    metrics_collector: Arc<MetricsCollector>,
    deletion_delay: Duration,
}

impl MatchManager {
    /// Create a new match manager
    pub fn new(store: Arc<Store>, platform: Arc<dyn Platform>) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(store, platform, metrics_collector)
    }

    /// Create a new match manager with metrics collector
    pub fn with_metrics(
        store: Arc<Store>,
        platform: Arc<dyn Platform>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            platform,
            metrics_collector,
            deletion_delay: DEFAULT_DELETION_DELAY,
        }
    }

    /// Override the grace period before closed rooms are deleted
    pub fn with_deletion_delay(mut self, delay: Duration) -> Self {
        self.deletion_delay = delay;
        self
    }

    pub fn deletion_delay(&self) -> Duration {
        self.deletion_delay
    }

    /// Whether a member may adjudicate matches in a guild
    pub async fn is_host(&self, guild_id: &str, requester: &Requester) -> Result<bool> {
        let settings = self.store.settings(guild_id)?;
        is_host(self.platform.as_ref(), &settings, guild_id, requester).await
    }

    /// Open a private room for a new match
    pub async fn start(
        &self,
        guild_id: &str,
        match_type: MatchType,
        creator_id: &str,
    ) -> Result<OpenedMatch> {
        let start_time = Instant::now();
        let settings = self.store.settings(guild_id)?;

        if settings.host_role_ids.is_empty() {
            return Err(RankedError::ConfigurationError {
                message: "Host roles have not been configured. An administrator needs to use /sethosts first.".to_string(),
            });
        }

        info!(
            "Opening {} match for '{}' in guild '{}'",
            match_type, creator_id, guild_id
        );

        let creator_name = match self.platform.user_profile(creator_id).await {
            Ok(profile) => profile.display_name,
            Err(e) => {
                warn!(
                    "Could not resolve name for '{}', using id: {}",
                    creator_id, e
                );
                self.metrics_collector.record_external_failure("user_profile");
                creator_id.to_string()
            }
        };
        let room_name = format!("{}-{}", match_type, creator_name);

        let room_id = self
            .platform
            .create_room(RoomRequest {
                guild_id: guild_id.to_string(),
                name: room_name.clone(),
                category_id: settings.match_category_id.clone(),
                creator_id: creator_id.to_string(),
                host_role_ids: settings.host_role_ids.clone(),
            })
            .await
            .map_err(|e| {
                error!("Failed to create room '{}': {}", room_name, e);
                self.metrics_collector.record_external_failure("create_room");
                e
            })?;

        let room = MatchRoom::new(match_type, creator_id);
        if let Err(e) = self.store.insert_room(&room_id, room.clone()) {
            error!(
                "Failed to record match room '{}', removing it: {}",
                room_id, e
            );
            if let Err(delete_error) = self.platform.delete_room(&room_id).await {
                warn!(
                    "Failed to remove unrecorded room '{}': {}",
                    room_id, delete_error
                );
                self.metrics_collector.record_external_failure("delete_room");
            }
            return Err(e);
        }

        self.metrics_collector.record_match_opened(match_type);

        let welcome = welcome_post(match_type, creator_id, &settings.host_role_ids);
        let welcome_message_id = match self.platform.send_message(&room_id, &welcome).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to post welcome message in '{}': {}", room_id, e);
                self.metrics_collector.record_external_failure("send_message");
                None
            }
        };

        info!(
            "Opened {} match room '{}' ({}) for '{}' in {:.2}ms",
            match_type,
            room_name,
            room_id,
            creator_id,
            start_time.elapsed().as_secs_f64() * 1000.0
        );

        Ok(OpenedMatch {
            room_id,
            room_name,
            room,
            welcome_message_id,
        })
    }

    /// Give another user access to a room and add them as a participant
    pub async fn add_participant(
        &self,
        guild_id: &str,
        room_id: &str,
        requester: &Requester,
        target_id: &str,
    ) -> Result<ParticipantAdded> {
        let requester_id = requester.id();
        let room = self
            .store
            .room(room_id)?
            .ok_or_else(|| RankedError::not_found("This command can only be used in a match channel."))?;

        if room.creator_id != requester_id && !self.is_host(guild_id, requester).await? {
            warn!(
                "'{}' tried to add '{}' to room '{}' without permission",
                requester_id, target_id, room_id
            );
            return Err(RankedError::forbidden(
                "Only the match creator or hosts can add users.",
            ));
        }

        self.platform
            .grant_access(room_id, target_id)
            .await
            .map_err(|e| {
                error!("Failed to grant '{}' access to '{}': {}", target_id, room_id, e);
                self.metrics_collector.record_external_failure("grant_access");
                e
            })?;

        // The room may have been closed while access was being granted
        let Some((room, newly_added)) = self
            .store
            .update_room(room_id, |room| room.add_participant(target_id))?
        else {
            return Err(RankedError::not_found("This match has already been closed."));
        };

        info!(
            "'{}' added '{}' to room '{}' ({} participants)",
            requester_id,
            target_id,
            room_id,
            room.participants.len()
        );

        Ok(ParticipantAdded { room, newly_added })
    }

    /// Close a match: forget the room now, delete it after the grace delay
    pub async fn close(
        &self,
        guild_id: &str,
        room_id: &str,
        requester: &Requester,
    ) -> Result<ClosedMatch> {
        let requester_id = requester.id();
        if self.store.room(room_id)?.is_none() {
            return Err(RankedError::not_found(
                "This command can only be used in a match channel.",
            ));
        }

        if !self.is_host(guild_id, requester).await? {
            return Err(RankedError::forbidden("Only hosts can close matches."));
        }

        let room = self
            .store
            .remove_room(room_id)?
            .ok_or_else(|| RankedError::not_found("This match has already been closed."))?;

        self.metrics_collector.record_match_closed(room.match_type);

        let deletion = schedule_deletion(
            self.platform.clone(),
            self.metrics_collector.clone(),
            room_id,
            self.deletion_delay,
        );

        info!(
            "'{}' closed {} room '{}'; deleting in {}s",
            requester_id,
            room.match_type,
            room_id,
            self.deletion_delay.as_secs_f64()
        );

        Ok(ClosedMatch {
            room_id: room_id.to_string(),
            room,
            deletion,
        })
    }

    /// Look up an open room
    pub fn room(&self, room_id: &str) -> Result<Option<MatchRoom>> {
        debug!("Room lookup '{}'", room_id);
        self.store.room(room_id)
    }
}

/// Greeting posted into a new room, pinging the creator and the host roles
fn welcome_post(match_type: MatchType, creator_id: &str, host_role_ids: &[String]) -> Post {
    let mut mentions = vec![mention_user(creator_id)];
    mentions.extend(host_role_ids.iter().map(|role| mention_role(role)));

    let panel = Panel::new(format!("{} Ranked Match", match_type), WELCOME_COLOR)
        .description(format!(
            "Welcome {}!\n\nA host will be with you shortly. Please wait for your opponent(s) to join.\n\n\
             **Match Type:** {} ({} players)\n\n\
             **Commands:**\n• `/add @user` - Add someone to this match\n• `/stats` - View your stats",
            mention_user(creator_id),
            match_type,
            match_type.player_count()
        ))
        .footer("Please be patient while waiting for a host");

    Post::panel(panel).with_content(mentions.join(" "))
}
