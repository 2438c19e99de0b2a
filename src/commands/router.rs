//! Command/event router
//!
//! Checks who may run a command, calls the owning component and renders the
//! reply. Side posts (log channel, dodge alerts, leaderboard refreshes) are
//! best-effort: failures are logged and never change the reply.

use crate::commands::render;
use crate::commands::reply::Reply;
use crate::commands::{Audience, Command, Invocation};
use crate::error::{RankedError, Result};
use crate::leaderboard::{LeaderboardSync, DEFAULT_LEADERBOARD_SIZE, EMPTY_LEADERBOARD};
use crate::matches::{MatchManager, Requester, DEFAULT_DELETION_DELAY};
use crate::metrics::MetricsCollector;
use crate::platform::{Panel, Platform, Post};
use crate::rating::RatingEngine;
use crate::store::Store;
use crate::types::{MatchType, MAX_HOST_ROLES};
use crate::utils::{mention_channel, mention_role};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Largest `/addelo`, `/removeelo` and `/adjustrecord` amount
pub const MAX_ADJUSTMENT: i64 = 1000;

const HOSTS_ONLY: &str = "Only hosts can use this command.";
const ADMINS_ONLY: &str = "Only administrators can use this command.";

/// Tunables the router passes on to its components
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub deletion_delay: Duration,
    pub leaderboard_size: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            deletion_delay: DEFAULT_DELETION_DELAY,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }
}

/// Routes invocations to the rating engine, match manager and leaderboard
pub struct CommandRouter {
    store: Arc<Store>,
    platform: Arc<dyn Platform>,
    rating: RatingEngine,
    matches: MatchManager,
    leaderboard: LeaderboardSync,
    metrics_collector: Arc<MetricsCollector>,
}

impl CommandRouter {
    pub fn new(
        store: Arc<Store>,
        platform: Arc<dyn Platform>,
        metrics_collector: Arc<MetricsCollector>,
        settings: RouterSettings,
    ) -> Self {
        let rating = RatingEngine::with_metrics(store.clone(), metrics_collector.clone());
        let matches =
            MatchManager::with_metrics(store.clone(), platform.clone(), metrics_collector.clone())
                .with_deletion_delay(settings.deletion_delay);
        let leaderboard =
            LeaderboardSync::with_metrics(store.clone(), platform.clone(), metrics_collector.clone())
                .with_limit(settings.leaderboard_size);

        Self {
            store,
            platform,
            rating,
            matches,
            leaderboard,
            metrics_collector,
        }
    }

    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    pub fn matches(&self) -> &MatchManager {
        &self.matches
    }

    pub fn leaderboard(&self) -> &LeaderboardSync {
        &self.leaderboard
    }

    /// Run an invocation; failures become ephemeral replies
    pub async fn dispatch(&self, invocation: Invocation) -> Reply {
        let timer = self.metrics_collector.start_timer();
        let name = invocation.command.name();

        let result = self.handle(&invocation).await;
        let elapsed = timer.stop();
        self.metrics_collector
            .record_command(name, result.is_ok(), elapsed);

        match result {
            Ok(reply) => {
                debug!(
                    "Handled '{}' for '{}' in guild '{}' in {:.2}ms",
                    name,
                    invocation.user_id,
                    invocation.guild_id,
                    elapsed.as_secs_f64() * 1000.0
                );
                reply
            }
            Err(e) => match e.user_message() {
                Some(message) => {
                    info!(
                        "Rejected '{}' from '{}' in guild '{}': {}",
                        name, invocation.user_id, invocation.guild_id, e
                    );
                    Reply::error(message)
                }
                None => {
                    error!(
                        "Command '{}' from '{}' in guild '{}' failed: {}",
                        name, invocation.user_id, invocation.guild_id, e
                    );
                    Reply::error(failure_message(&invocation.command))
                }
            },
        }
    }

    /// Run an invocation, surfacing errors to the caller
    pub async fn handle(&self, invocation: &Invocation) -> Result<Reply> {
        self.authorize(invocation).await?;

        let guild_id = invocation.guild_id.as_str();
        let caller = invocation.requester();
        let requester = caller.id();

        match &invocation.command {
            Command::Setup => {
                let (panel, buttons) = render::setup_panel();
                Ok(Reply::panel(panel).with_buttons(buttons))
            }
            Command::SetHosts { role_ids } => self.set_hosts(guild_id, role_ids),
            Command::SetCategory {
                channel_id,
                is_category,
            } => {
                if !is_category {
                    return Err(RankedError::InvalidInput {
                        reason: "Please select a category channel, not a text channel."
                            .to_string(),
                    });
                }
                self.store.update_settings(guild_id, |settings| {
                    settings.match_category_id = Some(channel_id.clone())
                })?;
                info!("Match category for guild '{}' set to '{}'", guild_id, channel_id);
                Ok(Reply::panel(render::confirmation_panel(
                    "Category Set",
                    format!(
                        "Match channels will now be created in {}",
                        mention_channel(channel_id)
                    ),
                ))
                .ephemeral())
            }
            Command::SetLogChannel { channel_id } => {
                self.store.update_settings(guild_id, |settings| {
                    settings.log_channel_id = Some(channel_id.clone())
                })?;
                info!("Log channel for guild '{}' set to '{}'", guild_id, channel_id);
                Ok(Reply::panel(render::confirmation_panel(
                    "Log Channel Set",
                    format!(
                        "Match results will now be logged to {}",
                        mention_channel(channel_id)
                    ),
                ))
                .ephemeral())
            }
            Command::SetLeaderboardChannel { channel_id } => {
                self.set_leaderboard_channel(guild_id, channel_id).await
            }
            Command::SetDodgeChannel { channel_id } => {
                self.store.update_settings(guild_id, |settings| {
                    settings.dodge_channel_id = Some(channel_id.clone())
                })?;
                info!("Dodge channel for guild '{}' set to '{}'", guild_id, channel_id);
                Ok(Reply::panel(render::confirmation_panel(
                    "Dodge Channel Set",
                    format!(
                        "Dodge alerts will now be posted to {}",
                        mention_channel(channel_id)
                    ),
                ))
                .ephemeral())
            }
            Command::ViewHosts => {
                let settings = self.store.settings(guild_id)?;
                Ok(Reply::panel(render::host_roles_panel(&settings.host_role_ids)).ephemeral())
            }
            Command::Stats { player_id } => {
                let player_id = player_id.as_deref().unwrap_or(requester);
                self.stats(guild_id, player_id, &caller).await
            }
            Command::EloLeaderboard { mode } => {
                let mode = mode.unwrap_or(MatchType::OneVsOne);
                let (panel, standings) = self.leaderboard.panel(guild_id, mode)?;
                if standings.is_empty() {
                    return Ok(Reply::error(EMPTY_LEADERBOARD));
                }
                Ok(Reply::panel(panel))
            }
            Command::StartMatch { match_type } => {
                let opened = self.matches.start(guild_id, *match_type, requester).await?;
                Ok(Reply::text(render::match_created_message(
                    *match_type,
                    &opened.room_id,
                ))
                .ephemeral())
            }
            Command::Add { user_id } => {
                let added = self
                    .matches
                    .add_participant(guild_id, &invocation.channel_id, &caller, user_id)
                    .await?;
                Ok(Reply::panel(render::user_added_panel(
                    user_id,
                    added.newly_added,
                )))
            }
            Command::Close => {
                let closed = self
                    .matches
                    .close(guild_id, &invocation.channel_id, &caller)
                    .await?;
                // Dropping the handle leaves the deletion running
                Ok(Reply::panel(render::match_closed_panel(
                    closed.deletion.delay().as_secs(),
                )))
            }
            Command::Win { user_id } => self.report(guild_id, user_id, requester, true).await,
            Command::Lose { user_id } => self.report(guild_id, user_id, requester, false).await,
            Command::SetStreak {
                user_id,
                kind,
                count,
            } => {
                let count = u32::try_from(*count).map_err(|_| RankedError::InvalidInput {
                    reason: "Auto streak count must be between 0 and 100".to_string(),
                })?;
                let record = self.rating.set_auto_streak(guild_id, user_id, *kind, count)?;
                Ok(Reply::panel(render::auto_streak_panel(&record, *kind, count)).ephemeral())
            }
            Command::ClearStreak { user_id } => {
                self.rating.clear_all_streaks(guild_id, user_id)?;
                Ok(Reply::panel(render::streaks_cleared_panel(user_id)).ephemeral())
            }
            Command::AddElo {
                user_id,
                amount,
                mode,
            } => {
                check_amount(*amount, false)?;
                self.adjust_elo(guild_id, user_id, *amount, *mode).await
            }
            Command::RemoveElo {
                user_id,
                amount,
                mode,
            } => {
                check_amount(*amount, false)?;
                self.adjust_elo(guild_id, user_id, -*amount, *mode).await
            }
            Command::AdjustRecord {
                user_id,
                field,
                amount,
            } => {
                check_amount(*amount, true)?;
                let (record, _) = self
                    .rating
                    .adjust_counters(guild_id, user_id, *field, *amount)?;
                Ok(Reply::panel(render::record_adjusted_panel(
                    &record, *field, *amount,
                )))
            }
            Command::Dodge { user_id } => self.dodge(guild_id, user_id, requester).await,
            Command::UpdateLeaderboard { mode } => {
                let results = match mode {
                    Some(mode) => vec![self.leaderboard.sync(guild_id, *mode).await?],
                    None => self.leaderboard.sync_all(guild_id).await?,
                };
                Ok(Reply::text(render::leaderboard_synced_message(&results)).ephemeral())
            }
        }
    }

    async fn authorize(&self, invocation: &Invocation) -> Result<()> {
        let guild_id = invocation.guild_id.as_str();
        let requester = invocation.requester();

        match invocation.command.audience() {
            Audience::Everyone => Ok(()),
            Audience::Administrators => {
                if requester
                    .is_administrator(self.platform.as_ref(), guild_id)
                    .await?
                {
                    Ok(())
                } else {
                    Err(RankedError::forbidden(ADMINS_ONLY))
                }
            }
            Audience::Hosts => {
                if self.matches.is_host(guild_id, &requester).await? {
                    Ok(())
                } else {
                    Err(RankedError::forbidden(HOSTS_ONLY))
                }
            }
        }
    }

    fn set_hosts(&self, guild_id: &str, role_ids: &[String]) -> Result<Reply> {
        let mut roles: Vec<String> = Vec::with_capacity(MAX_HOST_ROLES);
        for role_id in role_ids {
            if roles.len() == MAX_HOST_ROLES {
                break;
            }
            if !roles.contains(role_id) {
                roles.push(role_id.clone());
            }
        }
        if roles.is_empty() {
            return Err(RankedError::InvalidInput {
                reason: "At least one host role is required.".to_string(),
            });
        }

        self.store.update_settings(guild_id, |settings| {
            settings.host_role_ids = roles.clone()
        })?;
        info!("Host roles for guild '{}' set to {:?}", guild_id, roles);

        let mentions = roles
            .iter()
            .map(|id| mention_role(id))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Reply::panel(render::confirmation_panel(
            "Host Roles Updated",
            format!("The following roles can now manage matches:\n{}", mentions),
        ))
        .ephemeral())
    }

    async fn set_leaderboard_channel(&self, guild_id: &str, channel_id: &str) -> Result<Reply> {
        self.store.update_settings(guild_id, |settings| {
            if settings.leaderboard_channel_id.as_deref() != Some(channel_id) {
                settings.leaderboard_message_ids.clear();
            }
            settings.leaderboard_channel_id = Some(channel_id.to_string());
        })?;
        info!(
            "Leaderboard channel for guild '{}' set to '{}'",
            guild_id, channel_id
        );

        self.refresh_leaderboards(guild_id).await;

        Ok(Reply::panel(render::confirmation_panel(
            "Leaderboard Channel Set",
            format!(
                "ELO leaderboards will now be posted in {}",
                mention_channel(channel_id)
            ),
        ))
        .ephemeral())
    }

    async fn stats(
        &self,
        guild_id: &str,
        player_id: &str,
        requester: &Requester,
    ) -> Result<Reply> {
        let record = self.rating.stats(guild_id, player_id)?;

        let (display_name, avatar_url) = match self.platform.user_profile(player_id).await {
            Ok(profile) => (profile.display_name, profile.avatar_url),
            Err(e) => {
                warn!("Could not resolve profile for '{}': {}", player_id, e);
                self.metrics_collector.record_external_failure("user_profile");
                (player_id.to_string(), None)
            }
        };

        let show_auto_streaks = self.matches.is_host(guild_id, requester).await?;
        Ok(Reply::panel(render::stats_panel(
            &record,
            &display_name,
            avatar_url,
            show_auto_streaks,
        )))
    }

    async fn report(
        &self,
        guild_id: &str,
        user_id: &str,
        reporter: &str,
        reported_won: bool,
    ) -> Result<Reply> {
        let report = self.rating.report_outcome(guild_id, user_id, reported_won)?;

        let settings = self.store.settings(guild_id)?;
        if let Some(log_channel) = settings.log_channel_id.as_deref() {
            self.post_best_effort(
                log_channel,
                render::outcome_log_panel(&report, reporter),
                "match result",
            )
            .await;
        }

        Ok(Reply::panel(render::outcome_panel(&report)))
    }

    async fn adjust_elo(
        &self,
        guild_id: &str,
        user_id: &str,
        amount: i64,
        mode: Option<MatchType>,
    ) -> Result<Reply> {
        let mode = mode.unwrap_or(MatchType::OneVsOne);
        let adjustment = self.rating.adjust_elo(guild_id, user_id, mode, amount)?;

        self.refresh_leaderboards(guild_id).await;

        Ok(Reply::panel(render::elo_adjustment_panel(&adjustment, amount)))
    }

    async fn dodge(&self, guild_id: &str, user_id: &str, reporter: &str) -> Result<Reply> {
        let record = self.rating.record_dodge(guild_id, user_id)?;
        let panel = render::dodge_panel(&record, reporter);

        let settings = self.store.settings(guild_id)?;
        if let Some(dodge_channel) = settings.dodge_channel_id.as_deref() {
            self.post_best_effort(dodge_channel, panel.clone(), "dodge alert")
                .await;
        }

        Ok(Reply::panel(panel))
    }

    /// Re-sync both panels if a leaderboard channel is configured
    async fn refresh_leaderboards(&self, guild_id: &str) {
        let configured = match self.store.settings(guild_id) {
            Ok(settings) => settings.leaderboard_channel_id.is_some(),
            Err(e) => {
                warn!("Could not read settings for guild '{}': {}", guild_id, e);
                false
            }
        };
        if !configured {
            return;
        }

        if let Err(e) = self.leaderboard.sync_all(guild_id).await {
            warn!(
                "Leaderboard refresh for guild '{}' failed: {}",
                guild_id, e
            );
        }
    }

    async fn post_best_effort(&self, channel_id: &str, panel: Panel, what: &str) {
        if let Err(e) = self
            .platform
            .send_message(channel_id, &Post::panel(panel))
            .await
        {
            warn!("Failed to post {} to '{}': {}", what, channel_id, e);
            self.metrics_collector.record_external_failure("send_message");
        }
    }
}

/// Validate a host-entered amount; zero only makes sense for signed fields
fn check_amount(amount: i64, signed: bool) -> Result<()> {
    let in_range = if signed {
        amount != 0 && amount.abs() <= MAX_ADJUSTMENT
    } else {
        (1..=MAX_ADJUSTMENT).contains(&amount)
    };
    if in_range {
        Ok(())
    } else {
        Err(RankedError::InvalidInput {
            reason: format!("Amount must be between 1 and {}.", MAX_ADJUSTMENT),
        })
    }
}

fn failure_message(command: &Command) -> &'static str {
    match command {
        Command::StartMatch { .. } => {
            "Failed to create match. Please try again or contact an administrator."
        }
        Command::Add { .. } => "Failed to add user to this match.",
        _ => "Something went wrong while handling this command. Please try again later.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::PanelAction;
    use crate::matches::MemberAccess;
    use crate::platform::MockPlatform;
    use crate::types::{AutoStreakKind, CounterField};

    const GUILD: &str = "g";
    const ADMIN: &str = "admin";
    const HOST: &str = "host";
    const PLAYER: &str = "player";

    fn setup() -> (CommandRouter, Arc<MockPlatform>, Arc<Store>) {
        let store = Arc::new(Store::in_memory());
        store
            .update_settings(GUILD, |s| s.host_role_ids = vec!["hosts".to_string()])
            .unwrap();
        let platform = Arc::new(
            MockPlatform::new()
                .with_admin(GUILD, ADMIN)
                .with_role(GUILD, HOST, "hosts")
                .with_profile(PLAYER, "Player"),
        );
        let router = CommandRouter::new(
            store.clone(),
            platform.clone(),
            Arc::new(MetricsCollector::default()),
            RouterSettings {
                deletion_delay: Duration::from_millis(10),
                leaderboard_size: 10,
            },
        );
        (router, platform, store)
    }

    fn invoke(user: &str, command: Command) -> Invocation {
        Invocation::new(GUILD, "general", user, command)
    }

    #[tokio::test]
    async fn test_admin_commands_reject_players() {
        let (router, _, store) = setup();
        let reply = router
            .dispatch(invoke(
                PLAYER,
                Command::SetLogChannel {
                    channel_id: "logs".to_string(),
                },
            ))
            .await;
        assert!(reply.ephemeral);
        assert_eq!(reply.content.as_deref(), Some(ADMINS_ONLY));
        assert!(store.settings(GUILD).unwrap().log_channel_id.is_none());
    }

    #[tokio::test]
    async fn test_host_commands_reject_players() {
        let (router, _, store) = setup();
        let reply = router
            .dispatch(invoke(
                PLAYER,
                Command::Win {
                    user_id: PLAYER.to_string(),
                },
            ))
            .await;
        assert_eq!(reply.content.as_deref(), Some(HOSTS_ONLY));
        assert_eq!(store.player(GUILD, PLAYER).unwrap().wins, 0);
    }

    #[tokio::test]
    async fn test_set_hosts_dedupes_and_caps() {
        let (router, _, store) = setup();
        let reply = router
            .dispatch(invoke(
                ADMIN,
                Command::SetHosts {
                    role_ids: vec!["a".into(), "a".into(), "b".into(), "c".into(), "d".into()],
                },
            ))
            .await;
        let panel = reply.panel.unwrap();
        assert_eq!(panel.title, "Host Roles Updated");
        assert_eq!(
            panel.description.as_deref(),
            Some("The following roles can now manage matches:\n<@&a>, <@&b>, <@&c>")
        );
        assert_eq!(
            store.settings(GUILD).unwrap().host_role_ids,
            vec!["a", "b", "c"]
        );
    }

    #[tokio::test]
    async fn test_set_category_requires_category() {
        let (router, _, store) = setup();
        let reply = router
            .dispatch(invoke(
                ADMIN,
                Command::SetCategory {
                    channel_id: "text".to_string(),
                    is_category: false,
                },
            ))
            .await;
        assert_eq!(
            reply.content.as_deref(),
            Some("Please select a category channel, not a text channel.")
        );
        assert!(store.settings(GUILD).unwrap().match_category_id.is_none());
    }

    #[tokio::test]
    async fn test_win_posts_to_log_channel() {
        let (router, platform, store) = setup();
        store
            .update_settings(GUILD, |s| s.log_channel_id = Some("logs".to_string()))
            .unwrap();

        let reply = router
            .dispatch(invoke(
                HOST,
                Command::Win {
                    user_id: PLAYER.to_string(),
                },
            ))
            .await;
        assert_eq!(reply.panel.unwrap().title, "Win Recorded");
        assert!(!reply.ephemeral);

        let logged = platform.sent_to("logs");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].panel.as_ref().unwrap().title, "Match Result");
    }

    #[tokio::test]
    async fn test_log_failure_does_not_change_reply() {
        let (router, platform, store) = setup();
        store
            .update_settings(GUILD, |s| s.log_channel_id = Some("logs".to_string()))
            .unwrap();
        platform.fail("send_message");

        let reply = router
            .dispatch(invoke(
                HOST,
                Command::Lose {
                    user_id: PLAYER.to_string(),
                },
            ))
            .await;
        assert_eq!(reply.panel.unwrap().title, "Loss Recorded");
        assert_eq!(store.player(GUILD, PLAYER).unwrap().losses, 1);
    }

    #[tokio::test]
    async fn test_set_streak_range() {
        let (router, _, store) = setup();
        let reply = router
            .dispatch(invoke(
                HOST,
                Command::SetStreak {
                    user_id: PLAYER.to_string(),
                    kind: AutoStreakKind::Win,
                    count: 101,
                },
            ))
            .await;
        assert!(reply.ephemeral);
        assert!(reply.panel.is_none());
        assert_eq!(store.player(GUILD, PLAYER).unwrap().auto_win_streak, 0);

        let reply = router
            .dispatch(invoke(
                HOST,
                Command::SetStreak {
                    user_id: PLAYER.to_string(),
                    kind: AutoStreakKind::Win,
                    count: 3,
                },
            ))
            .await;
        assert_eq!(reply.panel.unwrap().title, "Streak Updated");
        assert_eq!(store.player(GUILD, PLAYER).unwrap().auto_win_streak, 3);
    }

    #[tokio::test]
    async fn test_remove_elo_floors_and_refreshes_leaderboard() {
        let (router, platform, store) = setup();
        store
            .update_settings(GUILD, |s| s.leaderboard_channel_id = Some("lb".to_string()))
            .unwrap();

        let reply = router
            .dispatch(invoke(
                HOST,
                Command::RemoveElo {
                    user_id: PLAYER.to_string(),
                    amount: 1000,
                    mode: None,
                },
            ))
            .await;
        let panel = reply.panel.unwrap();
        assert_eq!(panel.title, "ELO Removed");
        assert_eq!(panel.field_value("New 1v1 ELO"), Some("0"));
        assert_eq!(store.player(GUILD, PLAYER).unwrap().elo_1v1, 0);

        // One panel per mode
        assert_eq!(platform.live_message_count("lb"), 2);
    }

    #[tokio::test]
    async fn test_elo_amount_bounds() {
        let (router, _, store) = setup();
        for amount in [0, 1001, -5] {
            let reply = router
                .dispatch(invoke(
                    HOST,
                    Command::AddElo {
                        user_id: PLAYER.to_string(),
                        amount,
                        mode: Some(MatchType::TwoVsTwo),
                    },
                ))
                .await;
            assert!(reply.ephemeral, "amount {} should be rejected", amount);
        }
        assert_eq!(store.player(GUILD, PLAYER).unwrap().elo_2v2, 800);
    }

    #[tokio::test]
    async fn test_adjust_record() {
        let (router, _, store) = setup();
        store.update_player(GUILD, PLAYER, |r| r.wins = 4).unwrap();
        let reply = router
            .dispatch(invoke(
                HOST,
                Command::AdjustRecord {
                    user_id: PLAYER.to_string(),
                    field: CounterField::Wins,
                    amount: -10,
                },
            ))
            .await;
        assert_eq!(
            reply.panel.unwrap().field_value("New Record"),
            Some("0W - 0L")
        );
        assert_eq!(store.player(GUILD, PLAYER).unwrap().wins, 0);
    }

    #[tokio::test]
    async fn test_dodge_alert() {
        let (router, platform, store) = setup();
        store
            .update_settings(GUILD, |s| s.dodge_channel_id = Some("dodges".to_string()))
            .unwrap();

        let reply = router
            .dispatch(invoke(
                HOST,
                Command::Dodge {
                    user_id: PLAYER.to_string(),
                },
            ))
            .await;
        assert_eq!(reply.panel.unwrap().field_value("Total Dodges"), Some("1"));
        assert_eq!(platform.sent_to("dodges").len(), 1);
    }

    #[tokio::test]
    async fn test_stats_hides_auto_streaks_from_players() {
        let (router, _, _) = setup();
        let reply = router
            .dispatch(invoke(PLAYER, Command::Stats { player_id: None }))
            .await;
        let panel = reply.panel.unwrap();
        assert_eq!(panel.title, "🥉 Stats for Player");
        assert!(panel.field_value("Auto Win Streak").is_none());

        let reply = router
            .dispatch(invoke(
                HOST,
                Command::Stats {
                    player_id: Some(PLAYER.to_string()),
                },
            ))
            .await;
        assert!(reply.panel.unwrap().field_value("Auto Win Streak").is_some());
    }

    #[tokio::test]
    async fn test_empty_leaderboard() {
        let (router, _, _) = setup();
        let reply = router
            .dispatch(invoke(PLAYER, Command::EloLeaderboard { mode: None }))
            .await;
        assert!(reply.ephemeral);
        assert_eq!(reply.content.as_deref(), Some(EMPTY_LEADERBOARD));
    }

    #[tokio::test]
    async fn test_start_match_failure_message() {
        let (router, platform, store) = setup();
        platform.fail("create_room");
        let reply = router
            .dispatch(invoke(
                PLAYER,
                Command::StartMatch {
                    match_type: MatchType::OneVsOne,
                },
            ))
            .await;
        assert_eq!(
            reply.content.as_deref(),
            Some("Failed to create match. Please try again or contact an administrator.")
        );
        assert_eq!(store.counts().unwrap().active_matches, 0);
    }

    #[tokio::test]
    async fn test_match_room_flow() {
        let (router, platform, store) = setup();
        let reply = router
            .dispatch(invoke(
                PLAYER,
                Command::StartMatch {
                    match_type: MatchType::TwoVsTwo,
                },
            ))
            .await;
        assert!(reply.ephemeral);
        let room_id = platform.rooms().keys().next().cloned().unwrap();
        assert_eq!(
            reply.content.as_deref(),
            Some(format!("Your 2v2 ranked match has been created: <#{}>", room_id).as_str())
        );

        let in_room = |user: &str, command| Invocation::new(GUILD, &room_id, user, command);

        let reply = router
            .dispatch(in_room(
                PLAYER,
                Command::Add {
                    user_id: "friend".to_string(),
                },
            ))
            .await;
        assert_eq!(reply.panel.unwrap().title, "User Added");

        let reply = router.dispatch(in_room(PLAYER, Command::Close)).await;
        assert_eq!(reply.content.as_deref(), Some("Only hosts can close matches."));

        let reply = router.dispatch(in_room(HOST, Command::Close)).await;
        assert_eq!(reply.panel.unwrap().title, "Match Closed");
        assert!(store.room(&room_id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_leaderboard_reports_actions() {
        let (router, _, store) = setup();
        store
            .update_settings(GUILD, |s| s.leaderboard_channel_id = Some("lb".to_string()))
            .unwrap();

        let reply = router
            .dispatch(invoke(
                HOST,
                Command::UpdateLeaderboard {
                    mode: Some(MatchType::TwoVsTwo),
                },
            ))
            .await;
        assert_eq!(
            reply.content.as_deref(),
            Some("2v2 leaderboard created in <#lb>.")
        );

        let results = router.leaderboard().sync_all(GUILD).await.unwrap();
        assert_eq!(results[0].action, PanelAction::Created);
        assert_eq!(results[1].action, PanelAction::Edited);
    }

    #[tokio::test]
    async fn test_changing_leaderboard_channel_clears_ids() {
        let (router, platform, store) = setup();
        store
            .update_settings(GUILD, |s| s.leaderboard_channel_id = Some("old".to_string()))
            .unwrap();
        router.leaderboard().sync_all(GUILD).await.unwrap();

        router
            .dispatch(invoke(
                ADMIN,
                Command::SetLeaderboardChannel {
                    channel_id: "new".to_string(),
                },
            ))
            .await;

        assert_eq!(platform.live_message_count("new"), 2);
        let settings = store.settings(GUILD).unwrap();
        for mode in MatchType::ALL {
            let id = settings.leaderboard_message_id(mode).unwrap();
            assert!(platform.message("new", id).is_some());
        }
    }

    #[tokio::test]
    async fn test_interaction_access_avoids_platform_lookups() {
        let (router, platform, store) = setup();
        platform.fail("is_administrator");
        platform.fail("has_role");

        let host = MemberAccess {
            is_administrator: false,
            role_ids: vec!["hosts".to_string()],
        };
        let reply = router
            .dispatch(
                invoke(
                    "someone",
                    Command::Win {
                        user_id: PLAYER.to_string(),
                    },
                )
                .with_access(Some(host)),
            )
            .await;
        assert_eq!(reply.panel.unwrap().title, "Win Recorded");

        let admin = MemberAccess {
            is_administrator: true,
            role_ids: Vec::new(),
        };
        router
            .dispatch(
                invoke(
                    "owner",
                    Command::SetLogChannel {
                        channel_id: "logs".to_string(),
                    },
                )
                .with_access(Some(admin)),
            )
            .await;
        assert_eq!(
            store.settings(GUILD).unwrap().log_channel_id.as_deref(),
            Some("logs")
        );

        let reply = router
            .dispatch(
                invoke(
                    PLAYER,
                    Command::Dodge {
                        user_id: HOST.to_string(),
                    },
                )
                .with_access(Some(MemberAccess::default())),
            )
            .await;
        assert_eq!(reply.content.as_deref(), Some(HOSTS_ONLY));
    }

    #[tokio::test]
    async fn test_reply_visibility_matches_command() {
        let (router, _, store) = setup();
        store
            .update_settings(GUILD, |s| s.leaderboard_channel_id = Some("lb".to_string()))
            .unwrap();

        let commands = vec![
            (ADMIN, Command::Setup),
            (ADMIN, Command::SetDodgeChannel { channel_id: "d".to_string() }),
            (PLAYER, Command::ViewHosts),
            (PLAYER, Command::Stats { player_id: None }),
            (PLAYER, Command::StartMatch { match_type: MatchType::OneVsOne }),
            (HOST, Command::Win { user_id: PLAYER.to_string() }),
            (HOST, Command::ClearStreak { user_id: PLAYER.to_string() }),
            (
                HOST,
                Command::AddElo {
                    user_id: PLAYER.to_string(),
                    amount: 10,
                    mode: None,
                },
            ),
            (HOST, Command::Dodge { user_id: PLAYER.to_string() }),
            (PLAYER, Command::EloLeaderboard { mode: None }),
            (HOST, Command::UpdateLeaderboard { mode: None }),
        ];
        for (user, command) in commands {
            let expected = command.replies_ephemerally();
            let name = command.name();
            let reply = router.dispatch(invoke(user, command)).await;
            assert!(reply.content.is_some() || reply.panel.is_some());
            assert_eq!(reply.ephemeral, expected, "visibility of '{}'", name);
        }
    }

    #[tokio::test]
    async fn test_dispatch_records_command_duration() {
        let (router, _, _) = setup();
        router.dispatch(invoke(PLAYER, Command::ViewHosts)).await;

        let text = router.metrics_collector.encode_text().unwrap();
        assert!(text.contains(
            "ranked_room_command_duration_seconds_count{command=\"viewhosts\"} 1"
        ));
        assert!(text.contains(
            "ranked_room_commands_total{command=\"viewhosts\",status=\"success\"} 1"
        ));
    }
}
