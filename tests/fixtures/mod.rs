//! Shared setup for the integration tests
#![allow(dead_code)]

use ranked_room::commands::{Command, CommandRouter, Invocation, RouterSettings};
use ranked_room::metrics::MetricsCollector;
use ranked_room::platform::MockPlatform;
use ranked_room::store::Store;
use std::sync::Arc;
use std::time::Duration;

pub const GUILD: &str = "guild-1";
pub const ADMIN: &str = "admin";
pub const HOST: &str = "host";
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const HOST_ROLE: &str = "role-hosts";
pub const LOBBY: &str = "lobby";
pub const BOARD: &str = "leaderboards";
pub const LOGS: &str = "match-logs";

/// Router, platform and store for one guild with an admin, a host and two players
pub struct TestSystem {
    pub router: CommandRouter,
    pub platform: Arc<MockPlatform>,
    pub store: Arc<Store>,
}

impl TestSystem {
    pub fn new() -> Self {
        Self::with_store(Arc::new(Store::in_memory()))
    }

    pub fn with_store(store: Arc<Store>) -> Self {
        let platform = Arc::new(
            MockPlatform::new()
                .with_admin(GUILD, ADMIN)
                .with_role(GUILD, HOST, HOST_ROLE)
                .with_profile(ALICE, "Alice")
                .with_profile(BOB, "Bob"),
        );
        let router = CommandRouter::new(
            store.clone(),
            platform.clone(),
            Arc::new(MetricsCollector::default()),
            RouterSettings {
                deletion_delay: Duration::from_millis(20),
                leaderboard_size: 10,
            },
        );
        Self {
            router,
            platform,
            store,
        }
    }

    /// Run the admin commands a guild goes through before its first match
    pub async fn configure(&self) {
        let setup = [
            Command::SetHosts {
                role_ids: vec![HOST_ROLE.to_string()],
            },
            Command::SetLogChannel {
                channel_id: LOGS.to_string(),
            },
            Command::SetLeaderboardChannel {
                channel_id: BOARD.to_string(),
            },
        ];
        for command in setup {
            let reply = self.router.dispatch(self.invoke(ADMIN, command)).await;
            assert!(reply.panel.is_some(), "setup step failed: {:?}", reply.content);
        }
    }

    pub fn invoke(&self, user: &str, command: Command) -> Invocation {
        Invocation::new(GUILD, LOBBY, user, command)
    }

    pub fn invoke_in(&self, channel: &str, user: &str, command: Command) -> Invocation {
        Invocation::new(GUILD, channel, user, command)
    }
}
