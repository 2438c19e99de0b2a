//! Concurrency tests for outcome reporting and leaderboard syncs
//!
//! Many interactions for one guild can arrive at once; none of their updates
//! may be lost and the leaderboard must never end up with duplicate panels.

mod fixtures;

use futures::future::join_all;
use ranked_room::commands::Command;
use ranked_room::types::MatchType;
use std::time::Instant;

use fixtures::*;

#[tokio::test]
async fn test_concurrent_reports_for_one_player() {
    let system = TestSystem::new();
    system.configure().await;

    let start = Instant::now();
    let replies = join_all((0..50).map(|_| {
        system.router.dispatch(system.invoke(
            HOST,
            Command::Win {
                user_id: ALICE.to_string(),
            },
        ))
    }))
    .await;
    println!("50 concurrent reports handled in {:?}", start.elapsed());

    assert!(replies.iter().all(|reply| reply.panel.is_some()));
    let record = system.store.player(GUILD, ALICE).unwrap();
    assert_eq!(record.wins, 50);
    assert_eq!(record.current_streak, 50);
    assert_eq!(system.platform.sent_to(LOGS).len(), 50);
}

#[tokio::test]
async fn test_concurrent_reports_for_many_players() {
    let system = TestSystem::new();

    let players: Vec<String> = (0..20).map(|i| format!("player-{}", i)).collect();
    join_all(players.iter().enumerate().map(|(i, player)| {
        let command = if i % 2 == 0 {
            Command::Win {
                user_id: player.clone(),
            }
        } else {
            Command::Lose {
                user_id: player.clone(),
            }
        };
        system.router.dispatch(system.invoke(HOST, command))
    }))
    .await;

    let records = system.store.guild_players(GUILD).unwrap();
    assert_eq!(records.len(), 20);
    assert_eq!(records.iter().map(|r| r.wins).sum::<u32>(), 10);
    assert_eq!(records.iter().map(|r| r.losses).sum::<u32>(), 10);
}

#[tokio::test]
async fn test_concurrent_syncs_never_duplicate_panels() {
    let system = TestSystem::new();
    system
        .store
        .update_settings(GUILD, |settings| {
            settings.leaderboard_channel_id = Some(BOARD.to_string())
        })
        .unwrap();

    let results = join_all((0..10).map(|_| system.router.leaderboard().sync_all(GUILD))).await;
    assert!(results.iter().all(Result::is_ok));

    assert_eq!(system.platform.live_message_count(BOARD), 2);
    assert_eq!(system.platform.sent_to(BOARD).len(), 2);
    for mode in MatchType::ALL {
        assert!(system
            .store
            .settings(GUILD)
            .unwrap()
            .leaderboard_message_id(mode)
            .is_some());
    }
}
