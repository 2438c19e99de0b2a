//! Performance benchmarks for leaderboard standings and outcome reporting

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ranked_room::commands::{Command, CommandRouter, Invocation, RouterSettings};
use ranked_room::leaderboard::{leaderboard_panel, rank_players};
use ranked_room::metrics::MetricsCollector;
use ranked_room::platform::MockPlatform;
use ranked_room::rating::RatingEngine;
use ranked_room::store::Store;
use ranked_room::types::{MatchType, PlayerRecord};
use std::sync::Arc;

fn guild_players(count: u64) -> Vec<PlayerRecord> {
    (0..count)
        .map(|i| {
            let mut record = PlayerRecord::new("bench_guild", &format!("player_{}", i));
            record.elo_1v1 = (i * 7919) % 2400;
            record.elo_2v2 = (i * 104_729) % 2400;
            record
        })
        .collect()
}

fn bench_rank_players(c: &mut Criterion) {
    let players = guild_players(5_000);

    c.bench_function("rank_5000_players_1v1", |b| {
        b.iter(|| black_box(rank_players(players.clone(), MatchType::OneVsOne, 10)))
    });

    let standings = rank_players(players, MatchType::TwoVsTwo, 25);
    c.bench_function("render_leaderboard_panel", |b| {
        b.iter(|| black_box(leaderboard_panel(MatchType::TwoVsTwo, &standings, 25)))
    });
}

fn bench_report_outcome(c: &mut Criterion) {
    let engine = RatingEngine::new(Arc::new(Store::in_memory()));

    c.bench_function("report_outcome", |b| {
        let mut won = false;
        b.iter(|| {
            won = !won;
            black_box(engine.report_outcome("bench_guild", "bench_player", won))
        })
    });
}

fn bench_win_command(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(Store::in_memory());
    store
        .update_settings("bench_guild", |s| s.host_role_ids = vec!["hosts".to_string()])
        .unwrap();
    let platform = Arc::new(MockPlatform::new().with_role("bench_guild", "host", "hosts"));
    let router = CommandRouter::new(
        store,
        platform,
        Arc::new(MetricsCollector::default()),
        RouterSettings::default(),
    );

    c.bench_function("win_command", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(
                    router
                        .dispatch(Invocation::new(
                            "bench_guild",
                            "lobby",
                            "host",
                            Command::Win {
                                user_id: "bench_player".to_string(),
                            },
                        ))
                        .await,
                )
            })
        })
    });
}

criterion_group!(
    benches,
    bench_rank_players,
    bench_report_outcome,
    bench_win_command
);
criterion_main!(benches);
