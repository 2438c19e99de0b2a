//! Per-mode standings

use crate::error::Result;
use crate::rating::{tier_of, Tier};
use crate::store::Store;
use crate::types::{MatchType, PlayerRecord, UserId};
use serde::Serialize;

/// Number of players shown when no size is configured
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// One row of a leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// 1-based position
    pub position: usize,
    pub user_id: UserId,
    pub elo: u64,
    pub tier: Tier,
}

/// Rank records by one ELO track: highest first, ties by ascending user id
pub fn rank_players(mut players: Vec<PlayerRecord>, mode: MatchType, limit: usize) -> Vec<Standing> {
    players.sort_by(|a, b| {
        b.elo(mode)
            .cmp(&a.elo(mode))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    players
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, record)| {
            let elo = record.elo(mode);
            Standing {
                position: index + 1,
                user_id: record.user_id,
                elo,
                tier: tier_of(elo),
            }
        })
        .collect()
}

/// Top `limit` players of a guild for one mode
pub fn standings(
    store: &Store,
    guild_id: &str,
    mode: MatchType,
    limit: usize,
) -> Result<Vec<Standing>> {
    Ok(rank_players(store.guild_players(guild_id)?, mode, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, elo_1v1: u64, elo_2v2: u64) -> PlayerRecord {
        let mut record = PlayerRecord::new("g", user);
        record.elo_1v1 = elo_1v1;
        record.elo_2v2 = elo_2v2;
        record
    }

    #[test]
    fn test_sorted_by_mode_track() {
        let players = vec![record("a", 900, 1700), record("b", 1300, 800), record("c", 1000, 1000)];

        let one = rank_players(players.clone(), MatchType::OneVsOne, 10);
        let ids: Vec<_> = one.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(one[0].tier, Tier::Gold);

        let two = rank_players(players, MatchType::TwoVsTwo, 10);
        assert_eq!(two[0].user_id, "a");
        assert_eq!(two[0].tier, Tier::Diamond);
        assert_eq!(two[2].position, 3);
    }

    #[test]
    fn test_ties_broken_by_user_id() {
        let players = vec![record("zed", 800, 800), record("amy", 800, 800), record("kim", 800, 800)];
        let ranked = rank_players(players, MatchType::OneVsOne, 10);
        let ids: Vec<_> = ranked.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["amy", "kim", "zed"]);
    }

    #[test]
    fn test_limit_applied() {
        let players = (0..25).map(|i| record(&format!("u{:02}", i), 800 + i, 800)).collect();
        let ranked = rank_players(players, MatchType::OneVsOne, DEFAULT_LEADERBOARD_SIZE);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].user_id, "u24");
    }

    #[test]
    fn test_standings_scoped_to_guild() {
        let store = Store::in_memory();
        store.update_player("g", "a", |r| r.elo_1v1 = 1000).unwrap();
        store.update_player("other", "b", |r| r.elo_1v1 = 2000).unwrap();

        let ranked = standings(&store, "g", MatchType::OneVsOne, 10).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].user_id, "a");
    }
}
