//! Leaderboard panel rendering

use crate::leaderboard::standings::Standing;
use crate::platform::Panel;
use crate::rating::Tier;
use crate::types::MatchType;
use crate::utils::mention_user;

const LEADERBOARD_COLOR: u32 = 0xFFD700;
const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

pub const EMPTY_LEADERBOARD: &str = "No players have been registered yet!";

/// Medal for the podium, bold number for everyone else
pub fn position_marker(position: usize) -> String {
    match position {
        1..=3 => MEDALS[position - 1].to_string(),
        _ => format!("**{}.**", position),
    }
}

pub fn standing_line(standing: &Standing) -> String {
    format!(
        "{} {} - {} ELO {}",
        position_marker(standing.position),
        mention_user(&standing.user_id),
        standing.elo,
        standing.tier.label()
    )
}

/// Tier bands, highest first
pub fn tier_legend() -> String {
    let mut lines = Vec::new();
    for (index, tier) in Tier::ALL.iter().enumerate().rev() {
        if *tier == Tier::Unranked {
            continue;
        }
        let range = match Tier::ALL.get(index + 1) {
            Some(next) => format!("{}-{}", tier.min_elo(), next.min_elo() - 1),
            None => format!("{}+", tier.min_elo()),
        };
        lines.push(format!("{}: {}", tier.label(), range));
    }
    lines.join("\n")
}

pub fn leaderboard_panel(mode: MatchType, standings: &[Standing], limit: usize) -> Panel {
    let description = if standings.is_empty() {
        EMPTY_LEADERBOARD.to_string()
    } else {
        standings
            .iter()
            .map(standing_line)
            .collect::<Vec<_>>()
            .join("\n")
    };

    Panel::new(
        format!("🏆 {} ELO Leaderboard - Top {}", mode, limit),
        LEADERBOARD_COLOR,
    )
    .description(description)
    .field("📊 Rank Tiers", tier_legend(), false)
    .footer("Each win grants ELO to climb ranks!")
    .timestamp()
}
