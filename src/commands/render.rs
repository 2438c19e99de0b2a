//! Panels shown in command replies and side-channel posts

use crate::leaderboard::PanelUpdateResult;
use crate::platform::{Button, ButtonStyle, Panel};
use crate::rating::{tier_of, EloAdjustment, OutcomeReport};
use crate::types::{AutoStreakKind, CounterField, MatchType, PlayerRecord, DEFAULT_ELO};
use crate::utils::{describe_streak, mention_channel, mention_role, mention_user};

pub const GREEN: u32 = 0x57F287;
pub const RED: u32 = 0xED4245;
pub const BLURPLE: u32 = 0x5865F2;
pub const DARK_RED: u32 = 0x8B0000;
pub const ORANGE: u32 = 0xE67E22;

/// Custom id of the start button for a match type
pub fn start_button_id(match_type: MatchType) -> String {
    format!("start_{}", match_type)
}

/// The ranked panel posted by `/setup`
pub fn setup_panel() -> (Panel, Vec<Button>) {
    let panel = Panel::new("🎮 Ranked Matches", DARK_RED)
        .description(
            "Use this panel to initiate a ranked challenge.\n\n\
             • **1v1 Ranked** - Challenge a single opponent\n\
             • **2v2 Ranked** - Team up with a friend and challenge two opponents\n\n\
             The bot will create a private channel in the configured category.",
        )
        .field("🎮 1v1 Ranked", "Create a solo ranked match", false)
        .field("🎮 2v2 Ranked", "Team up with a friend", false)
        .footer("Ranked System");

    let buttons = MatchType::ALL
        .iter()
        .map(|match_type| {
            Button::new(
                start_button_id(*match_type),
                format!("Start {}", match_type),
                ButtonStyle::Danger,
            )
        })
        .collect();

    (panel, buttons)
}

pub fn confirmation_panel(title: &str, description: impl Into<String>) -> Panel {
    Panel::new(title, GREEN).description(description)
}

pub fn host_roles_panel(role_ids: &[String]) -> Panel {
    let roles = if role_ids.is_empty() {
        "No host roles set".to_string()
    } else {
        role_ids
            .iter()
            .map(|id| mention_role(id))
            .collect::<Vec<_>>()
            .join("\n")
    };

    Panel::new("Current Host Roles", BLURPLE)
        .description(roles)
        .footer("Use /sethosts to change host roles")
}

fn result_word(won: bool) -> &'static str {
    if won {
        "win"
    } else {
        "loss"
    }
}

/// Reply to `/win` and `/lose`
pub fn outcome_panel(report: &OutcomeReport) -> Panel {
    let record = &report.record;
    let player = mention_user(&record.user_id);

    let base_title = if report.effective_result {
        "Win Recorded"
    } else {
        "Loss Recorded"
    };
    let title = if report.was_overridden {
        format!("{} (Auto Streak Override)", base_title)
    } else {
        base_title.to_string()
    };

    let description = match (report.effective_result, report.was_overridden) {
        (true, false) => format!("{} has been awarded a win!", player),
        (false, false) => format!("{} has been given a loss.", player),
        (true, true) => format!("{} was awarded a win due to Auto Win Streak!", player),
        (false, true) => format!("{} was given a loss due to Auto Lose Streak!", player),
    };

    let footer = if report.was_overridden && report.effective_result != report.reported_won {
        format!(
            "Auto {} Streak applied - result was converted to a {}!",
            if report.effective_result { "Win" } else { "Lose" },
            result_word(report.effective_result)
        )
    } else if record.auto_win_streak > 0 {
        format!("Auto Win Streak: {} games remaining", record.auto_win_streak)
    } else if record.auto_lose_streak > 0 {
        format!("Auto Lose Streak: {} games remaining", record.auto_lose_streak)
    } else if report.reported_won {
        "Good game!".to_string()
    } else {
        "Better luck next time!".to_string()
    };

    Panel::new(title, if report.effective_result { GREEN } else { RED })
        .description(description)
        .field("Total Wins", record.wins.to_string(), true)
        .field("Total Losses", record.losses.to_string(), true)
        .field("Current Streak", describe_streak(record.current_streak), true)
        .footer(footer)
}

/// Posted to the guild's log channel after an outcome
pub fn outcome_log_panel(report: &OutcomeReport, reporter_id: &str) -> Panel {
    let record = &report.record;
    Panel::new("Match Result", if report.effective_result { GREEN } else { RED })
        .description(format!(
            "**{}** {} a match!{}",
            mention_user(&record.user_id),
            if report.effective_result { "won" } else { "lost" },
            if report.was_overridden {
                " (Auto Streak)"
            } else {
                ""
            }
        ))
        .field("Reported By", mention_user(reporter_id), true)
        .field(
            "New Record",
            format!("{}W - {}L", record.wins, record.losses),
            true,
        )
        .timestamp()
}

/// `/stats`; auto streak counters are only included for hosts
pub fn stats_panel(
    record: &PlayerRecord,
    display_name: &str,
    avatar_url: Option<String>,
    show_auto_streaks: bool,
) -> Panel {
    let best = MatchType::ALL
        .iter()
        .map(|mode| record.elo(*mode))
        .max()
        .unwrap_or(DEFAULT_ELO);
    let headline = tier_of(best);

    let tracks = MatchType::ALL
        .iter()
        .map(|mode| {
            let elo = record.elo(*mode);
            format!("**{}:** {} - {} ELO", mode, tier_of(elo).label(), elo)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut panel = Panel::new(
        format!("{} Stats for {}", headline.glyph(), display_name),
        headline.color(),
    )
    .description(tracks)
    .thumbnail(avatar_url)
    .field("Wins", record.wins.to_string(), true)
    .field("Losses", record.losses.to_string(), true)
    .field("Win Rate", format!("{:.1}%", record.win_rate()), true)
    .field("Current Streak", describe_streak(record.current_streak), true)
    .field("Dodges", record.dodges.to_string(), true);

    if record.elo_legacy != DEFAULT_ELO {
        panel = panel.field("Legacy ELO", record.elo_legacy.to_string(), true);
    }

    if show_auto_streaks {
        panel = panel
            .field(
                "Auto Win Streak",
                format!("{} games", record.auto_win_streak),
                true,
            )
            .field(
                "Auto Lose Streak",
                format!("{} games", record.auto_lose_streak),
                true,
            );
    }

    panel
}

/// `/addelo` and `/removeelo`
pub fn elo_adjustment_panel(adjustment: &EloAdjustment, amount: i64) -> Panel {
    let player = mention_user(&adjustment.record.user_id);
    let (title, color, description) = if amount >= 0 {
        (
            "ELO Added",
            GREEN,
            format!(
                "{} has received **+{}** {} ELO!",
                player, amount, adjustment.mode
            ),
        )
    } else {
        (
            "ELO Removed",
            RED,
            format!(
                "{} has lost **-{}** {} ELO.",
                player,
                amount.unsigned_abs(),
                adjustment.mode
            ),
        )
    };

    let mut panel = Panel::new(title, color)
        .description(description)
        .field(
            format!("New {} ELO", adjustment.mode),
            adjustment.new_elo.to_string(),
            true,
        )
        .field("Rank", adjustment.new_tier.label(), true);

    if adjustment.tier_changed() {
        let name = if adjustment.ranked_up() {
            "🎉 Rank Up!"
        } else {
            "📉 Rank Down"
        };
        panel = panel.field(
            name,
            format!("{} → {}", adjustment.old_tier, adjustment.new_tier),
            false,
        );
    }

    panel
}

/// `/setstreak`
pub fn auto_streak_panel(record: &PlayerRecord, kind: AutoStreakKind, count: u32) -> Panel {
    let kind_text = match kind {
        AutoStreakKind::Win => "Auto Win",
        AutoStreakKind::Lose => "Auto Lose",
    };
    let action = if count == 0 {
        "cleared".to_string()
    } else {
        format!("set to {} games", count)
    };

    Panel::new(
        "Streak Updated",
        match kind {
            AutoStreakKind::Win => GREEN,
            AutoStreakKind::Lose => RED,
        },
    )
    .description(format!(
        "{} streak for {} has been {}.",
        kind_text,
        mention_user(&record.user_id),
        action
    ))
    .field(
        "Auto Win Streak",
        format!("{} games", record.auto_win_streak),
        true,
    )
    .field(
        "Auto Lose Streak",
        format!("{} games", record.auto_lose_streak),
        true,
    )
}

/// `/clearstreak`
pub fn streaks_cleared_panel(user_id: &str) -> Panel {
    Panel::new("Streaks Cleared", BLURPLE).description(format!(
        "All streaks for {} have been cleared.",
        mention_user(user_id)
    ))
}

/// `/adjustrecord`
pub fn record_adjusted_panel(record: &PlayerRecord, field: CounterField, amount: i64) -> Panel {
    let field_name = match field {
        CounterField::Wins => "wins",
        CounterField::Losses => "losses",
    };
    let change = if amount >= 0 {
        format!("+{}", amount)
    } else {
        amount.to_string()
    };

    Panel::new("Record Adjusted", BLURPLE)
        .description(format!(
            "{} {} for {}.",
            change,
            field_name,
            mention_user(&record.user_id)
        ))
        .field(
            "New Record",
            format!("{}W - {}L", record.wins, record.losses),
            true,
        )
}

/// `/dodge` reply and the alert posted to the dodge channel
pub fn dodge_panel(record: &PlayerRecord, reporter_id: &str) -> Panel {
    Panel::new("Dodge Recorded", ORANGE)
        .description(format!(
            "{} dodged a ranked match.",
            mention_user(&record.user_id)
        ))
        .field("Total Dodges", record.dodges.to_string(), true)
        .field("Reported By", mention_user(reporter_id), true)
        .timestamp()
}

pub fn user_added_panel(user_id: &str, newly_added: bool) -> Panel {
    let description = if newly_added {
        format!("{} has been added to this match.", mention_user(user_id))
    } else {
        format!("{} is already in this match.", mention_user(user_id))
    };
    Panel::new("User Added", GREEN).description(description)
}

pub fn match_closed_panel(delay_seconds: u64) -> Panel {
    Panel::new("Match Closed", RED).description(format!(
        "This match has been closed by a host.\nThis channel will be deleted in {} seconds.",
        delay_seconds
    ))
}

pub fn match_created_message(match_type: MatchType, room_id: &str) -> String {
    format!(
        "Your {} ranked match has been created: {}",
        match_type,
        mention_channel(room_id)
    )
}

pub fn leaderboard_synced_message(results: &[PanelUpdateResult]) -> String {
    results
        .iter()
        .map(|result| {
            format!(
                "{} leaderboard {} in {}.",
                result.mode,
                result.action.as_str(),
                mention_channel(&result.channel_id)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
