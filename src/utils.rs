//! Utility functions for the ranked match coordinator

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Platform mention markup for a user
pub fn mention_user(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

/// Platform mention markup for a role
pub fn mention_role(role_id: &str) -> String {
    format!("<@&{}>", role_id)
}

/// Platform mention markup for a channel
pub fn mention_channel(channel_id: &str) -> String {
    format!("<#{}>", channel_id)
}

/// Human-readable form of a signed streak
pub fn describe_streak(streak: i64) -> String {
    if streak > 0 {
        format!("{} Win Streak", streak)
    } else if streak < 0 {
        format!("{} Lose Streak", streak.unsigned_abs())
    } else {
        "No Streak".to_string()
    }
}

/// Apply a signed delta to an unsigned value, clamping at zero
pub fn apply_floored_delta(value: u64, delta: i64) -> u64 {
    value.saturating_add_signed(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions() {
        assert_eq!(mention_user("42"), "<@42>");
        assert_eq!(mention_role("7"), "<@&7>");
        assert_eq!(mention_channel("9"), "<#9>");
    }

    #[test]
    fn test_describe_streak() {
        assert_eq!(describe_streak(3), "3 Win Streak");
        assert_eq!(describe_streak(-2), "2 Lose Streak");
        assert_eq!(describe_streak(0), "No Streak");
    }

    #[test]
    fn test_apply_floored_delta() {
        assert_eq!(apply_floored_delta(800, -5000), 0);
        assert_eq!(apply_floored_delta(800, 250), 1050);
        assert_eq!(apply_floored_delta(0, -1), 0);
        assert_eq!(apply_floored_delta(u64::MAX, 1), u64::MAX);
    }
}
