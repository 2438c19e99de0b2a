//! Rank tiers derived from an ELO value

use serde::Serialize;

/// Named ELO band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    Unranked,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    /// All tiers from lowest to highest
    pub const ALL: [Tier; 6] = [
        Tier::Unranked,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Diamond,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Unranked => "UNRANKED",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Diamond => "DIAMOND",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Tier::Unranked => "⚪",
            Tier::Bronze => "🥉",
            Tier::Silver => "🥈",
            Tier::Gold => "🥇",
            Tier::Platinum => "🏆",
            Tier::Diamond => "💎",
        }
    }

    /// Embed color for panels showing this tier
    pub fn color(&self) -> u32 {
        match self {
            Tier::Unranked => 0x808080,
            Tier::Bronze => 0xCD7F32,
            Tier::Silver => 0xC0C0C0,
            Tier::Gold => 0xFFD700,
            Tier::Platinum => 0xE5E4E2,
            Tier::Diamond => 0x00BFFF,
        }
    }

    /// Inclusive lower bound of the band
    pub fn min_elo(&self) -> u64 {
        match self {
            Tier::Unranked => 0,
            Tier::Bronze => 800,
            Tier::Silver => 1000,
            Tier::Gold => 1200,
            Tier::Platinum => 1400,
            Tier::Diamond => 1600,
        }
    }

    /// `"{glyph} {NAME}"`, as used in listings
    pub fn label(&self) -> String {
        format!("{} {}", self.glyph(), self.name())
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve the tier for an ELO value
pub fn tier_of(elo: u64) -> Tier {
    Tier::ALL
        .iter()
        .rev()
        .find(|tier| elo >= tier.min_elo())
        .copied()
        .unwrap_or(Tier::Unranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier_of(0), Tier::Unranked);
        assert_eq!(tier_of(799), Tier::Unranked);
        assert_eq!(tier_of(800), Tier::Bronze);
        assert_eq!(tier_of(999), Tier::Bronze);
        assert_eq!(tier_of(1000), Tier::Silver);
        assert_eq!(tier_of(1200), Tier::Gold);
        assert_eq!(tier_of(1400), Tier::Platinum);
        assert_eq!(tier_of(1599), Tier::Platinum);
        assert_eq!(tier_of(1600), Tier::Diamond);
        assert_eq!(tier_of(u64::MAX), Tier::Diamond);
    }

    #[test]
    fn test_display_metadata() {
        assert_eq!(Tier::Gold.label(), "🥇 GOLD");
        assert_eq!(Tier::Diamond.color(), 0x00BFFF);
        assert_eq!(Tier::Bronze.to_string(), "BRONZE");
    }

    #[test]
    fn test_tiers_are_ordered_by_bound() {
        for pair in Tier::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].min_elo() < pair[1].min_elo());
        }
    }
}
