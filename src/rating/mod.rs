//! Rating system for ranked matches
//!
//! Outcomes, manual ELO changes and auto streaks are applied by the
//! [`RatingEngine`]; tiers are derived from ELO on demand.

pub mod engine;
pub mod tier;

pub use engine::{
    apply_result, resolve_outcome, EloAdjustment, OutcomeReport, RatingEngine, MAX_AUTO_STREAK,
};
pub use tier::{tier_of, Tier};
