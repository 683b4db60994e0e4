//! Reward signal for the strategy policy
//!
//! Pure functions of a composition outcome and optional user rating.

use serde::{Deserialize, Serialize};

use crate::types::CompositionResult;

/// The parts of a composition outcome that earn reward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardInput {
    pub grounded: bool,
    pub grounding_score: f64,
    pub composition_time_ms: f64,
}

impl From<&CompositionResult> for RewardInput {
    fn from(result: &CompositionResult) -> Self {
        Self {
            grounded: result.grounded(),
            grounding_score: result.grounding_score(),
            composition_time_ms: result.composition_time_ms,
        }
    }
}

/// Reward for a finished composition and an optional 1-5 rating
pub fn reward(result: &CompositionResult, rating: Option<u8>) -> f64 {
    reward_for(RewardInput::from(result), rating)
}

/// Reward in `[0, 1]` for an outcome and an optional 1-5 rating
pub fn reward_for(outcome: RewardInput, rating: Option<u8>) -> f64 {
    let mut total = 0.0;

    if outcome.grounded {
        total += 0.4;
    }
    total += outcome.grounding_score * 0.3;

    if outcome.composition_time_ms < 50.0 {
        total += 0.2;
    } else if outcome.composition_time_ms < 100.0 {
        total += 0.1;
    }

    match rating {
        Some(r) if r >= 4 => total += 0.3,
        Some(3) => total += 0.1,
        Some(_) => total -= 0.1,
        None => {}
    }

    if total.is_nan() {
        return 0.0;
    }
    total.clamp(0.0, 1.0)
}
