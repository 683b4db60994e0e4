//! Persisted composition trace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reward::RewardInput;
use crate::types::{CompositionResult, truncate_chars};

/// Characters of the extractive answer kept in a trace
pub const ANSWER_PREVIEW_CHARS: usize = 100;

/// One append-only entry per composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    #[serde(flatten)]
    pub result: CompositionResult,
    pub chunk_count: usize,
    pub extractive_answer_preview: String,
    pub recorded_at: DateTime<Utc>,
    pub success: bool,
}

impl TraceRecord {
    pub fn from_result(result: CompositionResult, extractive_answer: &str, chunk_count: usize) -> Self {
        let success = result.error.is_none();
        Self {
            result,
            chunk_count,
            extractive_answer_preview: truncate_chars(extractive_answer, ANSWER_PREVIEW_CHARS),
            recorded_at: Utc::now(),
            success,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.result.trace_id
    }

    /// Outcome fields feedback rewards are computed from
    pub fn reward_input(&self) -> RewardInput {
        RewardInput::from(&self.result)
    }
}
