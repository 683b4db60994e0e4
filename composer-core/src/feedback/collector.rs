use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{FeedbackLog, FeedbackRecord, FeedbackType, HIGH_SATISFACTION_RATING, MAX_RATING, MIN_RATING};
use crate::error::Result;

/// Aggregate over recent feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub total_feedback: usize,
    /// Mean rating rounded to two decimals
    pub average_rating: f64,
    /// Count per rating, every rating on the scale present
    pub rating_distribution: BTreeMap<u8, usize>,
    pub type_distribution: BTreeMap<FeedbackType, usize>,
    pub days_analyzed: u32,
    pub high_satisfaction_rate: f64,
}

/// Stores accepted feedback and summarizes it
pub struct FeedbackCollector {
    log: Arc<dyn FeedbackLog>,
}

impl FeedbackCollector {
    pub fn new(log: Arc<dyn FeedbackLog>) -> Self {
        Self { log }
    }

    pub async fn record(&self, record: &FeedbackRecord) -> Result<()> {
        self.log.append(record).await?;
        info!(
            trace_id = %record.trace_id,
            rating = record.rating,
            feedback_type = %record.feedback_type,
            "Feedback recorded"
        );
        Ok(())
    }

    /// All feedback for one trace, oldest first
    pub async fn for_trace(&self, trace_id: &str) -> Result<Vec<FeedbackRecord>> {
        Ok(self
            .log
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.trace_id == trace_id)
            .collect())
    }

    /// Summary of feedback received in the last `days` days
    ///
    /// A window reaching past the earliest representable time covers all feedback.
    pub async fn summary(&self, days: u32) -> Result<FeedbackSummary> {
        let cutoff = Duration::try_days(i64::from(days))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let recent: Vec<FeedbackRecord> = self
            .log
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.timestamp >= cutoff)
            .collect();
        Ok(summarize(&recent, days))
    }
}

fn summarize(records: &[FeedbackRecord], days: u32) -> FeedbackSummary {
    let mut rating_distribution: BTreeMap<u8, usize> =
        (MIN_RATING..=MAX_RATING).map(|r| (r, 0)).collect();
    let mut type_distribution = BTreeMap::new();
    let mut rating_sum = 0u64;
    let mut high = 0usize;

    for record in records {
        *rating_distribution.entry(record.rating).or_default() += 1;
        *type_distribution.entry(record.feedback_type).or_default() += 1;
        rating_sum += u64::from(record.rating);
        if record.rating >= HIGH_SATISFACTION_RATING {
            high += 1;
        }
    }

    let total = records.len();
    let (average_rating, high_satisfaction_rate) = if total == 0 {
        (0.0, 0.0)
    } else {
        let avg = rating_sum as f64 / total as f64;
        ((avg * 100.0).round() / 100.0, high as f64 / total as f64)
    };

    FeedbackSummary {
        total_feedback: total,
        average_rating,
        rating_distribution,
        type_distribution,
        days_analyzed: days,
        high_satisfaction_rate,
    }
}
