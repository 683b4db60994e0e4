//! Composition performance counters

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TraceRecord;

/// Composition times kept for percentiles
pub const TIMING_WINDOW: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_compositions: u64,
    pub successful_compositions: u64,
    pub failed_compositions: u64,
    pub grounding_failures: u64,
    pub success_rate: f64,
    pub grounding_rate: f64,
    pub avg_composition_time_ms: f64,
    pub p50_composition_time_ms: f64,
    pub p95_composition_time_ms: f64,
    pub p99_composition_time_ms: f64,
    pub min_time_ms: f64,
    pub max_time_ms: f64,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: f64,
}

#[derive(Debug)]
struct MonitorState {
    total: u64,
    successful: u64,
    failed: u64,
    grounding_failures: u64,
    times: VecDeque<f64>,
}

/// Rolling counters over recorded traces
#[derive(Debug)]
pub struct PerformanceMonitor {
    started_at: DateTime<Utc>,
    state: Mutex<MonitorState>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    fn starting_at(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            state: Mutex::new(MonitorState {
                total: 0,
                successful: 0,
                failed: 0,
                grounding_failures: 0,
                times: VecDeque::with_capacity(TIMING_WINDOW),
            }),
        }
    }

    /// Rebuild counters from persisted traces, starting at the oldest one
    pub fn from_records(records: &[TraceRecord]) -> Self {
        let started_at = records
            .iter()
            .map(|r| r.recorded_at)
            .min()
            .unwrap_or_else(Utc::now);
        let monitor = Self::starting_at(started_at);
        for record in records {
            monitor.observe(record);
        }
        monitor
    }

    pub fn observe(&self, record: &TraceRecord) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.total += 1;
        if record.success {
            state.successful += 1;
        } else {
            state.failed += 1;
        }
        if !record.result.grounded() {
            state.grounding_failures += 1;
        }
        if state.times.len() == TIMING_WINDOW {
            state.times.pop_front();
        }
        state.times.push_back(record.result.composition_time_ms);
    }

    pub fn summary(&self) -> PerformanceSummary {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let mut sorted: Vec<f64> = state.times.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let denom = state.total.max(1) as f64;
        let avg = if sorted.is_empty() {
            0.0
        } else {
            sorted.iter().sum::<f64>() / sorted.len() as f64
        };
        let uptime = (Utc::now() - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;

        PerformanceSummary {
            total_compositions: state.total,
            successful_compositions: state.successful,
            failed_compositions: state.failed,
            grounding_failures: state.grounding_failures,
            success_rate: state.successful as f64 / denom,
            grounding_rate: (state.total - state.grounding_failures) as f64 / denom,
            avg_composition_time_ms: avg,
            p50_composition_time_ms: percentile(&sorted, 0.5),
            p95_composition_time_ms: percentile(&sorted, 0.95),
            p99_composition_time_ms: percentile(&sorted, 0.99),
            min_time_ms: sorted.first().copied().unwrap_or(0.0),
            max_time_ms: sorted.last().copied().unwrap_or(0.0),
            started_at: self.started_at,
            uptime_seconds: uptime,
        }
    }
}

/// Nearest-rank percentile over sorted samples
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 * q) as usize).min(sorted.len() - 1);
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::GroundingResult;
    use crate::types::{CompositionMethod, CompositionResult, Lang};

    fn record(time_ms: f64, grounded: bool, error: Option<&str>) -> TraceRecord {
        let mut grounding = GroundingResult::degenerate("test");
        grounding.grounded = grounded;
        let result = CompositionResult {
            trace_id: "t".to_string(),
            final_text: String::new(),
            strategy_id: "explain_en".to_string(),
            strategy: None,
            grounding,
            attempts: 1,
            reward: 0.0,
            policy_metadata: None,
            policy_overridden: false,
            citations: Vec::new(),
            composition_time_ms: time_ms,
            lang: Lang::En,
            method: CompositionMethod::NgramTemplate,
            error: error.map(str::to_string),
        };
        TraceRecord::from_result(result, "", 0)
    }

    #[test]
    fn test_empty_summary_is_zeroed() {
        let summary = PerformanceMonitor::new().summary();
        assert_eq!(summary.total_compositions, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.p99_composition_time_ms, 0.0);
        assert_eq!(summary.max_time_ms, 0.0);
    }

    #[test]
    fn test_counts_and_rates() {
        let monitor = PerformanceMonitor::new();
        monitor.observe(&record(10.0, true, None));
        monitor.observe(&record(20.0, false, None));
        monitor.observe(&record(30.0, false, Some("invalid")));
        monitor.observe(&record(40.0, true, None));

        let summary = monitor.summary();
        assert_eq!(summary.total_compositions, 4);
        assert_eq!(summary.successful_compositions, 3);
        assert_eq!(summary.failed_compositions, 1);
        assert_eq!(summary.grounding_failures, 2);
        assert_eq!(summary.success_rate, 0.75);
        assert_eq!(summary.grounding_rate, 0.5);
        assert_eq!(summary.avg_composition_time_ms, 25.0);
        assert_eq!(summary.p50_composition_time_ms, 30.0);
        assert_eq!(summary.min_time_ms, 10.0);
        assert_eq!(summary.max_time_ms, 40.0);
    }

    #[test]
    fn test_percentiles_over_hundred_samples() {
        let monitor = PerformanceMonitor::new();
        for i in 1..=100 {
            monitor.observe(&record(i as f64, true, None));
        }
        let summary = monitor.summary();
        assert_eq!(summary.p50_composition_time_ms, 51.0);
        assert_eq!(summary.p95_composition_time_ms, 96.0);
        assert_eq!(summary.p99_composition_time_ms, 100.0);
    }

    #[test]
    fn test_timing_window_is_bounded() {
        let monitor = PerformanceMonitor::new();
        for i in 0..(TIMING_WINDOW + 10) {
            monitor.observe(&record(i as f64, true, None));
        }
        let summary = monitor.summary();
        assert_eq!(summary.total_compositions, (TIMING_WINDOW + 10) as u64);
        assert_eq!(summary.min_time_ms, 10.0);
    }

    #[test]
    fn test_from_records_starts_at_oldest() {
        let first = record(5.0, true, None);
        let mut second = record(7.0, true, None);
        second.recorded_at = first.recorded_at + chrono::Duration::seconds(30);

        let monitor = PerformanceMonitor::from_records(&[second, first.clone()]);
        let summary = monitor.summary();
        assert_eq!(summary.started_at, first.recorded_at);
        assert_eq!(summary.total_compositions, 2);
    }
}
