use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use composer_core::feedback::{
    FeedbackCollector, FeedbackRecord, FeedbackSummary, JsonlFeedbackLog,
};
use composer_core::strategy::{JsonFileSnapshotStore, PolicySnapshotStore, PolicyStats};
use composer_core::trace::{JsonlTraceLog, PerformanceMonitor, PerformanceSummary, TraceLog};
use composer_core::{ComposerConfig, StrategyPolicy};
use serde::Serialize;

use super::print_json;

#[derive(Args)]
pub struct StatsArgs {
    /// Days of feedback to summarize
    #[arg(long, default_value_t = 7)]
    pub days: u32,

    /// Also list every feedback entry for this trace
    #[arg(long)]
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct Stats {
    performance: PerformanceSummary,
    policy: PolicyStats,
    feedback: FeedbackSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_feedback: Option<Vec<FeedbackRecord>>,
}

pub async fn run(args: StatsArgs, config: &ComposerConfig) -> Result<()> {
    let paths = config.paths();

    let traces = JsonlTraceLog::new(&paths.traces_path).read_all().await?;
    let performance = PerformanceMonitor::from_records(&traces).summary();

    let snapshot = JsonFileSnapshotStore::new(&paths.policy_path)
        .load()
        .await?
        .unwrap_or_default();
    let policy = StrategyPolicy::from_snapshot(config.policy.clone(), snapshot).stats();

    let collector = FeedbackCollector::new(Arc::new(JsonlFeedbackLog::new(&paths.feedback_path)));
    let feedback = collector.summary(args.days).await?;
    let trace_feedback = match &args.trace_id {
        Some(trace_id) => Some(collector.for_trace(trace_id).await?),
        None => None,
    };

    print_json(&Stats {
        performance,
        policy,
        feedback,
        trace_feedback,
    })
}
