//! End-to-end composition tests against file-backed storage
//!
//! These tests validate the host lifecycle:
//! - Traces, feedback and policy snapshots land under the data directory
//! - A reopened composer resumes the learned policy
//! - Feedback finds traces recorded by an earlier process

use std::sync::Arc;

use composer_core::feedback::FeedbackType;
use composer_core::strategy::{
    ContextKey, InMemorySnapshotStore, PolicySnapshotStore, SnapshotWriter,
};
use composer_core::trace::{JsonlTraceLog, TraceLog};
use composer_core::types::CompositionContext;
use composer_core::{
    Composer, ComposerConfig, GroundingScorer, Lang, MAX_ATTEMPTS, PolicyConfig, SourceChunk,
    Strategy, StrategyPolicy, TraceRecorder,
};
use tempfile::TempDir;

const ANSWER: &str = "Meditation is a spiritual practice that brings inner peace.";

fn chunks() -> Vec<SourceChunk> {
    vec![
        SourceChunk::new(
            "Meditation is a spiritual practice that brings inner peace and wisdom.",
            "Yoga Sutras",
            0.92,
        ),
        SourceChunk::new(
            "Through regular practice the mind becomes calm and wisdom arises.",
            "Bhagavad Gita",
            0.81,
        ),
    ]
}

fn config_in(dir: &TempDir) -> ComposerConfig {
    let mut config = ComposerConfig::default();
    config.storage.data_dir = Some(dir.path().to_path_buf());
    config.policy = PolicyConfig {
        initial_epsilon: 0.0,
        min_epsilon: 0.0,
        seed: Some(42),
        ..PolicyConfig::default()
    };
    config
}

#[tokio::test]
async fn composition_persists_trace_and_policy() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);

    let composer = Composer::open(&config).await.unwrap();
    let result = composer.compose("trace-1", ANSWER, &chunks(), Lang::En);
    assert_eq!(result.trace_id, "trace-1");
    assert!(result.attempts >= 1 && result.attempts <= MAX_ATTEMPTS);
    composer.shutdown().await;

    let paths = config.paths();
    let traces = JsonlTraceLog::new(&paths.traces_path).read_all().await.unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].trace_id(), "trace-1");
    assert_eq!(traces[0].chunk_count, 2);
    assert_eq!(traces[0].result.final_text, result.final_text);

    assert!(paths.policy_path.exists());
}

#[tokio::test]
async fn reopened_composer_resumes_policy() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);

    let first = Composer::open(&config).await.unwrap();
    let result = first.compose("trace-a", ANSWER, &chunks(), Lang::En);
    let metadata = result.policy_metadata.clone().unwrap();
    let learned = first
        .policy()
        .q_value(&metadata.context_key, metadata.strategy);
    first.shutdown().await;

    let second = Composer::open(&config).await.unwrap();
    assert_eq!(
        second
            .policy()
            .q_value(&metadata.context_key, metadata.strategy),
        learned
    );
    assert_eq!(second.policy().stats().total_actions, 1);
    second.shutdown().await;
}

#[tokio::test]
async fn feedback_reaches_trace_from_previous_run() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);

    let first = Composer::open(&config).await.unwrap();
    first.compose("trace-fb", ANSWER, &chunks(), Lang::En);
    first.shutdown().await;

    let second = Composer::open(&config).await.unwrap();
    assert!(
        second
            .submit_feedback("trace-fb", 4, FeedbackType::Relevance, None)
            .await
    );
    assert!(
        !second
            .submit_feedback("never-composed", 4, FeedbackType::Relevance, None)
            .await
    );

    let summary = second.feedback().unwrap().summary(7).await.unwrap();
    assert_eq!(summary.total_feedback, 1);
    assert_eq!(summary.type_distribution[&FeedbackType::Relevance], 1);
    assert_eq!(summary.high_satisfaction_rate, 1.0);
    second.shutdown().await;
}

#[tokio::test]
async fn snapshots_follow_update_interval() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let config = PolicyConfig {
        snapshot_every: 2,
        initial_epsilon: 0.0,
        min_epsilon: 0.0,
        ..PolicyConfig::default()
    };
    let policy = StrategyPolicy::new(config)
        .with_writer(SnapshotWriter::spawn(store.clone() as Arc<dyn PolicySnapshotStore>));
    let composer = Composer::new(
        &ComposerConfig::default(),
        Arc::new(policy),
        Arc::new(TraceRecorder::detached()),
    );

    for i in 0..4 {
        composer.compose(&format!("t-{i}"), ANSWER, &chunks(), Lang::En);
    }
    composer.shutdown().await;

    // two interval snapshots plus the final flush
    assert_eq!(store.save_count(), 3);
    assert_eq!(store.latest().unwrap().total_actions, 4);
}

#[test]
fn hindi_composition_stays_in_budget() {
    let composer = Composer::new(
        &ComposerConfig::default(),
        Arc::new(StrategyPolicy::new(PolicyConfig {
            seed: Some(3),
            ..PolicyConfig::default()
        })),
        Arc::new(TraceRecorder::detached()),
    );
    let chunks = vec![SourceChunk::new(
        "ध्यान एक आध्यात्मिक अभ्यास है जो आंतरिक शांति और ज्ञान लाता है।",
        "योग सूत्र",
        0.9,
    )];

    let result = composer.compose("trace-hi", "ध्यान आंतरिक शांति लाता है।", &chunks, Lang::Hi);

    assert!(result.error.is_none());
    assert_eq!(result.lang, Lang::Hi);
    assert!(result.strategy_id.contains("_hi"));
    assert!(result.attempts <= MAX_ATTEMPTS);
    assert_eq!(result.citations[0].source, "योग सूत्र");
}

#[test]
fn every_input_terminates_within_attempt_budget() {
    let composer = Composer::new(
        &ComposerConfig::default(),
        Arc::new(StrategyPolicy::new(PolicyConfig {
            seed: Some(11),
            ..PolicyConfig::default()
        })),
        Arc::new(TraceRecorder::detached()),
    );
    let unrelated = vec![SourceChunk::new(
        "Cooking recipes involve various ingredients.",
        "Cookbook",
        0.1,
    )];

    let cases: Vec<(&str, &[SourceChunk])> = vec![
        (ANSWER, &unrelated),
        ("?!", &unrelated),
        ("the and of", &unrelated),
        ("Karma", &unrelated),
        ("", &unrelated),
    ];

    for (i, (answer, chunks)) in cases.into_iter().enumerate() {
        let result = composer.compose(&format!("case-{i}"), answer, chunks, Lang::En);
        assert!((1..=MAX_ATTEMPTS).contains(&result.attempts), "case {i}");
        assert!((0.0..=1.0).contains(&result.reward), "case {i}");
        assert!((0.0..=1.0).contains(&result.grounding_score()), "case {i}");
    }
}

#[test]
fn adding_chunks_never_lowers_overlap() {
    let scorer = GroundingScorer::default();
    let candidate = "Meditation brings peace, wisdom and a calm mind through practice.";
    let mut chunks = vec![SourceChunk::new("Meditation brings peace.", "A", 0.5)];
    let mut previous = scorer.verify(candidate, &chunks).overlap_ratio;

    for text in [
        "Meditation brings peace and wisdom.",
        "A calm mind comes through practice.",
        "Unrelated gardening advice.",
    ] {
        chunks.push(SourceChunk::new(text, "B", 0.5));
        let ratio = scorer.verify(candidate, &chunks).overlap_ratio;
        assert!(ratio >= previous);
        assert!(ratio <= 1.0);
        previous = ratio;
    }
}

#[test]
fn unseen_context_defaults_to_explain() {
    let policy = StrategyPolicy::new(PolicyConfig {
        initial_epsilon: 0.0,
        min_epsilon: 0.0,
        ..PolicyConfig::default()
    });
    let chunks = chunks();
    let context = CompositionContext::new(ANSWER, &chunks, Lang::En);

    let (strategy, metadata) = policy.select(&context);

    assert_eq!(strategy, Strategy::Explain);
    assert_eq!(metadata.selection_method.as_str(), "exploitation-default");
    assert_eq!(metadata.context_key, ContextKey::from_context(&context));
    assert_eq!(policy.q_value(&metadata.context_key, strategy), None);
}
