//! Composition orchestrator

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, trace, warn};

use super::machine::Step;
use crate::config::{ComposerConfig, OrchestratorConfig};
use crate::error::{ComposerError, Result};
use crate::feedback::{
    FeedbackCollector, FeedbackRecord, FeedbackType, JsonlFeedbackLog, is_valid_rating,
};
use crate::grounding::{GroundingResult, GroundingScorer};
use crate::render::{
    BuiltinTemplates, Enhancer, NgramSmoother, RuleEnhancer, Smoother, TemplateRenderer,
    minimal_template,
};
use crate::reward;
use crate::strategy::{
    ActionMetadata, JsonFileSnapshotStore, Strategy, StrategyPolicy, is_suitable,
    select_by_content,
};
use crate::trace::{JsonlTraceLog, TraceRecord, TraceRecorder};
use crate::types::{
    Citation, CompositionContext, CompositionMethod, CompositionResult, ERROR_FALLBACK_ID, Lang,
    SourceChunk,
};

/// Appended to the strategy id once grounding has been improved
pub const IMPROVED_SUFFIX: &str = "+improved";

/// Working state of one run
struct Draft {
    text: String,
    strategy: Option<Strategy>,
    strategy_id: String,
    grounding: GroundingResult,
    attempts: u32,
    metadata: Option<ActionMetadata>,
    overridden: bool,
}

impl Draft {
    fn new() -> Self {
        Self {
            text: String::new(),
            strategy: None,
            strategy_id: String::new(),
            grounding: GroundingResult::degenerate("not verified"),
            attempts: 0,
            metadata: None,
            overridden: false,
        }
    }

    fn set_strategy(&mut self, strategy: Strategy, lang: Lang) {
        self.strategy = Some(strategy);
        self.strategy_id = strategy.template_id(lang);
    }
}

/// Composes grounded answers from an extractive answer and its sources.
///
/// Each call runs SELECT, RENDER and VERIFY, retrying through the extractive
/// and improve-grounding fallbacks until the text is grounded or the attempt
/// budget is spent. The policy and trace recorder are shared with the host.
pub struct Composer {
    config: OrchestratorConfig,
    scorer: GroundingScorer,
    policy: Arc<StrategyPolicy>,
    recorder: Arc<TraceRecorder>,
    feedback: Option<FeedbackCollector>,
    renderer: Box<dyn TemplateRenderer>,
    smoother: Box<dyn Smoother>,
    enhancer: Box<dyn Enhancer>,
}

impl Composer {
    /// Composer with the built-in renderer, smoother and enhancer
    pub fn new(
        config: &ComposerConfig,
        policy: Arc<StrategyPolicy>,
        recorder: Arc<TraceRecorder>,
    ) -> Self {
        Self {
            config: config.composer.clone(),
            scorer: GroundingScorer::new(config.grounding.clone()),
            policy,
            recorder,
            feedback: None,
            renderer: Box::new(BuiltinTemplates::new()),
            smoother: Box::new(NgramSmoother::new()),
            enhancer: Box::new(RuleEnhancer::new(config.composer.enhancement_enabled)),
        }
    }

    /// Composer persisting policy snapshots, traces and feedback under the
    /// configured data directory. Must be called inside a tokio runtime.
    pub async fn open(config: &ComposerConfig) -> Result<Self> {
        let paths = config.paths();
        paths.ensure_dirs()?;

        let store = Arc::new(JsonFileSnapshotStore::new(&paths.policy_path));
        let policy = StrategyPolicy::load(config.policy.clone(), store).await;
        let recorder = TraceRecorder::spawn(Arc::new(JsonlTraceLog::new(&paths.traces_path)));
        let feedback = FeedbackCollector::new(Arc::new(JsonlFeedbackLog::new(&paths.feedback_path)));

        info!(data_dir = %paths.data_dir.display(), "Composer opened");

        Ok(Self::new(config, Arc::new(policy), Arc::new(recorder)).with_feedback(feedback))
    }

    pub fn with_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_smoother(mut self, smoother: impl Smoother + 'static) -> Self {
        self.smoother = Box::new(smoother);
        self
    }

    pub fn with_enhancer(mut self, enhancer: impl Enhancer + 'static) -> Self {
        self.enhancer = Box::new(enhancer);
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackCollector) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn policy(&self) -> &Arc<StrategyPolicy> {
        &self.policy
    }

    pub fn recorder(&self) -> &Arc<TraceRecorder> {
        &self.recorder
    }

    pub fn feedback(&self) -> Option<&FeedbackCollector> {
        self.feedback.as_ref()
    }

    pub fn scorer(&self) -> &GroundingScorer {
        &self.scorer
    }

    /// Compose a grounded answer. Never fails: invalid input yields the
    /// error-fallback result carrying the extractive answer unchanged.
    #[instrument(name = "composer::compose", skip_all, fields(trace_id = %trace_id, lang = %lang))]
    pub fn compose(
        &self,
        trace_id: &str,
        extractive_answer: &str,
        chunks: &[SourceChunk],
        lang: Lang,
    ) -> CompositionResult {
        let started = Instant::now();
        let context = CompositionContext::new(extractive_answer, chunks, lang);
        info!(
            chunks = chunks.len(),
            answer_chars = context.answer_chars(),
            "Composition started"
        );

        let result = match self.run(&context) {
            Ok(draft) => self.finish(trace_id, &context, draft, started),
            Err(e) => {
                warn!(error = %e, "Composition aborted, returning extractive answer");
                error_fallback(trace_id, &context, &e, started)
            }
        };

        info!(
            strategy_id = %result.strategy_id,
            grounded = result.grounded(),
            score = result.grounding_score(),
            attempts = result.attempts,
            reward = result.reward,
            time_ms = result.composition_time_ms,
            "Composition finished"
        );

        self.recorder.record(TraceRecord::from_result(
            result.clone(),
            extractive_answer,
            chunks.len(),
        ));
        result
    }

    fn run(&self, context: &CompositionContext<'_>) -> Result<Draft> {
        validate(context)?;

        let max_attempts = self.config.attempts();
        let mut draft = Draft::new();
        let mut step = Step::Select;

        loop {
            trace!(step = step.name(), attempt = draft.attempts, "Composer step");
            step = match step {
                Step::Select => {
                    let strategy = self.select(context, &mut draft);
                    Step::Render(strategy)
                }
                Step::Render(strategy) => {
                    draft.text = self.render(strategy, context);
                    draft.set_strategy(strategy, context.lang);
                    Step::Verify
                }
                Step::Verify => {
                    draft.attempts += 1;
                    draft.grounding = self.scorer.verify(&draft.text, context.chunks);
                    debug!(
                        attempt = draft.attempts,
                        strategy_id = %draft.strategy_id,
                        grounded = draft.grounding.grounded,
                        score = draft.grounding.score,
                        overlap_ratio = draft.grounding.overlap_ratio,
                        "Verified"
                    );
                    Step::after_verify(draft.grounding.grounded, draft.attempts, max_attempts)
                }
                Step::FallbackExtractive => {
                    warn!(
                        attempt = draft.attempts,
                        score = draft.grounding.score,
                        "Not grounded, falling back to extractive"
                    );
                    draft.text = self.render_extractive(context);
                    draft.set_strategy(Strategy::Extractive, context.lang);
                    Step::Verify
                }
                Step::FallbackImprove => {
                    warn!(
                        attempt = draft.attempts,
                        score = draft.grounding.score,
                        "Not grounded, improving grounding"
                    );
                    draft.text = self.scorer.improve(&draft.text, context.chunks);
                    draft.strategy_id.push_str(IMPROVED_SUFFIX);
                    Step::Verify
                }
                Step::Done => return Ok(draft),
            };
        }
    }

    /// Ask the policy, overriding picks the content cannot support
    fn select(&self, context: &CompositionContext<'_>, draft: &mut Draft) -> Strategy {
        let (chosen, metadata) = self.policy.select(context);
        draft.metadata = Some(metadata);

        if is_suitable(chosen, context) {
            return chosen;
        }

        let strategy = select_by_content(context);
        draft.overridden = true;
        info!(
            chosen = %chosen,
            strategy = %strategy,
            chunks = context.chunks.len(),
            "Policy choice unsuitable for content, using content selector"
        );
        strategy
    }

    /// Template, smoothing and best-effort enhancement
    fn render(&self, strategy: Strategy, context: &CompositionContext<'_>) -> String {
        let rendered = self
            .renderer
            .render(strategy, context)
            .and_then(|text| self.smoother.smooth(&text, context.lang));

        let text = match rendered {
            Ok(text) => text,
            Err(e) => {
                warn!(strategy = %strategy, error = %e, "Rendering failed, using minimal template");
                minimal_template(context)
            }
        };

        if !self.enhancer.is_available() {
            return text;
        }
        match self.enhancer.enhance(&text, context) {
            Ok(enhanced) => enhanced,
            Err(e) => {
                warn!(error = %e, "Enhancement failed, keeping rendered text");
                text
            }
        }
    }

    /// Extractive template alone
    fn render_extractive(&self, context: &CompositionContext<'_>) -> String {
        match self.renderer.render(Strategy::Extractive, context) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Extractive rendering failed, using minimal template");
                minimal_template(context)
            }
        }
    }

    fn method(&self) -> CompositionMethod {
        if self.enhancer.is_available() {
            CompositionMethod::Enhanced
        } else {
            CompositionMethod::NgramTemplate
        }
    }

    fn finish(
        &self,
        trace_id: &str,
        context: &CompositionContext<'_>,
        draft: Draft,
        started: Instant,
    ) -> CompositionResult {
        let mut result = CompositionResult {
            trace_id: trace_id.to_string(),
            final_text: draft.text,
            strategy_id: draft.strategy_id,
            strategy: draft.strategy,
            grounding: draft.grounding,
            attempts: draft.attempts,
            reward: 0.0,
            policy_metadata: draft.metadata,
            policy_overridden: draft.overridden,
            citations: Citation::from_chunks(context.chunks),
            composition_time_ms: elapsed_ms(started),
            lang: context.lang,
            method: self.method(),
            error: None,
        };
        result.reward = reward::reward(&result, None);

        if result.is_reward_bearing() {
            if let Some(metadata) = &result.policy_metadata {
                self.policy.update(metadata, result.reward);
            }
        }

        result
    }

    /// Rate a recorded composition.
    ///
    /// Returns false for a rating outside 1-5 or an unknown trace. The reward
    /// combines the recorded outcome with the rating and reaches the policy
    /// unless the policy pick was overridden.
    #[instrument(
        name = "composer::submit_feedback",
        skip_all,
        fields(trace_id = %trace_id, feedback_type = %feedback_type)
    )]
    pub async fn submit_feedback(
        &self,
        trace_id: &str,
        rating: u8,
        feedback_type: FeedbackType,
        comments: Option<String>,
    ) -> bool {
        if !is_valid_rating(rating) {
            warn!(rating, "Rejected feedback with rating outside 1-5");
            return false;
        }

        let record = match self.recorder.lookup(trace_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!("Rejected feedback for unknown trace");
                return false;
            }
            Err(e) => {
                error!(error = %e, "Failed to look up trace for feedback");
                return false;
            }
        };

        let reward = reward::reward_for(record.reward_input(), Some(rating));
        if record.result.is_reward_bearing() {
            if let Some(metadata) = &record.result.policy_metadata {
                self.policy.update(metadata, reward);
            }
        }

        let feedback = FeedbackRecord::new(trace_id, rating, feedback_type, comments, reward);
        if let Some(collector) = &self.feedback {
            if let Err(e) = collector.record(&feedback).await {
                error!(error = %e, "Failed to store feedback");
            }
        }

        info!(rating, reward, "Feedback applied");
        true
    }

    /// Flush the policy snapshot and pending traces
    pub async fn shutdown(&self) {
        self.policy.shutdown().await;
        self.recorder.shutdown().await;
    }
}

fn validate(context: &CompositionContext<'_>) -> Result<()> {
    if context.extractive_answer.trim().is_empty() {
        return Err(ComposerError::InvalidInput(
            "extractive answer is empty".to_string(),
        ));
    }
    if context.chunks.is_empty() {
        return Err(ComposerError::InvalidInput(
            "no source chunks supplied".to_string(),
        ));
    }
    Ok(())
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn error_fallback(
    trace_id: &str,
    context: &CompositionContext<'_>,
    error: &ComposerError,
    started: Instant,
) -> CompositionResult {
    CompositionResult {
        trace_id: trace_id.to_string(),
        final_text: context.extractive_answer.to_string(),
        strategy_id: ERROR_FALLBACK_ID.to_string(),
        strategy: None,
        grounding: GroundingResult::degenerate("composition aborted"),
        attempts: 1,
        reward: 0.0,
        policy_metadata: None,
        policy_overridden: false,
        citations: Citation::from_chunks(context.chunks),
        composition_time_ms: elapsed_ms(started),
        lang: context.lang,
        method: CompositionMethod::ErrorFallback,
        error: Some(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::config::PolicyConfig;
    use crate::feedback::{FeedbackLog, InMemoryFeedbackLog};
    use crate::strategy::{ContextKey, PolicySnapshot, SelectionMethod};

    const CHUNK: &str = "Meditation is a spiritual practice that brings inner peace and wisdom.";
    const OFF_TOPIC: &str = "Cooking recipes involve various ingredients.";

    /// Returns fixed text and remembers what it was asked to render
    struct FixedRenderer {
        text: String,
        rendered: Arc<Mutex<Vec<Strategy>>>,
    }

    impl FixedRenderer {
        fn new(text: &str) -> (Self, Arc<Mutex<Vec<Strategy>>>) {
            let rendered = Arc::new(Mutex::new(Vec::new()));
            let renderer = Self {
                text: text.to_string(),
                rendered: Arc::clone(&rendered),
            };
            (renderer, rendered)
        }
    }

    impl TemplateRenderer for FixedRenderer {
        fn render(&self, strategy: Strategy, _context: &CompositionContext<'_>) -> Result<String> {
            self.rendered.lock().unwrap().push(strategy);
            Ok(self.text.clone())
        }
    }

    struct FailingRenderer;

    impl TemplateRenderer for FailingRenderer {
        fn render(&self, _strategy: Strategy, _context: &CompositionContext<'_>) -> Result<String> {
            Err(ComposerError::Render("template missing".to_string()))
        }
    }

    struct PassThrough;

    impl Smoother for PassThrough {
        fn smooth(&self, text: &str, _lang: Lang) -> Result<String> {
            Ok(text.to_string())
        }
    }

    struct FailingSmoother;

    impl Smoother for FailingSmoother {
        fn smooth(&self, _text: &str, _lang: Lang) -> Result<String> {
            Err(ComposerError::Render("phrase table unreadable".to_string()))
        }
    }

    struct FailingEnhancer;

    impl Enhancer for FailingEnhancer {
        fn is_available(&self) -> bool {
            true
        }

        fn enhance(&self, _text: &str, _context: &CompositionContext<'_>) -> Result<String> {
            Err(ComposerError::Enhancement("model unavailable".to_string()))
        }
    }

    fn greedy_config() -> PolicyConfig {
        PolicyConfig {
            initial_epsilon: 0.0,
            min_epsilon: 0.0,
            seed: Some(7),
            ..PolicyConfig::default()
        }
    }

    fn composer_with(policy: StrategyPolicy, renderer: impl TemplateRenderer + 'static) -> Composer {
        Composer::new(
            &ComposerConfig::default(),
            Arc::new(policy),
            Arc::new(TraceRecorder::detached()),
        )
        .with_renderer(renderer)
        .with_smoother(PassThrough)
    }

    fn chunks() -> Vec<SourceChunk> {
        vec![SourceChunk::new(CHUNK, "Yoga Sutras", 0.9)]
    }

    #[test]
    fn test_empty_input_returns_error_fallback() {
        let composer = composer_with(StrategyPolicy::new(greedy_config()), BuiltinTemplates::new());

        let result = composer.compose("trace-empty", "", &[], Lang::En);

        assert!(!result.grounded());
        assert_eq!(result.final_text, "");
        assert_eq!(result.strategy_id, ERROR_FALLBACK_ID);
        assert_eq!(result.method, CompositionMethod::ErrorFallback);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.reward, 0.0);
        assert!(result.error.as_deref().unwrap().contains("extractive answer is empty"));
        assert_eq!(result.trace_id, "trace-empty");
    }

    #[test]
    fn test_missing_chunks_keeps_answer() {
        let composer = composer_with(StrategyPolicy::new(greedy_config()), BuiltinTemplates::new());

        let result = composer.compose("t", "Meditation brings peace.", &[], Lang::En);

        assert_eq!(result.final_text, "Meditation brings peace.");
        assert!(result.error.as_deref().unwrap().contains("no source chunks"));
        assert_eq!(composer.policy().stats().total_actions, 0);
    }

    #[test]
    fn test_grounded_first_attempt_updates_policy() {
        let (renderer, rendered) = FixedRenderer::new(CHUNK);
        let composer = composer_with(StrategyPolicy::new(greedy_config()), renderer);
        let chunks = chunks();

        let result = composer.compose("t-1", "Meditation brings peace.", &chunks, Lang::En);

        assert!(result.grounded());
        assert_eq!(result.attempts, 1);
        assert_eq!(result.strategy, Some(Strategy::Explain));
        assert_eq!(result.strategy_id, "explain_en");
        assert!(!result.policy_overridden);
        assert!(result.reward > 0.4 && result.reward <= 1.0);
        assert_eq!(*rendered.lock().unwrap(), vec![Strategy::Explain]);
        assert_eq!(result.citations.len(), 1);

        let metadata = result.policy_metadata.unwrap();
        assert_eq!(metadata.selection_method, SelectionMethod::ExploitationDefault);
        let q = composer
            .policy()
            .q_value(&metadata.context_key, Strategy::Explain)
            .unwrap();
        assert!(q > 0.0);
    }

    #[test]
    fn test_unsuitable_compare_is_overridden() {
        let chunks = chunks();
        let answer = "Meditation brings peace.";
        let key = ContextKey::from_context(&CompositionContext::new(answer, &chunks, Lang::En));

        let mut snapshot = PolicySnapshot {
            epsilon: 0.0,
            ..PolicySnapshot::default()
        };
        snapshot
            .q_values
            .entry(key.clone())
            .or_default()
            .insert(Strategy::Compare, 0.9);

        let (renderer, rendered) = FixedRenderer::new(CHUNK);
        let composer = composer_with(
            StrategyPolicy::from_snapshot(greedy_config(), snapshot),
            renderer,
        );

        let result = composer.compose("t-5", answer, &chunks, Lang::En);

        assert!(result.policy_overridden);
        assert_eq!(result.policy_metadata.as_ref().unwrap().strategy, Strategy::Compare);
        assert_eq!(result.strategy, Some(Strategy::Explain));
        assert!(!rendered.lock().unwrap().contains(&Strategy::Compare));

        // overridden selections earn no reward
        let policy = composer.policy();
        assert_eq!(policy.q_value(&key, Strategy::Compare), Some(0.9));
        assert_eq!(policy.q_value(&key, Strategy::Explain), None);
    }

    #[test]
    fn test_three_failures_end_with_improved_extractive() {
        let (renderer, rendered) = FixedRenderer::new(OFF_TOPIC);
        let composer = composer_with(StrategyPolicy::new(greedy_config()), renderer);
        let chunks = chunks();

        let result = composer.compose("t-6", "Meditation brings peace.", &chunks, Lang::En);

        assert_eq!(result.attempts, 3);
        assert_eq!(result.strategy_id, "extractive_en+improved");
        assert_eq!(result.strategy, Some(Strategy::Extractive));
        assert!(result.final_text.starts_with(OFF_TOPIC));
        assert!(result.final_text.contains("meditation"));
        assert_eq!(
            *rendered.lock().unwrap(),
            vec![Strategy::Explain, Strategy::Extractive]
        );
        let rescored = composer.scorer().verify(&result.final_text, &chunks);
        assert_eq!(result.grounded(), rescored.grounded);
    }

    #[test]
    fn test_attempt_budget_from_config() {
        let mut config = ComposerConfig::default();
        config.composer.max_attempts = 1;
        let (renderer, _) = FixedRenderer::new(OFF_TOPIC);
        let composer = Composer::new(
            &config,
            Arc::new(StrategyPolicy::new(greedy_config())),
            Arc::new(TraceRecorder::detached()),
        )
        .with_renderer(renderer)
        .with_smoother(PassThrough);

        let result = composer.compose("t", "Meditation brings peace.", &chunks(), Lang::En);

        assert_eq!(result.attempts, 1);
        assert!(!result.grounded());
        assert_eq!(result.strategy_id, "explain_en");
    }

    #[test]
    fn test_render_failure_uses_minimal_template() {
        let composer = composer_with(StrategyPolicy::new(greedy_config()), FailingRenderer);
        let answer = "Meditation is a spiritual practice that brings peace.";

        let result = composer.compose("t", answer, &chunks(), Lang::En);

        assert!(result.error.is_none());
        assert_eq!(result.final_text, format!("{answer}\n\nSources: Yoga Sutras"));
        assert!(result.grounded());
    }

    #[test]
    fn test_smoother_failure_uses_minimal_template() {
        let (renderer, rendered) = FixedRenderer::new(CHUNK);
        let composer = composer_with(StrategyPolicy::new(greedy_config()), renderer)
            .with_smoother(FailingSmoother);
        let answer = "Meditation is a spiritual practice that brings peace.";

        let result = composer.compose("t", answer, &chunks(), Lang::En);

        assert!(result.error.is_none());
        assert_eq!(rendered.lock().unwrap().len(), 1);
        assert_eq!(result.final_text, format!("{answer}\n\nSources: Yoga Sutras"));
        assert_eq!(result.attempts, 1);
    }

    #[test]
    fn test_enhancer_failure_keeps_rendered_text() {
        let (renderer, _) = FixedRenderer::new(CHUNK);
        let composer = composer_with(StrategyPolicy::new(greedy_config()), renderer)
            .with_enhancer(FailingEnhancer);

        let result = composer.compose("t", "Meditation brings peace.", &chunks(), Lang::En);

        assert_eq!(result.final_text, CHUNK);
        assert_eq!(result.method, CompositionMethod::Enhanced);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_builtin_pipeline_produces_grounded_text() {
        let composer = Composer::new(
            &ComposerConfig::default(),
            Arc::new(StrategyPolicy::new(greedy_config())),
            Arc::new(TraceRecorder::detached()),
        );
        let chunks = vec![
            SourceChunk::new(CHUNK, "Yoga Sutras", 0.9),
            SourceChunk::new(
                "Regular meditation practice cultivates wisdom and inner peace.",
                "Gita",
                0.8,
            ),
        ];

        let result = composer.compose(
            "t-builtin",
            "Meditation is a spiritual practice that brings inner peace.",
            &chunks,
            Lang::En,
        );

        assert!(result.error.is_none());
        assert!(!result.final_text.is_empty());
        assert!(result.attempts >= 1 && result.attempts <= 3);
        assert!((0.0..=1.0).contains(&result.reward));
        assert_eq!(result.method, CompositionMethod::NgramTemplate);
    }

    #[test]
    fn test_every_composition_is_traced() {
        let (renderer, _) = FixedRenderer::new(CHUNK);
        let composer = composer_with(StrategyPolicy::new(greedy_config()), renderer);

        composer.compose("ok", "Meditation brings peace.", &chunks(), Lang::En);
        composer.compose("bad", "", &[], Lang::En);

        let summary = composer.recorder().performance();
        assert_eq!(summary.total_compositions, 2);
        assert_eq!(summary.failed_compositions, 1);
    }

    #[test]
    fn test_concurrent_compositions_share_policy() {
        let (renderer, _) = FixedRenderer::new(CHUNK);
        let composer = composer_with(StrategyPolicy::new(greedy_config()), renderer);
        let chunks = chunks();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let composer = &composer;
                let chunks = &chunks;
                scope.spawn(move || {
                    composer.compose(&format!("t-{i}"), "Meditation brings peace.", chunks, Lang::En);
                });
            }
        });

        let stats = composer.policy().stats();
        assert_eq!(stats.total_actions, 8);
        assert_eq!(stats.action_distribution.values().sum::<u64>(), 8);
    }

    #[tokio::test]
    async fn test_feedback_updates_policy_and_log() {
        let (renderer, _) = FixedRenderer::new(CHUNK);
        let log = Arc::new(InMemoryFeedbackLog::new());
        let composer = composer_with(StrategyPolicy::new(greedy_config()), renderer)
            .with_feedback(FeedbackCollector::new(log.clone()));

        let result = composer.compose("t-fb", "Meditation brings peace.", &chunks(), Lang::En);
        let key = result.policy_metadata.as_ref().unwrap().context_key.clone();
        let q_before = composer.policy().q_value(&key, Strategy::Explain).unwrap();

        assert!(
            composer
                .submit_feedback("t-fb", 5, FeedbackType::Helpfulness, Some("clear".into()))
                .await
        );

        let q_after = composer.policy().q_value(&key, Strategy::Explain).unwrap();
        assert!(q_after > q_before);

        let stored = log.read_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].trace_id, "t-fb");
        assert_eq!(stored[0].feedback_type, FeedbackType::Helpfulness);
        assert!((0.0..=1.0).contains(&stored[0].reward));
    }

    #[tokio::test]
    async fn test_feedback_rejections() {
        let (renderer, _) = FixedRenderer::new(CHUNK);
        let log = Arc::new(InMemoryFeedbackLog::new());
        let composer = composer_with(StrategyPolicy::new(greedy_config()), renderer)
            .with_feedback(FeedbackCollector::new(log.clone()));
        composer.compose("known", "Meditation brings peace.", &chunks(), Lang::En);

        assert!(!composer.submit_feedback("known", 0, FeedbackType::Quality, None).await);
        assert!(!composer.submit_feedback("known", 6, FeedbackType::Quality, None).await);
        assert!(!composer.submit_feedback("unknown", 4, FeedbackType::Quality, None).await);
        assert!(log.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feedback_on_error_fallback_leaves_policy_alone() {
        let composer = composer_with(StrategyPolicy::new(greedy_config()), BuiltinTemplates::new());
        composer.compose("failed", "", &[], Lang::En);

        assert!(composer.submit_feedback("failed", 1, FeedbackType::Overall, None).await);
        assert_eq!(composer.policy().stats().contexts_learned, 0);
    }
}
