//! Contextual epsilon-greedy bandit over composition strategies
//!
//! All mutable state sits behind one mutex; `select` and `update` each take
//! it exactly once, so concurrent requests never lose an update.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::snapshot::{PolicySnapshot, PolicySnapshotStore, SnapshotWriter};
use super::types::{ActionMetadata, ContextKey, SelectionMethod, Strategy};
use crate::config::PolicyConfig;
use crate::types::CompositionContext;

/// Rewards averaged when adapting epsilon
const EPSILON_WINDOW: usize = 10;

/// Reward above which an update counts as a success
const SUCCESS_REWARD: f64 = 0.7;

/// Best recorded strategy for one context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestAction {
    pub strategy: Strategy,
    pub q_value: f64,
}

/// Summary of the policy's learning so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStats {
    pub total_actions: u64,
    pub successful_actions: u64,
    pub success_rate: f64,
    pub epsilon: f64,
    pub contexts_learned: usize,
    pub average_reward: f64,
    /// Mean of the most recent rewards
    pub recent_performance: f64,
    pub action_distribution: BTreeMap<Strategy, u64>,
    pub best_actions: BTreeMap<ContextKey, BestAction>,
}

struct PolicyState {
    q_values: BTreeMap<ContextKey, BTreeMap<Strategy, f64>>,
    action_counts: BTreeMap<ContextKey, BTreeMap<Strategy, u64>>,
    epsilon: f64,
    total_actions: u64,
    successful_actions: u64,
    reward_history: VecDeque<f64>,
    action_history: VecDeque<Strategy>,
    updates: u64,
    rng: StdRng,
}

impl PolicyState {
    fn from_snapshot(config: &PolicyConfig, snapshot: PolicySnapshot) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut state = Self {
            q_values: snapshot.q_values,
            action_counts: snapshot.action_counts,
            epsilon: config.clamp_epsilon(snapshot.epsilon),
            total_actions: snapshot.total_actions,
            successful_actions: snapshot.successful_actions,
            reward_history: snapshot.reward_history.into(),
            action_history: snapshot.action_history.into(),
            updates: 0,
            rng,
        };
        state.trim_histories(config.history_capacity);
        state
    }

    fn trim_histories(&mut self, capacity: usize) {
        while self.reward_history.len() > capacity {
            self.reward_history.pop_front();
        }
        while self.action_history.len() > capacity {
            self.action_history.pop_front();
        }
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            q_values: self.q_values.clone(),
            action_counts: self.action_counts.clone(),
            epsilon: self.epsilon,
            total_actions: self.total_actions,
            successful_actions: self.successful_actions,
            reward_history: self.reward_history.iter().copied().collect(),
            action_history: self.action_history.iter().copied().collect(),
        }
    }

    fn q_value(&self, key: &ContextKey, strategy: Strategy) -> f64 {
        self.q_values
            .get(key)
            .and_then(|values| values.get(&strategy))
            .copied()
            .unwrap_or(0.0)
    }

    /// Highest recorded value, ties resolved by declaration order
    fn best_recorded(values: &BTreeMap<Strategy, f64>) -> Option<BestAction> {
        let mut best: Option<BestAction> = None;
        for strategy in Strategy::all() {
            let Some(&q_value) = values.get(strategy) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| q_value > b.q_value) {
                best = Some(BestAction {
                    strategy: *strategy,
                    q_value,
                });
            }
        }
        best
    }

    fn recent_mean(&self, window: usize) -> Option<f64> {
        if self.reward_history.is_empty() {
            return None;
        }
        let take = window.min(self.reward_history.len());
        let sum: f64 = self.reward_history.iter().rev().take(take).sum();
        Some(sum / take as f64)
    }
}

/// Strategy policy shared by every composition of a host process
pub struct StrategyPolicy {
    config: PolicyConfig,
    state: Mutex<PolicyState>,
    writer: Option<SnapshotWriter>,
}

impl StrategyPolicy {
    /// Fresh policy: empty table, initial epsilon, no persistence
    pub fn new(config: PolicyConfig) -> Self {
        let snapshot = PolicySnapshot {
            epsilon: config.initial_epsilon,
            ..PolicySnapshot::default()
        };
        Self::from_snapshot(config, snapshot)
    }

    /// Policy resuming from a snapshot
    pub fn from_snapshot(config: PolicyConfig, snapshot: PolicySnapshot) -> Self {
        let state = PolicyState::from_snapshot(&config, snapshot);
        Self {
            config,
            state: Mutex::new(state),
            writer: None,
        }
    }

    /// Load the stored snapshot and persist through the same store.
    ///
    /// A failed load is logged and the policy starts fresh.
    pub async fn load(config: PolicyConfig, store: Arc<dyn PolicySnapshotStore>) -> Self {
        let policy = match store.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    contexts = snapshot.q_values.len(),
                    total_actions = snapshot.total_actions,
                    "Loaded policy snapshot"
                );
                Self::from_snapshot(config, snapshot)
            }
            Ok(None) => {
                debug!("No policy snapshot found, starting fresh");
                Self::new(config)
            }
            Err(e) => {
                error!(error = %e, "Failed to load policy snapshot, starting fresh");
                Self::new(config)
            }
        };
        policy.with_writer(SnapshotWriter::spawn(store))
    }

    /// Persist snapshots through `writer`
    pub fn with_writer(mut self, writer: SnapshotWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, PolicyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Choose a strategy for `context`
    pub fn select(&self, context: &CompositionContext<'_>) -> (Strategy, ActionMetadata) {
        let key = ContextKey::from_context(context);
        let mut state = self.lock();
        let epsilon = state.epsilon;

        let (strategy, method) = if state.rng.r#gen::<f64>() < epsilon {
            let all = Strategy::all();
            let index = state.rng.gen_range(0..all.len());
            (all[index], SelectionMethod::Exploration)
        } else {
            match state.q_values.get(&key).and_then(PolicyState::best_recorded) {
                Some(best) => (best.strategy, SelectionMethod::Exploitation),
                None => (Strategy::Explain, SelectionMethod::ExploitationDefault),
            }
        };

        let count = state
            .action_counts
            .entry(key.clone())
            .or_default()
            .entry(strategy)
            .or_insert(0);
        *count += 1;
        let action_count = *count;
        state.total_actions += 1;

        let metadata = ActionMetadata {
            q_value: state.q_value(&key, strategy),
            context_key: key,
            strategy,
            selection_method: method,
            action_count,
            epsilon,
            timestamp: Utc::now(),
        };

        debug!(
            context_key = %metadata.context_key,
            strategy = %strategy,
            method = %method,
            "Strategy selected"
        );

        (strategy, metadata)
    }

    /// Apply a reward to the selection described by `metadata`
    pub fn update(&self, metadata: &ActionMetadata, reward: f64) {
        let reward = reward.clamp(0.0, 1.0);
        let capacity = self.config.history_capacity;

        let pending_snapshot = {
            let mut state = self.lock();

            let q = state
                .q_values
                .entry(metadata.context_key.clone())
                .or_default()
                .entry(metadata.strategy)
                .or_insert(0.0);
            let old_q = *q;
            *q = old_q + self.config.learning_rate * (reward - old_q);
            let new_q = *q;

            state.reward_history.push_back(reward);
            state.action_history.push_back(metadata.strategy);
            state.trim_histories(capacity);

            if reward > SUCCESS_REWARD {
                state.successful_actions += 1;
            }

            self.adapt_epsilon(&mut state);
            state.updates += 1;

            info!(
                context_key = %metadata.context_key,
                strategy = %metadata.strategy,
                reward,
                old_q,
                new_q,
                epsilon = state.epsilon,
                "Policy updated"
            );

            let every = self.config.snapshot_every.max(1);
            (self.writer.is_some() && state.updates % every == 0).then(|| state.snapshot())
        };

        if let (Some(snapshot), Some(writer)) = (pending_snapshot, &self.writer) {
            writer.submit(snapshot);
        }
    }

    fn adapt_epsilon(&self, state: &mut PolicyState) {
        if state.reward_history.len() < EPSILON_WINDOW {
            return;
        }
        let Some(recent) = state.recent_mean(EPSILON_WINDOW) else {
            return;
        };

        if recent > 0.8 {
            state.epsilon = (state.epsilon * 0.99).max(self.config.min_epsilon);
        } else if recent < 0.5 {
            state.epsilon = (state.epsilon * 1.01).min(self.config.max_epsilon);
        }
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        self.lock().epsilon
    }

    /// Recorded value for `strategy` in `key`, if any
    pub fn q_value(&self, key: &ContextKey, strategy: Strategy) -> Option<f64> {
        self.lock()
            .q_values
            .get(key)
            .and_then(|values| values.get(&strategy))
            .copied()
    }

    /// Copy of the full state
    pub fn snapshot(&self) -> PolicySnapshot {
        self.lock().snapshot()
    }

    pub fn stats(&self) -> PolicyStats {
        let state = self.lock();

        let mut action_distribution = BTreeMap::new();
        for strategy in &state.action_history {
            *action_distribution.entry(*strategy).or_insert(0) += 1;
        }

        let best_actions = state
            .q_values
            .iter()
            .filter_map(|(key, values)| {
                PolicyState::best_recorded(values).map(|best| (key.clone(), best))
            })
            .collect();

        let history_len = state.reward_history.len();
        let average_reward = if history_len > 0 {
            state.reward_history.iter().sum::<f64>() / history_len as f64
        } else {
            0.0
        };

        PolicyStats {
            total_actions: state.total_actions,
            successful_actions: state.successful_actions,
            success_rate: state.successful_actions as f64 / state.total_actions.max(1) as f64,
            epsilon: state.epsilon,
            contexts_learned: state.q_values.len(),
            average_reward,
            recent_performance: state.recent_mean(EPSILON_WINDOW).unwrap_or(0.0),
            action_distribution,
            best_actions,
        }
    }

    /// Queue a final snapshot and wait for the writer to drain
    pub async fn shutdown(&self) {
        if let Some(writer) = &self.writer {
            writer.submit(self.snapshot());
            writer.shutdown().await;
        }
    }
}
