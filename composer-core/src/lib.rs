//! Grounded answer composition
//!
//! Turns an extractive answer and its retrieved source chunks into a
//! presentable answer that stays lexically grounded in those sources:
//!
//! - [`grounding`]: token-overlap verification of composed text
//! - [`strategy`]: contextual bandit choosing a presentation strategy
//! - [`reward`]: reward signal for the bandit
//! - [`render`]: template, smoothing and enhancement collaborators
//! - [`compose`]: the [`Composer`] state machine tying them together
//! - [`trace`] and [`feedback`]: append-only logs and their summaries

pub mod compose;
pub mod config;
pub mod error;
pub mod feedback;
pub mod grounding;
mod jsonl;
pub mod paths;
pub mod render;
pub mod reward;
pub mod strategy;
pub mod trace;
pub mod types;

pub use compose::Composer;
pub use config::{
    ComposerConfig, GroundingConfig, MAX_ATTEMPTS, OrchestratorConfig, PolicyConfig,
    StorageConfig,
};
pub use error::{ComposerError, Result};
pub use feedback::{FeedbackCollector, FeedbackType};
pub use grounding::{GroundingResult, GroundingScorer};
pub use strategy::{Strategy, StrategyPolicy};
pub use trace::TraceRecorder;
pub use types::{Citation, CompositionMethod, CompositionResult, Lang, SourceChunk};
