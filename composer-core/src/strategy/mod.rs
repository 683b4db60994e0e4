//! Strategy selection for composition
//!
//! A contextual epsilon-greedy bandit learns which presentation strategy
//! works best per discretised context. A deterministic content selector
//! stands in whenever the bandit's pick does not fit the content.

mod policy;
mod selector;
mod snapshot;
mod types;

pub use policy::{BestAction, PolicyStats, StrategyPolicy};
pub use selector::{
    COMPARE_MIN_CHUNKS, EXAMPLE_MIN_ANSWER_CHARS, content_score, is_suitable, select_by_content,
};
pub use snapshot::{
    InMemorySnapshotStore, JsonFileSnapshotStore, PolicySnapshot, PolicySnapshotStore,
    SnapshotWriter,
};
pub use types::*;
