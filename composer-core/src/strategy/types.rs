//! Strategy types for the composition bandit
//!
//! Defines the closed set of presentation strategies, the discretised
//! context key the policy learns over, and the metadata attached to each
//! selection.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CompositionContext, Lang};

/// Presentation mode for a composed answer
///
/// Declaration order is the tie-break order for exploitation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Explain,
    Compare,
    Example,
    /// Terminal fallback, always selectable
    Extractive,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explain => "explain",
            Self::Compare => "compare",
            Self::Example => "example",
            Self::Extractive => "extractive",
        }
    }

    /// All strategies for iteration
    pub fn all() -> &'static [Strategy] {
        &[Self::Explain, Self::Compare, Self::Example, Self::Extractive]
    }

    /// Template id for this strategy in `lang`, e.g. `explain_en`
    pub fn template_id(&self, lang: Lang) -> String {
        format!("{}_{}", self.as_str(), lang.suffix())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer-length bucket, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthBucket {
    Short,
    Medium,
    Long,
}

impl LengthBucket {
    pub fn from_chars(chars: usize) -> Self {
        match chars {
            0..50 => Self::Short,
            50..150 => Self::Medium,
            _ => Self::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

/// Chunk-count bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkBucket {
    Single,
    Few,
    Many,
}

impl ChunkBucket {
    pub fn from_count(count: usize) -> Self {
        match count {
            0..=1 => Self::Single,
            2..=3 => Self::Few,
            _ => Self::Many,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Few => "few",
            Self::Many => "many",
        }
    }
}

/// Discrete bandit state, e.g. `EN_short_few`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextKey(String);

impl ContextKey {
    pub fn new(lang: Lang, length: LengthBucket, chunks: ChunkBucket) -> Self {
        Self(format!(
            "{}_{}_{}",
            lang.as_str(),
            length.as_str(),
            chunks.as_str()
        ))
    }

    pub fn from_context(context: &CompositionContext<'_>) -> Self {
        Self::new(
            context.lang,
            LengthBucket::from_chars(context.answer_chars()),
            ChunkBucket::from_count(context.chunks.len()),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How the policy arrived at its choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMethod {
    /// Uniform random pick
    #[serde(rename = "exploration")]
    Exploration,
    /// Highest recorded value for the context
    #[serde(rename = "exploitation")]
    Exploitation,
    /// Context never rewarded, default strategy
    #[serde(rename = "exploitation-default")]
    ExploitationDefault,
}

impl SelectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Exploitation => "exploitation",
            Self::ExploitationDefault => "exploitation-default",
        }
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one policy selection, carried until its reward arrives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    pub context_key: ContextKey,
    pub strategy: Strategy,
    pub selection_method: SelectionMethod,
    /// Recorded value of `strategy` at selection time
    pub q_value: f64,
    /// Selections of `strategy` in this context, including this one
    pub action_count: u64,
    pub epsilon: f64,
    pub timestamp: DateTime<Utc>,
}
