//! Grounding verification
//!
//! A text is grounded when it shares enough content tokens (non-stopword
//! tokens) with its source chunks:
//!
//! - [`tokenize`]: script-aware tokenization and concept extraction
//! - [`scorer`]: [`GroundingScorer`] and its result types

mod lexicon;
pub mod scorer;
pub mod tokenize;

pub use lexicon::{CONCEPT_VOCABULARY, Script};
pub use scorer::{ChunkCoverage, GroundingResult, GroundingScorer, SentenceCheck, SentenceReport};
