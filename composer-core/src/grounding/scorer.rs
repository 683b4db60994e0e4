//! Lexical-overlap grounding verification

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tokenize::{
    concepts, contains_devanagari, content_tokens, content_tokens_in_order, split_sentences,
};
use crate::config::GroundingConfig;
use crate::types::SourceChunk;

/// Concept-overlap score used when the candidate names no concepts
const NEUTRAL_SEMANTIC_SCORE: f64 = 0.5;

/// Chunks considered by the concept score
const SEMANTIC_CHUNKS: usize = 3;

/// Chunks mined for missing tokens by [`GroundingScorer::improve`]
const IMPROVE_CHUNKS: usize = 2;

/// Tokens named in an improvement clause
const IMPROVE_TOKENS: usize = 3;

/// Overlap between the candidate and one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkCoverage {
    /// Position of the chunk in the input
    pub chunk_index: usize,
    pub source: String,
    pub overlap_count: usize,
    pub overlap_ratio: f64,
}

/// Outcome of one verification call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingResult {
    pub grounded: bool,
    /// Blended lexical and concept score in `[0, 1]`
    pub score: f64,
    pub overlapping_tokens: BTreeSet<String>,
    pub overlap_count: usize,
    pub overlap_ratio: f64,
    pub content_token_count: usize,
    pub lexical_score: f64,
    pub semantic_score: f64,
    pub chunk_coverage: Vec<ChunkCoverage>,
    /// Why verification short-circuited, for degenerate input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GroundingResult {
    /// Ungrounded result with a zero score
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self {
            grounded: false,
            score: 0.0,
            overlapping_tokens: BTreeSet::new(),
            overlap_count: 0,
            overlap_ratio: 0.0,
            content_token_count: 0,
            lexical_score: 0.0,
            semantic_score: 0.0,
            chunk_coverage: Vec::new(),
            reason: Some(reason.into()),
        }
    }
}

/// Grounding verdict for one sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceCheck {
    pub index: usize,
    pub sentence: String,
    pub grounded: bool,
}

/// Per-sentence audit of a text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceReport {
    pub all_grounded: bool,
    pub grounded_sentences: usize,
    pub total_sentences: usize,
    pub grounding_ratio: f64,
    pub sentences: Vec<SentenceCheck>,
}

/// Scores how well a candidate text is supported by source chunks.
///
/// Stateless apart from its thresholds; safe to share between threads.
#[derive(Debug, Clone, Default)]
pub struct GroundingScorer {
    config: GroundingConfig,
}

impl GroundingScorer {
    pub fn new(config: GroundingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GroundingConfig {
        &self.config
    }

    /// Verify `candidate` against `chunks`
    pub fn verify(&self, candidate: &str, chunks: &[SourceChunk]) -> GroundingResult {
        if candidate.trim().is_empty() || chunks.is_empty() {
            return GroundingResult::degenerate("empty input");
        }

        let candidate_tokens = content_tokens(candidate);
        if candidate_tokens.is_empty() {
            return GroundingResult::degenerate("no content tokens found");
        }
        let candidate_count = candidate_tokens.len() as f64;

        let mut overlapping = BTreeSet::new();
        let mut coverage = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            if chunk.text.is_empty() {
                continue;
            }
            let chunk_tokens = content_tokens(&chunk.text);
            let shared: Vec<&String> = candidate_tokens.intersection(&chunk_tokens).collect();

            coverage.push(ChunkCoverage {
                chunk_index: index,
                source: chunk.source.clone(),
                overlap_count: shared.len(),
                overlap_ratio: shared.len() as f64 / candidate_count,
            });
            overlapping.extend(shared.into_iter().cloned());
        }

        let overlap_count = overlapping.len();
        let overlap_ratio = overlap_count as f64 / candidate_count;
        let grounded =
            overlap_count >= self.config.min_tokens && overlap_ratio >= self.config.min_ratio;

        let lexical_score = self.lexical_score(overlap_count, overlap_ratio, &coverage);
        let semantic_score = semantic_score(candidate, chunks);
        let score = (lexical_score * self.config.lexical_weight
            + semantic_score * self.config.semantic_weight)
            .clamp(0.0, 1.0);

        debug!(
            grounded,
            score, overlap_count, overlap_ratio, "Grounding verification"
        );

        GroundingResult {
            grounded,
            score,
            overlapping_tokens: overlapping,
            overlap_count,
            overlap_ratio,
            content_token_count: candidate_tokens.len(),
            lexical_score,
            semantic_score,
            chunk_coverage: coverage,
            reason: None,
        }
    }

    fn lexical_score(&self, overlap_count: usize, ratio: f64, coverage: &[ChunkCoverage]) -> f64 {
        if coverage.is_empty() {
            return 0.0;
        }

        let base = if self.config.min_ratio > 0.0 {
            (ratio / self.config.min_ratio).min(1.0)
        } else {
            1.0
        };

        let token_bonus = if overlap_count >= self.config.min_tokens {
            0.2
        } else {
            0.0
        };

        let covered = coverage.iter().filter(|c| c.overlap_count > 0).count();
        let spread_bonus = if covered > 1 {
            ((covered - 1) as f64 * 0.1).min(0.2)
        } else {
            0.0
        };

        let sparse_penalty = if ratio < 0.1 { 0.3 } else { 0.0 };

        (base + token_bonus + spread_bonus - sparse_penalty).clamp(0.0, 1.0)
    }

    /// True when the sentence shares a content token with any chunk
    pub fn check_sentence(&self, sentence: &str, chunks: &[SourceChunk]) -> bool {
        let tokens = content_tokens(sentence);
        if tokens.is_empty() {
            return false;
        }
        chunks.iter().any(|chunk| {
            let chunk_tokens = content_tokens(&chunk.text);
            !tokens.is_disjoint(&chunk_tokens)
        })
    }

    /// Audit every sentence of `text` with [`Self::check_sentence`]
    pub fn verify_sentences(&self, text: &str, chunks: &[SourceChunk]) -> SentenceReport {
        let sentences: Vec<SentenceCheck> = split_sentences(text)
            .into_iter()
            .enumerate()
            .map(|(index, sentence)| SentenceCheck {
                index,
                sentence: sentence.to_string(),
                grounded: self.check_sentence(sentence, chunks),
            })
            .collect();

        let total = sentences.len();
        let grounded = sentences.iter().filter(|s| s.grounded).count();

        SentenceReport {
            all_grounded: total > 0 && grounded == total,
            grounded_sentences: grounded,
            total_sentences: total,
            grounding_ratio: if total > 0 {
                grounded as f64 / total as f64
            } else {
                0.0
            },
            sentences,
        }
    }

    /// Append a clause naming source tokens missing from `text`.
    ///
    /// Grounded text, or text with nothing to add, is returned unchanged.
    pub fn improve(&self, text: &str, chunks: &[SourceChunk]) -> String {
        if self.verify(text, chunks).grounded {
            return text.to_string();
        }

        let present = content_tokens(text);
        let mut missing: Vec<String> = Vec::new();
        for chunk in chunks.iter().take(IMPROVE_CHUNKS) {
            for token in content_tokens_in_order(&chunk.text) {
                if !present.contains(&token) && !missing.contains(&token) {
                    missing.push(token);
                }
            }
        }

        if missing.is_empty() {
            return text.to_string();
        }

        let named = missing
            .iter()
            .take(IMPROVE_TOKENS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let base = text.trim_end();
        if contains_devanagari(text) {
            format!("{base} यह {named} जैसी अवधारणाओं से संबंधित है।")
        } else {
            format!("{base} This relates to concepts like {named}.")
        }
    }
}

/// Share of candidate concepts found in the leading chunks
fn semantic_score(candidate: &str, chunks: &[SourceChunk]) -> f64 {
    let candidate_concepts = concepts(candidate);
    if candidate_concepts.is_empty() {
        return NEUTRAL_SEMANTIC_SCORE;
    }

    let total = candidate_concepts.len() as f64;
    let sum: f64 = chunks
        .iter()
        .take(SEMANTIC_CHUNKS)
        .map(|chunk| {
            let chunk_concepts = concepts(&chunk.text);
            candidate_concepts.intersection(&chunk_concepts).count() as f64 / total
        })
        .sum();

    (sum / SEMANTIC_CHUNKS as f64).min(1.0)
}
