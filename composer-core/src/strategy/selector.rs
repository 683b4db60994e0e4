//! Deterministic content-based strategy selection
//!
//! Used when the bandit picks a strategy the content cannot support.

use super::types::Strategy;
use crate::types::CompositionContext;

/// Minimum chunks for a comparison
pub const COMPARE_MIN_CHUNKS: usize = 2;

/// Minimum answer length, in characters, for an example
pub const EXAMPLE_MIN_ANSWER_CHARS: usize = 30;

/// Chunks scanned for keyword signals
const SIGNAL_CHUNKS: usize = 3;

/// Weight of a keyword found in chunk text rather than the answer
const CHUNK_SIGNAL_WEIGHT: f64 = 0.5;

const EXPLAIN_KEYWORDS: &[&str] = &[
    "what", "how", "why", "क्या", "कैसे", "क्यों", "explain", "meaning", "definition",
];

const COMPARE_KEYWORDS: &[&str] = &[
    "different", "compare", "versus", "vs", "अंतर", "तुलना", "difference", "contrast",
];

const EXAMPLE_KEYWORDS: &[&str] = &[
    "example", "instance", "for example", "such as", "उदाहरण", "जैसे", "like",
];

/// Whether `strategy` can be rendered for this content
pub fn is_suitable(strategy: Strategy, context: &CompositionContext<'_>) -> bool {
    match strategy {
        Strategy::Compare => context.chunks.len() >= COMPARE_MIN_CHUNKS,
        Strategy::Example => context.answer_chars() >= EXAMPLE_MIN_ANSWER_CHARS,
        Strategy::Explain | Strategy::Extractive => true,
    }
}

fn keywords(strategy: Strategy) -> &'static [&'static str] {
    match strategy {
        Strategy::Explain => EXPLAIN_KEYWORDS,
        Strategy::Compare => COMPARE_KEYWORDS,
        Strategy::Example => EXAMPLE_KEYWORDS,
        Strategy::Extractive => &[],
    }
}

fn count_hits(words: &[&str], text: &str) -> usize {
    words.iter().filter(|word| text.contains(*word)).count()
}

/// Keyword score of `strategy` over the answer and leading chunks
pub fn content_score(strategy: Strategy, context: &CompositionContext<'_>) -> f64 {
    let answer = context.extractive_answer.to_lowercase();
    let chunk_text = context
        .chunks
        .iter()
        .take(SIGNAL_CHUNKS)
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let words = keywords(strategy);
    count_hits(words, &answer) as f64 + count_hits(words, &chunk_text) as f64 * CHUNK_SIGNAL_WEIGHT
}

/// Best suitable strategy by keyword signal.
///
/// Ties go to the earlier of EXPLAIN, COMPARE, EXAMPLE; no signal means
/// EXPLAIN.
pub fn select_by_content(context: &CompositionContext<'_>) -> Strategy {
    let mut best = Strategy::Explain;
    let mut best_score = 0.0;

    for strategy in [Strategy::Explain, Strategy::Compare, Strategy::Example] {
        if !is_suitable(strategy, context) {
            continue;
        }
        let score = content_score(strategy, context);
        if score > best_score {
            best = strategy;
            best_score = score;
        }
    }

    best
}
