//! Tokenization into content tokens
//!
//! Text is lowercased and stripped of ASCII punctuation. Text containing any
//! Devanagari yields maximal runs of Devanagari letters and marks; other text
//! yields word-bounded runs of `a-z`. Tokens of one character are dropped.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::lexicon::{CONCEPT_VOCABULARY, Script};

static LATIN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]+\b").expect("latin token pattern is valid"));

// Devanagari block minus the danda (U+0964) and double danda (U+0965)
static DEVANAGARI_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{0900}-\x{0963}\x{0966}-\x{097F}]+").expect("devanagari pattern is valid")
});

static CAPITALISED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("capitalised word pattern is valid"));

/// Whether any character falls in the Devanagari block
pub fn contains_devanagari(text: &str) -> bool {
    text.chars().any(is_devanagari)
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

/// Unique tokens in order of first appearance
pub fn tokens_in_order(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    let pattern = if contains_devanagari(&normalized) {
        &*DEVANAGARI_TOKEN
    } else {
        &*LATIN_TOKEN
    };

    let mut seen = BTreeSet::new();
    pattern
        .find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| token.chars().count() > 1)
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect()
}

/// Token set of a text
pub fn tokenize(text: &str) -> BTreeSet<String> {
    tokens_in_order(text).into_iter().collect()
}

/// Script whose stopwords apply, inferred from the tokens themselves
pub fn script_of<'a>(tokens: impl IntoIterator<Item = &'a String>) -> Script {
    if tokens.into_iter().any(|t| contains_devanagari(t)) {
        Script::Devanagari
    } else {
        Script::Latin
    }
}

/// Tokens of a text minus the stopwords of its script, in order of appearance
pub fn content_tokens_in_order(text: &str) -> Vec<String> {
    let tokens = tokens_in_order(text);
    let stopwords = script_of(&tokens).stopwords();
    tokens
        .into_iter()
        .filter(|t| !stopwords.contains(t.as_str()))
        .collect()
}

/// Content token set of a text
pub fn content_tokens(text: &str) -> BTreeSet<String> {
    content_tokens_in_order(text).into_iter().collect()
}

/// Vocabulary concepts and capitalised words found in a text
pub fn concepts(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    let mut found: BTreeSet<String> = CONCEPT_VOCABULARY
        .iter()
        .filter(|concept| lower.contains(*concept))
        .map(|concept| concept.to_string())
        .collect();

    found.extend(
        CAPITALISED_WORD
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase()),
    );
    found
}

/// Split text on sentence terminators, dropping empty pieces
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?', '।'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
