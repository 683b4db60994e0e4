//! Request and result types shared across the composition pipeline

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grounding::GroundingResult;
use crate::strategy::{ActionMetadata, Strategy};

/// Strategy id reported when composition aborts
pub const ERROR_FALLBACK_ID: &str = "error_fallback";

/// Number of chunks cited in a result
pub const MAX_CITATIONS: usize = 3;

/// Characters of chunk text kept in a citation preview
pub const CITATION_PREVIEW_CHARS: usize = 100;

/// Language of the request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lang {
    #[default]
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "HI")]
    Hi,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "EN",
            Self::Hi => "HI",
        }
    }

    /// Lowercase suffix used in template ids
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EN" => Ok(Self::En),
            "HI" => Ok(Self::Hi),
            _ => Err(format!("unknown language: {s}")),
        }
    }
}

/// A retrieved passage supporting the answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    pub text: String,
    #[serde(default = "default_source")]
    pub source: String,
    /// Upstream retrieval confidence
    #[serde(default)]
    pub score: f64,
}

fn default_source() -> String {
    "Unknown".to_string()
}

impl SourceChunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            score,
        }
    }
}

/// Read-only view of one composition request
#[derive(Debug, Clone, Copy)]
pub struct CompositionContext<'a> {
    pub extractive_answer: &'a str,
    pub chunks: &'a [SourceChunk],
    pub lang: Lang,
}

impl<'a> CompositionContext<'a> {
    pub fn new(extractive_answer: &'a str, chunks: &'a [SourceChunk], lang: Lang) -> Self {
        Self {
            extractive_answer,
            chunks,
            lang,
        }
    }

    /// Answer length in characters
    pub fn answer_chars(&self) -> usize {
        self.extractive_answer.chars().count()
    }
}

/// Truncated reference to a source chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based position in the input order
    pub id: usize,
    pub source: String,
    pub text_preview: String,
    pub score: f64,
}

impl Citation {
    /// Citations for the first chunks in input order
    pub fn from_chunks(chunks: &[SourceChunk]) -> Vec<Self> {
        chunks
            .iter()
            .take(MAX_CITATIONS)
            .enumerate()
            .map(|(i, chunk)| Self {
                id: i + 1,
                source: chunk.source.clone(),
                text_preview: truncate_chars(&chunk.text, CITATION_PREVIEW_CHARS),
                score: chunk.score,
            })
            .collect()
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// How the final text was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionMethod {
    /// Template + smoothing + enhancement stage
    Enhanced,
    /// Template + smoothing, enhancement unavailable
    NgramTemplate,
    /// Composition aborted, extractive answer returned
    ErrorFallback,
}

impl CompositionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enhanced => "enhanced",
            Self::NgramTemplate => "ngram_template",
            Self::ErrorFallback => "error_fallback",
        }
    }
}

/// Outcome of one composition request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionResult {
    pub trace_id: String,
    pub final_text: String,
    /// Template id of the last rendered strategy, or `error_fallback`
    pub strategy_id: String,
    /// Strategy behind `final_text` (absent on error fallback)
    pub strategy: Option<Strategy>,
    /// Verification of `final_text`
    pub grounding: GroundingResult,
    /// Verification calls made
    pub attempts: u32,
    pub reward: f64,
    /// Bandit selection for this request
    pub policy_metadata: Option<ActionMetadata>,
    /// Bandit choice replaced by the content-based selector
    pub policy_overridden: bool,
    pub citations: Vec<Citation>,
    pub composition_time_ms: f64,
    pub lang: Lang,
    pub method: CompositionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompositionResult {
    pub fn grounded(&self) -> bool {
        self.grounding.grounded
    }

    pub fn grounding_score(&self) -> f64 {
        self.grounding.score
    }

    /// Whether the policy should learn from this result
    pub fn is_reward_bearing(&self) -> bool {
        self.error.is_none() && !self.policy_overridden && self.policy_metadata.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_roundtrip() {
        for lang in [Lang::En, Lang::Hi] {
            assert_eq!(Lang::from_str(lang.as_str()).unwrap(), lang);
        }
        assert_eq!(Lang::from_str("hi").unwrap(), Lang::Hi);
        assert!(Lang::from_str("FR").is_err());
    }

    #[test]
    fn test_lang_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Lang::Hi).unwrap(), "\"HI\"");
        let parsed: Lang = serde_json::from_str("\"EN\"").unwrap();
        assert_eq!(parsed, Lang::En);
    }

    #[test]
    fn test_chunk_defaults_on_deserialize() {
        let chunk: SourceChunk = serde_json::from_str(r#"{"text":"karma yoga"}"#).unwrap();
        assert_eq!(chunk.source, "Unknown");
        assert_eq!(chunk.score, 0.0);
    }

    #[test]
    fn test_citations_take_first_three() {
        let chunks: Vec<SourceChunk> = (0..5)
            .map(|i| SourceChunk::new(format!("text {i}"), format!("src {i}"), 0.5))
            .collect();
        let citations = Citation::from_chunks(&chunks);
        assert_eq!(citations.len(), 3);
        assert_eq!(citations[0].id, 1);
        assert_eq!(citations[2].source, "src 2");
    }

    #[test]
    fn test_citation_preview_truncated() {
        let long = "a".repeat(150);
        let chunks = vec![SourceChunk::new(long, "Gita", 0.9)];
        let citations = Citation::from_chunks(&chunks);
        assert_eq!(citations[0].text_preview.chars().count(), 103);
        assert!(citations[0].text_preview.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "ध्यान ध्यान ध्यान";
        let cut = truncate_chars(text, 4);
        assert_eq!(cut, format!("{}...", text.chars().take(4).collect::<String>()));
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
