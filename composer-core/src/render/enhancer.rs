//! Rule-based text enhancement

use super::Enhancer;
use crate::error::Result;
use crate::types::{CompositionContext, Lang, SourceChunk};

const ENGLISH_CONNECTORS: &[&str] = &[
    "Furthermore",
    "Moreover",
    "Additionally",
    "In addition",
    "Similarly",
    "Likewise",
    "Therefore",
    "Thus",
    "Hence",
    "Consequently",
    "As a result",
    "In conclusion",
];

const HINDI_CONNECTORS: &[&str] = &[
    "इसके अतिरिक्त",
    "इसके साथ ही",
    "फलस्वरूप",
    "परिणामस्वरूप",
    "समान रूप से",
    "इसी प्रकार",
    "निष्कर्ष में",
    "अंत में",
];

const ENGLISH_CONCEPTS: &[&str] = &[
    "dharma",
    "soul",
    "brahman",
    "karma",
    "liberation",
    "yoga",
    "devotion",
    "knowledge",
    "wisdom",
    "truth",
];

const HINDI_CONCEPTS: &[&str] = &["धर्म", "आत्मा", "ब्रह्म", "कर्म", "मोक्ष", "योग", "भक्ति", "ज्ञान"];

const ENGLISH_TONE: &[(&str, &str)] = &[("says", "teaches"), ("tells us", "reveals to us")];
const HINDI_TONE: &[(&str, &str)] = &[("बताता है", "दर्शाता है"), ("कहता है", "उपदेश देता है")];

const ENGLISH_REDUNDANT: &[(&str, &str)] = &[
    ("the the", "the"),
    ("that that", "that"),
    ("and and", "and"),
    ("is is", "is"),
];
const HINDI_REDUNDANT: &[(&str, &str)] = &[("यह यह", "यह"), ("है है", "है"), ("के के", "के")];

/// Concepts linked into the text at most
const LINKED_CONCEPTS: usize = 2;

/// Deterministic enhancement rules.
///
/// Reports itself unavailable unless enabled, in which case the orchestrator
/// skips the stage entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEnhancer {
    enabled: bool,
}

impl RuleEnhancer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Link up to two chunk concepts the text does not mention yet
    fn link_concepts(text: &str, chunks: &[SourceChunk], lang: Lang) -> String {
        let vocabulary = match lang {
            Lang::En => ENGLISH_CONCEPTS,
            Lang::Hi => HINDI_CONCEPTS,
        };

        let mut found: Vec<&str> = Vec::new();
        for chunk in chunks.iter().take(3) {
            let lower = chunk.text.to_lowercase();
            for concept in vocabulary {
                if lower.contains(concept) && !found.contains(concept) {
                    found.push(*concept);
                }
            }
        }

        let mut out = text.to_string();
        for concept in found.into_iter().take(LINKED_CONCEPTS) {
            if out.contains(concept) {
                continue;
            }
            match lang {
                Lang::En => out.push_str(&format!(" This relates to the concept of {concept}.")),
                Lang::Hi => out.push_str(&format!(" यह {concept} की अवधारणा से संबंधित है।")),
            }
        }
        out
    }

    /// Prefix each follow-on sentence with a connector
    fn improve_flow(text: &str, lang: Lang) -> String {
        let connectors = match lang {
            Lang::En => ENGLISH_CONNECTORS,
            Lang::Hi => HINDI_CONNECTORS,
        };

        let pieces: Vec<&str> = text.split('.').collect();
        if pieces.len() < 2 {
            return text.to_string();
        }

        let last = pieces.len() - 1;
        let mut sentences = vec![pieces[0].to_string()];
        for (i, piece) in pieces.iter().enumerate().skip(1) {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            let connector = if i == last {
                "In conclusion"
            } else if piece.to_lowercase().contains("example") {
                "For instance"
            } else {
                connectors[i % connectors.len()]
            };
            sentences.push(format!("{connector}, {}", piece.to_lowercase()));
        }
        sentences.join(". ")
    }

    fn connect_understanding(text: &str, lang: Lang) -> String {
        let lower = text.to_lowercase();
        if !lower.contains("understanding") || lower.contains("wisdom") {
            return text.to_string();
        }
        match lang {
            Lang::En => format!("{text} This understanding forms the foundation of spiritual wisdom."),
            Lang::Hi => format!("{text} यह समझ आध्यात्मिक ज्ञान का आधार है।"),
        }
    }

    fn replace_all(text: &str, rules: &[(&str, &str)]) -> String {
        rules
            .iter()
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
    }
}

impl Enhancer for RuleEnhancer {
    fn is_available(&self) -> bool {
        self.enabled
    }

    fn enhance(&self, text: &str, context: &CompositionContext<'_>) -> Result<String> {
        if !self.enabled {
            return Ok(text.to_string());
        }

        let lang = context.lang;
        let text = Self::link_concepts(text, context.chunks, lang);
        let text = Self::improve_flow(&text, lang);
        let text = Self::connect_understanding(&text, lang);
        let (tone, redundant) = match lang {
            Lang::En => (ENGLISH_TONE, ENGLISH_REDUNDANT),
            Lang::Hi => (HINDI_TONE, HINDI_REDUNDANT),
        };
        let text = Self::replace_all(&text, tone);
        Ok(Self::replace_all(&text, redundant))
    }
}
