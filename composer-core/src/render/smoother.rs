//! N-gram phrase-table smoothing and fluency scoring

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Smoother;
use crate::error::Result;
use crate::types::Lang;

/// Trigram and bigram scores for one language
struct PhraseTable {
    trigrams: &'static [([&'static str; 3], f64)],
    bigrams: &'static [([&'static str; 2], f64)],
}

impl PhraseTable {
    fn trigram(&self, words: [&str; 3]) -> Option<f64> {
        self.trigrams
            .iter()
            .find(|(t, _)| *t == words)
            .map(|(_, score)| *score)
    }

    fn bigram(&self, words: [&str; 2]) -> Option<f64> {
        self.bigrams
            .iter()
            .find(|(b, _)| *b == words)
            .map(|(_, score)| *score)
    }

    /// Highest-scoring table trigram sharing at least two positions
    fn closest_trigram(&self, words: [&str; 3]) -> Option<[&'static str; 3]> {
        let mut best: Option<([&'static str; 3], f64)> = None;
        for (candidate, score) in self.trigrams {
            let matches = candidate.iter().zip(words).filter(|(a, b)| **a == *b).count();
            if matches >= 2 && best.is_none_or(|(_, s)| *score > s) {
                best = Some((*candidate, *score));
            }
        }
        best.map(|(trigram, _)| trigram)
    }
}

static ENGLISH: PhraseTable = PhraseTable {
    trigrams: &[
        (["according", "to", "the"], 0.95),
        (["in", "the", "sacred"], 0.90),
        (["the", "sacred", "texts"], 0.92),
        (["as", "mentioned", "in"], 0.88),
        (["this", "teaching", "shows"], 0.85),
        (["we", "can", "understand"], 0.87),
        (["the", "scripture", "tells"], 0.89),
        (["based", "on", "the"], 0.91),
        (["let", "us", "understand"], 0.84),
        (["this", "helps", "us"], 0.83),
        (["for", "example", "when"], 0.86),
        (["this", "means", "that"], 0.88),
        (["in", "other", "words"], 0.82),
        (["to", "understand", "this"], 0.89),
        (["it", "is", "important"], 0.85),
        (["we", "must", "remember"], 0.84),
        (["on", "the", "other"], 0.87),
        (["in", "contrast", "to"], 0.83),
        (["similar", "to", "this"], 0.81),
        (["different", "from", "the"], 0.82),
        (["therefore", "we", "can"], 0.86),
        (["thus", "it", "is"], 0.84),
        (["in", "conclusion", "the"], 0.85),
        (["this", "wisdom", "teaches"], 0.87),
    ],
    bigrams: &[
        (["the", "sacred"], 0.92),
        (["sacred", "texts"], 0.90),
        (["according", "to"], 0.95),
        (["we", "can"], 0.88),
        (["this", "teaching"], 0.85),
        (["spiritual", "wisdom"], 0.87),
        (["divine", "knowledge"], 0.86),
        (["ancient", "wisdom"], 0.84),
        (["for", "example"], 0.89),
        (["in", "conclusion"], 0.83),
    ],
};

static HINDI: PhraseTable = PhraseTable {
    trigrams: &[
        (["शास्त्रों", "के", "अनुसार"], 0.95),
        (["पवित्र", "ग्रंथों", "में"], 0.92),
        (["इस", "शिक्षा", "से"], 0.88),
        (["हमें", "यह", "समझना"], 0.87),
        (["के", "अनुसार", "यह"], 0.89),
        (["यह", "ज्ञान", "हमें"], 0.86),
        (["आध्यात्मिक", "ज्ञान", "के"], 0.85),
        (["उदाहरण", "के", "लिए"], 0.90),
        (["इसका", "अर्थ", "यह"], 0.87),
        (["दूसरे", "शब्दों", "में"], 0.84),
        (["समझने", "के", "लिए"], 0.88),
        (["यह", "महत्वपूर्ण", "है"], 0.86),
        (["इसलिए", "हम", "कह"], 0.85),
        (["निष्कर्ष", "में", "यह"], 0.83),
        (["यह", "ज्ञान", "सिखाता"], 0.87),
    ],
    bigrams: &[
        (["पवित्र", "ग्रंथ"], 0.91),
        (["आध्यात्मिक", "ज्ञान"], 0.89),
        (["के", "अनुसार"], 0.94),
        (["हमें", "समझना"], 0.86),
        (["यह", "शिक्षा"], 0.84),
        (["प्राचीन", "ज्ञान"], 0.87),
        (["दिव्य", "ज्ञान"], 0.85),
    ],
};

/// Scores for n-grams missing from the table
const UNKNOWN_TRIGRAM: f64 = 0.3;
const UNKNOWN_BIGRAM: f64 = 0.15;
const BIGRAM_WEIGHT: f64 = 0.5;
const NEUTRAL_FLUENCY: f64 = 0.5;

static ENGLISH_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"));

static HINDI_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{0900}-\x{0963}\x{0966}-\x{097F}]+|[A-Za-z]+").expect("word pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static SPACE_BEFORE_STOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([।.!?])").expect("stop pattern is valid"));

static SPACE_AFTER_STOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([।.!?])\s*([A-Za-z\x{0900}-\x{097F}])").expect("stop pattern is valid")
});

static LOWER_AFTER_STOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([।.!?]\s+)([a-z])").expect("stop pattern is valid"));

/// Rewrites sentences towards a small phrase table of fluent n-grams
#[derive(Debug, Clone, Copy, Default)]
pub struct NgramSmoother;

impl NgramSmoother {
    pub fn new() -> Self {
        Self
    }

    fn table(lang: Lang) -> &'static PhraseTable {
        match lang {
            Lang::En => &ENGLISH,
            Lang::Hi => &HINDI,
        }
    }

    fn sentences(text: &str, lang: Lang) -> Vec<&str> {
        let terminators: &[char] = match lang {
            Lang::En => &['.', '!', '?'],
            Lang::Hi => &['।', '!', '?'],
        };
        text.split(terminators)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn words(sentence: &str, lang: Lang) -> Vec<String> {
        let lower = sentence.to_lowercase();
        let pattern = match lang {
            Lang::En => &*ENGLISH_WORD,
            Lang::Hi => &*HINDI_WORD,
        };
        pattern
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn smooth_sentence(sentence: &str, table: &PhraseTable, lang: Lang) -> String {
        let words = Self::words(sentence, lang);
        if words.len() < 2 {
            return sentence.to_string();
        }

        let mut smoothed = words.clone();
        for (i, window) in words.windows(3).enumerate() {
            let trigram = [window[0].as_str(), window[1].as_str(), window[2].as_str()];
            if table.trigram(trigram).is_some() {
                continue;
            }
            if let Some(better) = table.closest_trigram(trigram) {
                for (offset, word) in better.iter().enumerate() {
                    smoothed[i + offset] = (*word).to_string();
                }
            }
        }

        capitalize(&smoothed.join(" "))
    }

    fn polish(text: &str, lang: Lang) -> String {
        let text = WHITESPACE.replace_all(text, " ");
        let text = SPACE_BEFORE_STOP.replace_all(&text, "$1");
        let text = SPACE_AFTER_STOP.replace_all(&text, "$1 $2");
        let text = match lang {
            Lang::En => LOWER_AFTER_STOP
                .replace_all(&text, |caps: &Captures<'_>| {
                    format!("{}{}", &caps[1], caps[2].to_uppercase())
                })
                .into_owned(),
            Lang::Hi => text.into_owned(),
        };
        text.trim().to_string()
    }

    /// Fluency of `text` against the phrase table, in `[0, 1]`
    pub fn fluency_score(&self, text: &str, lang: Lang) -> f64 {
        let table = Self::table(lang);
        let mut total = 0.0;
        let mut count = 0.0;

        for sentence in Self::sentences(text, lang) {
            let words = Self::words(sentence, lang);
            if words.len() < 2 {
                total += NEUTRAL_FLUENCY;
                count += 1.0;
                continue;
            }

            for window in words.windows(3) {
                let trigram = [window[0].as_str(), window[1].as_str(), window[2].as_str()];
                total += table.trigram(trigram).unwrap_or(UNKNOWN_TRIGRAM);
                count += 1.0;
            }
            for window in words.windows(2) {
                let bigram = [window[0].as_str(), window[1].as_str()];
                total += table
                    .bigram(bigram)
                    .map_or(UNKNOWN_BIGRAM, |score| score * BIGRAM_WEIGHT);
                count += BIGRAM_WEIGHT;
            }
        }

        if count == 0.0 {
            return NEUTRAL_FLUENCY;
        }
        (total / count).clamp(0.0, 1.0)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Smoother for NgramSmoother {
    fn smooth(&self, text: &str, lang: Lang) -> Result<String> {
        let table = Self::table(lang);
        let terminator = match lang {
            Lang::En => '.',
            Lang::Hi => '।',
        };

        let sentences: Vec<String> = Self::sentences(text, lang)
            .into_iter()
            .map(|sentence| Self::smooth_sentence(sentence, table, lang))
            .filter(|sentence| !sentence.is_empty())
            .map(|mut sentence| {
                if !sentence.ends_with(['.', '!', '?', '।']) {
                    sentence.push(terminator);
                }
                sentence
            })
            .collect();

        Ok(Self::polish(&sentences.join(" "), lang))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_trigram_needs_two_matches() {
        assert_eq!(
            ENGLISH.closest_trigram(["according", "to", "scripture"]),
            Some(["according", "to", "the"])
        );
        assert_eq!(ENGLISH.closest_trigram(["meditation", "brings", "peace"]), None);
    }

    #[test]
    fn test_closest_trigram_counts_aligned_positions_only() {
        assert_eq!(
            ENGLISH.closest_trigram(["in", "the", "holy"]),
            Some(["in", "the", "sacred"])
        );
    }

    #[test]
    fn test_smooth_adds_terminators_and_capitals() {
        let smoothed = NgramSmoother.smooth("meditation brings peace! wisdom grows", Lang::En).unwrap();
        assert_eq!(smoothed, "Meditation brings peace. Wisdom grows.");
    }

    #[test]
    fn test_smooth_repairs_near_miss_trigram() {
        let smoothed = NgramSmoother
            .smooth("According to scripture karma binds.", Lang::En)
            .unwrap();
        assert!(smoothed.starts_with("According to the"));
    }

    #[test]
    fn test_smooth_hindi_uses_danda() {
        let smoothed = NgramSmoother.smooth("ध्यान शांति देता है", Lang::Hi).unwrap();
        assert_eq!(smoothed, "ध्यान शांति देता है।");
    }

    #[test]
    fn test_single_word_sentence_kept() {
        let smoothed = NgramSmoother.smooth("Om.", Lang::En).unwrap();
        assert_eq!(smoothed, "Om.");
    }

    #[test]
    fn test_smooth_empty_text() {
        assert_eq!(NgramSmoother.smooth("", Lang::En).unwrap(), "");
    }

    #[test]
    fn test_fluency_prefers_table_phrases() {
        let smoother = NgramSmoother;
        let fluent = smoother.fluency_score("According to the sacred texts.", Lang::En);
        let plain = smoother.fluency_score("Engines need diesel fuel.", Lang::En);
        assert!(fluent > plain);
        assert!((0.0..=1.0).contains(&fluent));
        assert!((0.0..=1.0).contains(&plain));
    }

    #[test]
    fn test_fluency_neutral_for_empty_text() {
        assert_eq!(NgramSmoother.fluency_score("", Lang::En), NEUTRAL_FLUENCY);
        assert_eq!(NgramSmoother.fluency_score("Om.", Lang::Hi), NEUTRAL_FLUENCY);
    }

    #[test]
    fn test_unknown_text_fluency() {
        // two unknown trigrams, three unknown bigrams at half weight
        let score = NgramSmoother.fluency_score("alpha beta gamma delta", Lang::En);
        let expected = (0.3 * 2.0 + 0.15 * 3.0) / (2.0 + 1.5);
        assert!((score - expected).abs() < 1e-12);
    }
}
