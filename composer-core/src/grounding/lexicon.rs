//! Fixed word lists used by grounding: stopwords and the concept vocabulary

use std::collections::HashSet;
use std::sync::LazyLock;

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "can", "must",
    "shall", "to", "of", "in", "for", "on", "with", "by", "from", "as", "at", "or", "and", "but",
    "if", "then", "than", "when", "where", "why", "how", "what", "which", "who", "whom", "whose",
    "this", "that", "these", "those", "i", "you", "he", "she", "it", "we", "they", "me", "him",
    "her", "us", "them",
];

const HINDI_STOPWORDS: &[&str] = &[
    "है", "हैं", "था", "थे", "थी", "हो", "होना", "होने", "होगा", "होंगे", "में", "की", "के", "को",
    "से", "पर", "या", "और", "तथा", "एवं", "यह", "वह", "ये", "वे", "इस", "उस", "इन", "उन", "जो",
    "जिस", "कि", "अगर", "यदि", "तो", "फिर", "भी", "तक", "बाद", "पहले", "अब", "यहाँ", "वहाँ",
    "कहाँ", "कब", "कैसे", "क्यों", "क्या", "कौन", "कौनसा", "मैं", "तू", "आप", "हम", "तुम", "वो",
];

/// Domain concepts matched as substrings of lowercased text
pub const CONCEPT_VOCABULARY: &[&str] = &[
    "dharma",
    "karma",
    "moksha",
    "yoga",
    "meditation",
    "wisdom",
    "truth",
    "knowledge",
    "devotion",
    "compassion",
    "enlightenment",
    "consciousness",
    "soul",
    "spirit",
    "divine",
    "sacred",
    "holy",
    "transcendence",
    "liberation",
    "self-realization",
    "inner peace",
    "spiritual growth",
    "ध्यान",
    "योग",
    "कर्म",
    "धर्म",
    "मोक्ष",
    "आत्मा",
    "ब्रह्म",
    "ईश्वर",
    "भक्ति",
    "ज्ञान",
    "शांति",
    "करुणा",
    "दया",
    "अहिंसा",
    "सत्य",
    "प्रेम",
];

static ENGLISH: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOPWORDS.iter().copied().collect());

static HINDI: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HINDI_STOPWORDS.iter().copied().collect());

/// Script whose stopword list applies to a token set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Devanagari,
}

impl Script {
    pub fn stopwords(&self) -> &'static HashSet<&'static str> {
        match self {
            Self::Latin => &ENGLISH,
            Self::Devanagari => &HINDI,
        }
    }
}
