//! Built-in bilingual templates

use std::sync::LazyLock;

use regex::Regex;

use super::TemplateRenderer;
use crate::error::{ComposerError, Result};
use crate::strategy::Strategy;
use crate::types::{CompositionContext, Lang, MAX_CITATIONS, SourceChunk, truncate_chars};

const PRIMARY_QUOTE_CHARS: usize = 200;
const SECONDARY_QUOTE_CHARS: usize = 150;

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("blank line pattern is valid"));

static REPEATED_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +").expect("space pattern is valid"));

static GLUED_SENTENCES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])([A-Z])").expect("sentence pattern is valid"));

/// Template renderer for the four strategies in English and Hindi
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl BuiltinTemplates {
    pub fn new() -> Self {
        Self
    }
}

/// Values substituted into a template body
struct Slots<'a> {
    answer: &'a str,
    answer_lower: String,
    primary_source: &'a str,
    primary_quote: String,
    secondary_quotes: String,
    citations: String,
}

impl<'a> Slots<'a> {
    fn new(context: &CompositionContext<'a>) -> Self {
        let primary = context.chunks.first();
        let secondary_quotes = context
            .chunks
            .iter()
            .skip(1)
            .take(MAX_CITATIONS - 1)
            .map(|chunk| {
                format!(
                    "• {}: \"{}\"",
                    chunk.source,
                    truncate_chars(&chunk.text, SECONDARY_QUOTE_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            answer: context.extractive_answer,
            answer_lower: context.extractive_answer.to_lowercase(),
            primary_source: primary.map_or("Sacred Texts", |c| c.source.as_str()),
            primary_quote: primary
                .map(|c| truncate_chars(&c.text, PRIMARY_QUOTE_CHARS))
                .unwrap_or_default(),
            secondary_quotes,
            citations: numbered_citations(context.chunks),
        }
    }
}

/// `[1] source, [2] source, ...` over the leading chunks
pub fn numbered_citations(chunks: &[SourceChunk]) -> String {
    chunks
        .iter()
        .take(MAX_CITATIONS)
        .enumerate()
        .map(|(i, chunk)| format!("[{}] {}", i + 1, chunk.source))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Answer followed by a flat list of distinct sources
pub fn minimal_template(context: &CompositionContext<'_>) -> String {
    let mut sources: Vec<&str> = Vec::new();
    for chunk in context.chunks.iter().take(MAX_CITATIONS) {
        if !sources.contains(&chunk.source.as_str()) {
            sources.push(&chunk.source);
        }
    }
    format!(
        "{}\n\nSources: {}",
        context.extractive_answer,
        sources.join(", ")
    )
}

fn render_en(strategy: Strategy, s: &Slots<'_>) -> String {
    match strategy {
        Strategy::Explain => format!(
            "Based on the sacred texts, {answer}\n\n\
             Let me explain this concept in detail:\n\n\
             To understand this concept thoroughly, we need to recognize that {lower}. \
             The scriptures provide detailed insights into this matter.\n\n\
             As mentioned in {source}, \"{quote}\"\n\n\
             This understanding helps us appreciate the significance and practical application of this wisdom.\n\n\
             Citations: {citations}",
            answer = s.answer,
            lower = s.answer_lower,
            source = s.primary_source,
            quote = s.primary_quote,
            citations = s.citations,
        ),
        Strategy::Compare => format!(
            "According to the scriptures, {answer}\n\n\
             To understand this better, let's compare different perspectives:\n\n\
             Looking at different perspectives, it becomes clear that {lower}. \
             Both traditional and contemporary interpretations offer valuable insights.\n\n\
             The texts show us that all perspectives together provide a comprehensive understanding.\n\n\
             Citations: {citations}",
            answer = s.answer,
            lower = s.answer_lower,
            citations = s.citations,
        ),
        Strategy::Example => format!(
            "The sacred teachings tell us that {answer}\n\n\
             Here are some illustrative examples:\n\n\
             For instance, we can observe that {lower}. \
             There are numerous examples of how this principle applies in daily life.\n\n\
             These examples demonstrate the practical importance of the fundamental principle.\n\n\
             Citations: {citations}",
            answer = s.answer,
            lower = s.answer_lower,
            citations = s.citations,
        ),
        Strategy::Extractive => format!(
            "According to {source}: \"{quote}\"\n\n\
             {answer}\n\n\
             Additional references:\n\
             {secondary}\n\n\
             Citations: {citations}",
            source = s.primary_source,
            quote = s.primary_quote,
            answer = s.answer,
            secondary = s.secondary_quotes,
            citations = s.citations,
        ),
    }
}

fn render_hi(strategy: Strategy, s: &Slots<'_>) -> String {
    match strategy {
        Strategy::Explain => format!(
            "पवित्र ग्रंथों के अनुसार, {answer}\n\n\
             आइए इस अवधारणा को विस्तार से समझते हैं:\n\n\
             इस विषय की गहरी समझ के लिए, हमें यह जानना आवश्यक है कि {lower}। \
             विभिन्न शास्त्रों में इसका विस्तृत वर्णन मिलता है।\n\n\
             जैसा कि {source} में उल्लेख है, \"{quote}\"\n\n\
             यह समझ हमें इस ज्ञान का महत्व और व्यावहारिक अनुप्रयोग की सराहना करने में मदद करती है।\n\n\
             संदर्भ: {citations}",
            answer = s.answer,
            lower = s.answer_lower,
            source = s.primary_source,
            quote = s.primary_quote,
            citations = s.citations,
        ),
        Strategy::Compare => format!(
            "शास्त्रों के अनुसार, {answer}\n\n\
             इसे बेहतर समझने के लिए, आइए विभिन्न दृष्टिकोणों की तुलना करें:\n\n\
             विभिन्न दृष्टिकोणों को देखते हुए, यह स्पष्ट होता है कि {lower}। \
             परंपरागत और आधुनिक व्याख्याओं में समानताएं और अंतर दोनों हैं।\n\n\
             ग्रंथ हमें दिखाते हैं कि सभी दृष्टिकोण मिलकर एक संपूर्ण समझ प्रदान करते हैं।\n\n\
             संदर्भ: {citations}",
            answer = s.answer,
            lower = s.answer_lower,
            citations = s.citations,
        ),
        Strategy::Example => format!(
            "पवित्र शिक्षाएं हमें बताती हैं कि {answer}\n\n\
             यहां कुछ उदाहरण हैं:\n\n\
             उदाहरण के रूप में, हम देख सकते हैं कि {lower}। \
             यह सिद्धांत दैनिक जीवन में कैसे लागू होता है, इसके कई प्रमाण मिलते हैं।\n\n\
             ये उदाहरण मूल सिद्धांत का व्यावहारिक महत्व को दर्शाते हैं।\n\n\
             संदर्भ: {citations}",
            answer = s.answer,
            lower = s.answer_lower,
            citations = s.citations,
        ),
        Strategy::Extractive => format!(
            "{source} के अनुसार: \"{quote}\"\n\n\
             {answer}\n\n\
             अतिरिक्त संदर्भ:\n\
             {secondary}\n\n\
             संदर्भ: {citations}",
            source = s.primary_source,
            quote = s.primary_quote,
            answer = s.answer,
            secondary = s.secondary_quotes,
            citations = s.citations,
        ),
    }
}

fn clean(text: &str) -> String {
    let text = BLANK_LINES.replace_all(text, "\n\n");
    let text = REPEATED_SPACES.replace_all(&text, " ");
    let text = GLUED_SENTENCES.replace_all(&text, "$1 $2");
    text.trim().to_string()
}

impl TemplateRenderer for BuiltinTemplates {
    fn render(&self, strategy: Strategy, context: &CompositionContext<'_>) -> Result<String> {
        if context.chunks.is_empty() {
            return Err(ComposerError::Render(format!(
                "template {} needs at least one source chunk",
                strategy.template_id(context.lang)
            )));
        }

        let slots = Slots::new(context);
        let body = match context.lang {
            Lang::En => render_en(strategy, &slots),
            Lang::Hi => render_hi(strategy, &slots),
        };
        Ok(clean(&body))
    }
}
