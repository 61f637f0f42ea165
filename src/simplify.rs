//! Legal text simplification.
//!
//! The primary path builds a natural-language instruction from fixed lookup
//! tables and delegates to the external model. Any failure there drops to a
//! deterministic jargon-substitution pass that never fails; the caller cannot
//! tell the difference beyond the fallback marker prefix.

use std::sync::Arc;

use crate::ai::AiClient;

/// Prefix prepended to every rule-based fallback result.
pub const FALLBACK_MARKER: &str = "Simplified version: ";

/// Input is truncated to this many characters before prompting, to bound
/// request size.
const MAX_PROMPT_CHARS: usize = 4000;

const SYSTEM_PROMPT: &str = "You are a legal expert who specializes in simplifying complex legal documents for ordinary people.";

/// Language-specific framing instructions. Unknown codes fall back to `en`.
const LANGUAGE_PROMPTS: &[(&str, &str)] = &[
    ("en", "Simplify this legal document into plain English"),
    ("hi", "इस कानूनी दस्तावेज़ को सरल हिंदी में समझाएं"),
    ("mr", "या कायदेशीर कागदपत्राचे मराठीत सोप्या भाषेत स्पष्टीकरण द्या"),
];

/// Complexity-tier register instructions. Unknown tiers fall back to `simple`.
const COMPLEXITY_LEVELS: &[(&str, &str)] = &[
    (
        "simple",
        "Use very simple language that a 12-year-old could understand",
    ),
    (
        "intermediate",
        "Use clear language suitable for high school graduates",
    ),
    (
        "advanced",
        "Use professional but clear language suitable for college graduates",
    ),
];

/// Ordered jargon-to-plain-language substitutions applied by the fallback.
/// Multi-word phrases come before the single words they contain.
const FALLBACK_REPLACEMENTS: &[(&str, &str)] = &[
    ("whereas", "given that"),
    ("heretofore", "before this"),
    ("hereinafter", "from now on"),
    ("aforementioned", "mentioned above"),
    ("pursuant to", "according to"),
    ("notwithstanding", "despite"),
    ("ipso facto", "by that very fact"),
    ("party of the first part", "first party"),
    ("party of the second part", "second party"),
    ("shall", "will"),
    ("hereby", "by this"),
    ("herein", "in this document"),
    ("thereof", "of that"),
    ("witnesseth", "shows that"),
];

fn lookup<'a>(table: &'a [(&str, &str)], key: &str, default: &str) -> &'a str {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .or_else(|| table.iter().find(|(k, _)| *k == default))
        .map(|(_, v)| *v)
        .unwrap_or("")
}

/// Truncates to at most `max_chars` characters, respecting UTF-8 boundaries.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Builds the simplification instruction sent to the model.
fn build_prompt(text: &str, language: &str, complexity: &str) -> String {
    format!(
        "{}.\n\n{}.\n\nPlease:\n\
         1. Break down complex legal terms into simple explanations\n\
         2. Explain what each clause means in practical terms\n\
         3. Highlight key rights and obligations\n\
         4. Use bullet points for clarity\n\
         5. Maintain the document structure but make it readable\n\n\
         Original legal text:\n{}",
        lookup(LANGUAGE_PROMPTS, language, "en"),
        lookup(COMPLEXITY_LEVELS, complexity, "simple"),
        truncate_chars(text, MAX_PROMPT_CHARS),
    )
}

/// Deterministic substitution-based simplifier. Applied to the raw,
/// untruncated input; never fails.
pub fn rule_based_simplification(text: &str) -> String {
    let mut simplified = text.to_string();
    for (old, new) in FALLBACK_REPLACEMENTS {
        simplified = simplified.replace(old, new);
    }
    format!("{}{}", FALLBACK_MARKER, simplified)
}

pub struct Simplifier {
    ai: Arc<AiClient>,
}

impl Simplifier {
    pub fn new(ai: Arc<AiClient>) -> Self {
        Self { ai }
    }

    /// Simplifies legal text for the given language and complexity tier.
    /// Infallible from the caller's perspective: a failed model call falls
    /// back to [`rule_based_simplification`] with no retry.
    pub async fn simplify(&self, text: &str, language: &str, complexity: &str) -> String {
        let prompt = build_prompt(text, language, complexity);
        match self
            .ai
            .chat_completion(SYSTEM_PROMPT, &prompt, 2000, 0.3)
            .await
        {
            Ok(simplified) => simplified,
            Err(e) => {
                tracing::warn!("AI simplification failed, using rule-based fallback: {}", e);
                rule_based_simplification(text)
            }
        }
    }
}
