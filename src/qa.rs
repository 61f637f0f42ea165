//! Question answering over stored document text.
//!
//! Answers come from the external model; the "relevant clauses" list is a
//! separate word-overlap scan over the document. That heuristic is substring
//! matching, not semantic retrieval — a documented limitation.

use serde::Serialize;
use std::sync::Arc;

use crate::ai::AiClient;

/// Document text is truncated to this many characters when prompting.
const MAX_CONTEXT_CHARS: usize = 3000;

/// Only the leading sentences of a document are scanned for relevance.
const MAX_SENTENCES_SCANNED: usize = 20;

/// At most this many matching sentences are returned.
const MAX_RELEVANT_CLAUSES: usize = 3;

const SYSTEM_PROMPT: &str = "You are a helpful legal assistant. Provide accurate information based on the document, but always remind users to consult a lawyer for official legal advice.";

/// Answer payload for a single chat question.
#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub response: String,
    pub confidence: f64,
    pub relevant_clauses: Vec<String>,
}

/// Sentences from the leading portion of `text` sharing at least one lowercase
/// word token with the question, in original order.
pub fn relevant_clauses(text: &str, question: &str) -> Vec<String> {
    let question_words: Vec<String> = question
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect();

    text.split('.')
        .take(MAX_SENTENCES_SCANNED)
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            question_words.iter().any(|w| lower.contains(w.as_str()))
        })
        .map(|s| s.trim().to_string())
        .take(MAX_RELEVANT_CLAUSES)
        .collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn build_prompt(question: &str, document_text: &str, language: &str) -> String {
    format!(
        "Based on the following legal document, please answer this question: {}\n\n\
         Document content:\n{}\n\n\
         Please provide:\n\
         1. A clear, direct answer\n\
         2. Reference to specific clauses if applicable\n\
         3. Practical implications\n\
         4. Any important warnings or considerations\n\n\
         Answer in {} language.",
        question,
        truncate_chars(document_text, MAX_CONTEXT_CHARS),
        language,
    )
}

pub struct QuestionAnswerer {
    ai: Arc<AiClient>,
}

impl QuestionAnswerer {
    pub fn new(ai: Arc<AiClient>) -> Self {
        Self { ai }
    }

    /// Answers a question about `document_text`. Model failures do not
    /// propagate: they produce a zero-confidence answer with the error
    /// embedded in the response text and no relevant clauses.
    pub async fn answer(&self, question: &str, document_text: &str, language: &str) -> ChatAnswer {
        let prompt = build_prompt(question, document_text, language);
        match self
            .ai
            .chat_completion(SYSTEM_PROMPT, &prompt, 1000, 0.2)
            .await
        {
            Ok(response) => ChatAnswer {
                response,
                confidence: 0.85,
                relevant_clauses: relevant_clauses(document_text, question),
            },
            Err(e) => {
                tracing::warn!("AI question answering failed: {}", e);
                ChatAnswer {
                    response: format!(
                        "I apologize, but I encountered an error processing your question: {}. \
                         Please try rephrasing your question or contact support.",
                        e
                    ),
                    confidence: 0.0,
                    relevant_clauses: Vec::new(),
                }
            }
        }
    }
}
