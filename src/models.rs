//! Core data models for the simplification pipeline.
//!
//! These types represent the documents, chat transcripts, and statistics that
//! flow between the ingestion orchestrator, the store, and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Terminal processing outcome recorded against a document id. A record is
/// written exactly once; there is no persisted intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Completed,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Completed => "completed",
            DocumentStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(DocumentStatus::Completed),
            "error" => Some(DocumentStatus::Error),
            _ => None,
        }
    }
}

/// A fully processed document as stored in SQLite.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub original_text: String,
    pub simplified_text: String,
    pub language: String,
    /// Wall-clock seconds spent in the simplify step (0.0 on the error path).
    pub processing_time: f64,
    /// Period-delimited segments whose trimmed length exceeds 20 characters.
    pub clause_count: i64,
    /// Whitespace-separated tokens in the original text.
    pub word_count: i64,
    pub status: DocumentStatus,
    /// RFC 3339 creation time, immutable.
    pub upload_time: String,
}

/// Listing projection: everything a document index needs, minus the body text.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub upload_time: String,
    pub language: String,
    pub word_count: i64,
    pub status: DocumentStatus,
}

/// One question/answer exchange inside a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: String,
}

/// A stored chat transcript. `document_id` is absent for general questions
/// asked without a document context.
#[derive(Debug, Clone)]
pub struct ChatSessionRecord {
    pub session_id: String,
    pub document_id: Option<String>,
    pub messages: Vec<ChatTurn>,
    pub created_at: String,
    pub updated_at: String,
}

/// Aggregate statistics over all stored documents.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub total_documents_processed: i64,
    pub total_words_processed: i64,
    pub average_processing_time_seconds: f64,
    pub language_distribution: BTreeMap<String, i64>,
    pub status_distribution: BTreeMap<String, i64>,
}
