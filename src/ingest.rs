//! Ingestion orchestration.
//!
//! Drives an upload through validation, extraction, simplification, and
//! persistence, producing exactly one terminal document record per id:
//! `completed` on the happy path, `error` when the deferred pipeline fails.
//! No intermediate state is ever persisted.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;

use crate::extract;
use crate::models::{DocumentRecord, DocumentStatus};
use crate::simplify::Simplifier;
use crate::store;

/// Upload validation failures. All map to HTTP 400 and are surfaced verbatim.
#[derive(Debug)]
pub enum ValidationError {
    MissingFilename,
    UnsupportedFormat(String),
    TooLarge { size: usize, max: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingFilename => write!(f, "No file provided"),
            ValidationError::UnsupportedFormat(ext) => write!(
                f,
                "Unsupported file format '{}'. Supported: {}",
                ext,
                extract::SUPPORTED_EXTENSIONS.join(", ")
            ),
            ValidationError::TooLarge { size, max } => write!(
                f,
                "File of {} bytes exceeds the maximum upload size of {} bytes",
                size, max
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates an upload before extraction is attempted. Returns the lowercase
/// extension on success. The size limit is enforced here, at the boundary.
pub fn validate_upload(
    filename: &str,
    size: usize,
    max_upload_bytes: usize,
) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::MissingFilename);
    }
    let ext = extract::file_extension(filename)
        .ok_or_else(|| ValidationError::UnsupportedFormat(String::new()))?;
    if !extract::SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ValidationError::UnsupportedFormat(ext));
    }
    if size > max_upload_bytes {
        return Err(ValidationError::TooLarge {
            size,
            max: max_upload_bytes,
        });
    }
    Ok(ext)
}

/// Whitespace-token count of the original text.
pub fn word_count(text: &str) -> i64 {
    text.split_whitespace().count() as i64
}

/// Number of period-delimited segments whose trimmed length exceeds 20
/// characters (characters, not bytes — Hindi and Marathi text is multibyte).
/// A reporting metric only.
pub fn clause_count(text: &str) -> i64 {
    text.split('.')
        .filter(|s| s.trim().chars().count() > 20)
        .count() as i64
}

/// Runs simplify-and-persist for already-extracted text and returns the
/// terminal record. The simplify step is awaited before persisting; its
/// duration is the recorded processing time.
pub async fn process_document(
    pool: &SqlitePool,
    simplifier: &Simplifier,
    doc_id: &str,
    filename: &str,
    original_text: &str,
    language: &str,
    complexity: &str,
) -> Result<DocumentRecord> {
    let started = Instant::now();
    let simplified_text = simplifier.simplify(original_text, language, complexity).await;
    let processing_time = started.elapsed().as_secs_f64();

    let record = DocumentRecord {
        id: doc_id.to_string(),
        filename: filename.to_string(),
        original_text: original_text.to_string(),
        simplified_text,
        language: language.to_string(),
        processing_time,
        clause_count: clause_count(original_text),
        word_count: word_count(original_text),
        status: DocumentStatus::Completed,
        upload_time: Utc::now().to_rfc3339(),
    };

    store::insert_document(pool, &record).await?;
    tracing::info!(doc_id = %record.id, "document processed");
    Ok(record)
}

/// Enqueues simplify-and-persist as a detached unit of work. The caller gets
/// no failure channel; the terminal status written by the task (or the error
/// record below) is the only observable outcome, polled by document id.
pub fn spawn_processing(
    pool: SqlitePool,
    simplifier: Arc<Simplifier>,
    doc_id: String,
    filename: String,
    original_text: String,
    language: String,
    complexity: String,
) {
    tokio::spawn(async move {
        if let Err(e) = process_document(
            &pool,
            &simplifier,
            &doc_id,
            &filename,
            &original_text,
            &language,
            &complexity,
        )
        .await
        {
            tracing::error!(doc_id = %doc_id, "background processing failed: {}", e);
            let error_record = DocumentRecord {
                id: doc_id.clone(),
                filename,
                original_text: original_text.clone(),
                simplified_text: format!("Error processing document: {}", e),
                language,
                processing_time: 0.0,
                clause_count: 0,
                word_count: word_count(&original_text),
                status: DocumentStatus::Error,
                upload_time: Utc::now().to_rfc3339(),
            };
            if let Err(e) = store::insert_document(&pool, &error_record).await {
                tracing::error!(doc_id = %doc_id, "failed to record error status: {}", e);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_splits_on_whitespace() {
        assert_eq!(word_count("one  two\tthree\nfour"), 4);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn clause_count_requires_long_segments() {
        // Two segments over 20 chars, one short, one empty trailing
        let text = "This clause is clearly longer than twenty characters. Short one. \
                    Another clause that also exceeds the threshold easily.";
        assert_eq!(clause_count(text), 2);
    }

    #[test]
    fn clause_count_measures_characters_not_bytes() {
        // 16 characters but ~46 UTF-8 bytes: must not count
        assert_eq!(clause_count("किरायेदार भुगतान."), 0);
        // Over 20 characters counts exactly once
        assert_eq!(
            clause_count("किरायेदार हर महीने की पहली तारीख को किराया देगा."),
            1
        );
    }

    #[test]
    fn clause_count_of_empty_text_is_zero() {
        assert_eq!(clause_count(""), 0);
        assert_eq!(clause_count("..."), 0);
    }

    #[test]
    fn validate_rejects_missing_filename() {
        let err = validate_upload("", 10, 100).unwrap_err();
        assert!(matches!(err, ValidationError::MissingFilename));
    }

    #[test]
    fn validate_rejects_unsupported_extension() {
        let err = validate_upload("malware.exe", 10, 100).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedFormat(_)));
    }

    #[test]
    fn validate_rejects_missing_extension() {
        let err = validate_upload("README", 10, 100).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedFormat(_)));
    }

    #[test]
    fn validate_enforces_size_limit() {
        let err = validate_upload("contract.pdf", 101, 100).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        // At the limit is allowed
        assert_eq!(validate_upload("contract.pdf", 100, 100).unwrap(), "pdf");
    }

    #[test]
    fn validate_returns_lowercased_extension() {
        assert_eq!(validate_upload("Lease.DOCX", 10, 100).unwrap(), "docx");
    }
}
