//! SQLite persistence for documents and chat transcripts.
//!
//! Documents are written once with a terminal status and never updated.
//! Chat sessions are keyed by a generated session id; saving a turn for an
//! existing id appends to the stored transcript (read-modify-write, last
//! writer wins on a colliding id).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};

use crate::models::{
    ChatSessionRecord, ChatTurn, DocumentRecord, DocumentStatus, DocumentSummary, StatsSummary,
};

pub async fn insert_document(pool: &SqlitePool, record: &DocumentRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (id, filename, original_text, simplified_text, language,
                               processing_time, clause_count, word_count, status, upload_time)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.filename)
    .bind(&record.original_text)
    .bind(&record.simplified_text)
    .bind(&record.language)
    .bind(record.processing_time)
    .bind(record.clause_count)
    .bind(record.word_count)
    .bind(record.status.as_str())
    .bind(&record.upload_time)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_document(pool: &SqlitePool, id: &str) -> Result<Option<DocumentRecord>> {
    let row = sqlx::query("SELECT * FROM documents WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| document_from_row(&r)).transpose()
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<DocumentRecord> {
    let status: String = row.get("status");
    Ok(DocumentRecord {
        id: row.get("id"),
        filename: row.get("filename"),
        original_text: row.get("original_text"),
        simplified_text: row.get("simplified_text"),
        language: row.get("language"),
        processing_time: row.get("processing_time"),
        clause_count: row.get("clause_count"),
        word_count: row.get("word_count"),
        status: DocumentStatus::parse(&status)
            .with_context(|| format!("unknown document status: {}", status))?,
        upload_time: row.get("upload_time"),
    })
}

/// All documents, newest first, with the total count.
pub async fn list_documents(pool: &SqlitePool) -> Result<(Vec<DocumentSummary>, i64)> {
    let rows = sqlx::query(
        "SELECT id, filename, upload_time, language, word_count, status
         FROM documents ORDER BY upload_time DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut summaries = Vec::with_capacity(rows.len());
    for row in &rows {
        let status: String = row.get("status");
        summaries.push(DocumentSummary {
            id: row.get("id"),
            filename: row.get("filename"),
            upload_time: row.get("upload_time"),
            language: row.get("language"),
            word_count: row.get("word_count"),
            status: DocumentStatus::parse(&status)
                .with_context(|| format!("unknown document status: {}", status))?,
        });
    }

    let total = summaries.len() as i64;
    Ok((summaries, total))
}

/// Hard delete. Returns the number of rows removed; deleting an absent id is
/// not an error at this layer.
pub async fn delete_document(pool: &SqlitePool, id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Generates a chat session id embedding the timestamp and a hash of the
/// message. Not guaranteed globally unique; colliding saves last-write-win.
pub fn generate_session_id(message: &str, now: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let hash = u64::from_le_bytes(prefix) % 1000;
    format!("chat_{}_{}", now.format("%Y%m%d_%H%M%S"), hash)
}

/// Appends a turn to the session's transcript, creating the session row if it
/// does not exist. `created_at` is preserved across appends.
pub async fn append_chat_turn(
    pool: &SqlitePool,
    session_id: &str,
    document_id: Option<&str>,
    turn: ChatTurn,
) -> Result<()> {
    let existing = sqlx::query("SELECT messages, created_at FROM chat_sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    let now = Utc::now().to_rfc3339();
    let (mut messages, created_at) = match &existing {
        Some(row) => {
            let blob: String = row.get("messages");
            let messages: Vec<ChatTurn> =
                serde_json::from_str(&blob).context("corrupt chat transcript")?;
            (messages, row.get::<String, _>("created_at"))
        }
        None => (Vec::new(), now.clone()),
    };
    messages.push(turn);

    sqlx::query(
        r#"
        INSERT OR REPLACE INTO chat_sessions (session_id, document_id, messages, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(session_id)
    .bind(document_id)
    .bind(serde_json::to_string(&messages)?)
    .bind(created_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_chat_session(
    pool: &SqlitePool,
    session_id: &str,
) -> Result<Option<ChatSessionRecord>> {
    let row = sqlx::query("SELECT * FROM chat_sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| {
        let blob: String = r.get("messages");
        let messages: Vec<ChatTurn> =
            serde_json::from_str(&blob).context("corrupt chat transcript")?;
        Ok(ChatSessionRecord {
            session_id: r.get("session_id"),
            document_id: r.get("document_id"),
            messages,
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        })
    })
    .transpose()
}

/// Aggregates over every stored document. Word totals and the processing-time
/// average only count completed documents; the distributions count all.
pub async fn stats(pool: &SqlitePool) -> Result<StatsSummary> {
    let rows = sqlx::query("SELECT language, status, word_count, processing_time FROM documents")
        .fetch_all(pool)
        .await?;

    let mut summary = StatsSummary {
        total_documents_processed: rows.len() as i64,
        total_words_processed: 0,
        average_processing_time_seconds: 0.0,
        language_distribution: Default::default(),
        status_distribution: Default::default(),
    };

    let mut completed = 0i64;
    let mut completed_time = 0.0f64;
    for row in &rows {
        let language: String = row.get("language");
        let status: String = row.get("status");
        if status == DocumentStatus::Completed.as_str() {
            summary.total_words_processed += row.get::<i64, _>("word_count");
            completed_time += row.get::<f64, _>("processing_time");
            completed += 1;
        }
        *summary.language_distribution.entry(language).or_insert(0) += 1;
        *summary.status_distribution.entry(status).or_insert(0) += 1;
    }

    if completed > 0 {
        summary.average_processing_time_seconds =
            (completed_time / completed as f64 * 100.0).round() / 100.0;
    }

    Ok(summary)
}
