//! Store and pipeline integration tests against a temporary SQLite database.

use std::sync::Arc;

use plaindoc::ai::AiClient;
use plaindoc::config::{AiConfig, Config, DbConfig, ServerConfig, UploadConfig};
use plaindoc::models::{ChatTurn, DocumentRecord, DocumentStatus};
use plaindoc::simplify::{Simplifier, FALLBACK_MARKER};
use plaindoc::{db, ingest, migrate, store};

use sqlx::SqlitePool;
use tempfile::TempDir;

async fn test_pool() -> (TempDir, SqlitePool) {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        db: DbConfig {
            path: tmp.path().join("plaindoc.sqlite"),
            max_connections: 5,
        },
        server: ServerConfig {
            bind: "127.0.0.1:0".to_string(),
        },
        upload: UploadConfig::default(),
        ai: AiConfig::default(),
    };
    let pool = db::connect(&config).await.unwrap();
    migrate::apply_schema(&pool).await.unwrap();
    (tmp, pool)
}

/// A simplifier with no API key configured: every call takes the rule-based
/// fallback path without touching the network.
fn offline_simplifier() -> Simplifier {
    let ai = AiClient::new(&AiConfig::default(), None).unwrap();
    Simplifier::new(Arc::new(ai))
}

fn sample_record(id: &str, upload_time: &str, status: DocumentStatus) -> DocumentRecord {
    DocumentRecord {
        id: id.to_string(),
        filename: format!("{}.txt", id),
        original_text: "The tenant shall pay rent on the first of each month.".to_string(),
        simplified_text: "The tenant will pay rent monthly.".to_string(),
        language: "en".to_string(),
        processing_time: 1.5,
        clause_count: 1,
        word_count: 10,
        status,
        upload_time: upload_time.to_string(),
    }
}

#[tokio::test]
async fn insert_then_get_round_trips() {
    let (_tmp, pool) = test_pool().await;

    let record = sample_record("doc-1", "2026-08-27T10:00:00+00:00", DocumentStatus::Completed);
    store::insert_document(&pool, &record).await.unwrap();

    let fetched = store::get_document(&pool, "doc-1").await.unwrap().unwrap();
    assert_eq!(fetched.filename, "doc-1.txt");
    assert_eq!(fetched.status, DocumentStatus::Completed);
    assert_eq!(fetched.word_count, 10);
    assert_eq!(fetched.upload_time, "2026-08-27T10:00:00+00:00");
}

#[tokio::test]
async fn get_missing_document_returns_none() {
    let (_tmp, pool) = test_pool().await;
    assert!(store::get_document(&pool, "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn listing_orders_by_upload_time_descending() {
    let (_tmp, pool) = test_pool().await;

    for (id, ts) in [
        ("doc-a", "2026-08-25T09:00:00+00:00"),
        ("doc-b", "2026-08-27T09:00:00+00:00"),
        ("doc-c", "2026-08-26T09:00:00+00:00"),
    ] {
        store::insert_document(&pool, &sample_record(id, ts, DocumentStatus::Completed))
            .await
            .unwrap();
    }

    let (docs, total) = store::list_documents(&pool).await.unwrap();
    assert_eq!(total, 3);
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["doc-b", "doc-c", "doc-a"]);
}

#[tokio::test]
async fn delete_then_get_returns_none_and_absent_delete_is_quiet() {
    let (_tmp, pool) = test_pool().await;

    let record = sample_record("doc-1", "2026-08-27T10:00:00+00:00", DocumentStatus::Completed);
    store::insert_document(&pool, &record).await.unwrap();

    assert_eq!(store::delete_document(&pool, "doc-1").await.unwrap(), 1);
    assert!(store::get_document(&pool, "doc-1").await.unwrap().is_none());

    // Idempotent at the storage layer
    assert_eq!(store::delete_document(&pool, "doc-1").await.unwrap(), 0);
    assert_eq!(store::delete_document(&pool, "never-existed").await.unwrap(), 0);
}

#[tokio::test]
async fn chat_turns_append_to_the_same_session() {
    let (_tmp, pool) = test_pool().await;

    let turn = |q: &str, a: &str| ChatTurn {
        user_message: q.to_string(),
        ai_response: a.to_string(),
        timestamp: "2026-08-27T10:00:00+00:00".to_string(),
    };

    store::append_chat_turn(&pool, "chat_x_1", Some("doc-1"), turn("q1", "a1"))
        .await
        .unwrap();
    store::append_chat_turn(&pool, "chat_x_1", Some("doc-1"), turn("q2", "a2"))
        .await
        .unwrap();

    let session = store::get_chat_session(&pool, "chat_x_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].user_message, "q1");
    assert_eq!(session.messages[1].ai_response, "a2");
    assert_eq!(session.document_id.as_deref(), Some("doc-1"));
}

#[tokio::test]
async fn documentless_chat_sessions_store_null_document_id() {
    let (_tmp, pool) = test_pool().await;

    let turn = ChatTurn {
        user_message: "general question".to_string(),
        ai_response: "general answer".to_string(),
        timestamp: "2026-08-27T10:00:00+00:00".to_string(),
    };
    store::append_chat_turn(&pool, "chat_y_2", None, turn)
        .await
        .unwrap();

    let session = store::get_chat_session(&pool, "chat_y_2")
        .await
        .unwrap()
        .unwrap();
    assert!(session.document_id.is_none());
}

#[tokio::test]
async fn missing_chat_session_returns_none() {
    let (_tmp, pool) = test_pool().await;
    assert!(store::get_chat_session(&pool, "chat_missing")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn stats_aggregate_totals_and_distributions() {
    let (_tmp, pool) = test_pool().await;

    let mut completed = sample_record("doc-1", "2026-08-27T10:00:00+00:00", DocumentStatus::Completed);
    completed.word_count = 100;
    completed.processing_time = 2.0;
    store::insert_document(&pool, &completed).await.unwrap();

    let mut completed_hi = sample_record("doc-2", "2026-08-27T11:00:00+00:00", DocumentStatus::Completed);
    completed_hi.language = "hi".to_string();
    completed_hi.word_count = 50;
    completed_hi.processing_time = 4.0;
    store::insert_document(&pool, &completed_hi).await.unwrap();

    let mut errored = sample_record("doc-3", "2026-08-27T12:00:00+00:00", DocumentStatus::Error);
    errored.word_count = 30;
    errored.processing_time = 0.0;
    store::insert_document(&pool, &errored).await.unwrap();

    let summary = store::stats(&pool).await.unwrap();
    assert_eq!(summary.total_documents_processed, 3);
    // Word totals and the time average only count completed documents
    assert_eq!(summary.total_words_processed, 150);
    assert!((summary.average_processing_time_seconds - 3.0).abs() < 1e-9);
    assert_eq!(summary.language_distribution.get("en"), Some(&2));
    assert_eq!(summary.language_distribution.get("hi"), Some(&1));
    assert_eq!(summary.status_distribution.get("completed"), Some(&2));
    assert_eq!(summary.status_distribution.get("error"), Some(&1));
}

#[tokio::test]
async fn stats_on_empty_database_are_zeroed() {
    let (_tmp, pool) = test_pool().await;
    let summary = store::stats(&pool).await.unwrap();
    assert_eq!(summary.total_documents_processed, 0);
    assert_eq!(summary.total_words_processed, 0);
    assert_eq!(summary.average_processing_time_seconds, 0.0);
    assert!(summary.language_distribution.is_empty());
}

#[tokio::test]
async fn pipeline_persists_terminal_record_with_fallback_text() {
    let (_tmp, pool) = test_pool().await;
    let simplifier = offline_simplifier();

    let text = "The lessee shall indemnify the lessor against all claims arising hereunder. \
                Notice periods are defined in the aforementioned schedule.";
    let record = ingest::process_document(
        &pool,
        &simplifier,
        "doc-pipeline",
        "lease.txt",
        text,
        "en",
        "simple",
    )
    .await
    .unwrap();

    assert_eq!(record.status, DocumentStatus::Completed);
    assert!(record.simplified_text.starts_with(FALLBACK_MARKER));
    assert!(record.simplified_text.contains("will indemnify"));
    assert_eq!(record.word_count, ingest::word_count(text));
    assert_eq!(record.clause_count, 2);

    let fetched = store::get_document(&pool, "doc-pipeline")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.simplified_text, record.simplified_text);
}

#[tokio::test]
async fn deferred_processing_reaches_a_terminal_status() {
    let (_tmp, pool) = test_pool().await;
    let simplifier = Arc::new(offline_simplifier());

    ingest::spawn_processing(
        pool.clone(),
        simplifier,
        "doc-deferred".to_string(),
        "deferred.txt".to_string(),
        "The party of the first part shall deliver the goods promptly.".to_string(),
        "en".to_string(),
        "simple".to_string(),
    );

    // Fire-and-forget: poll by id for the terminal record
    let mut fetched = None;
    for _ in 0..50 {
        if let Some(record) = store::get_document(&pool, "doc-deferred").await.unwrap() {
            fetched = Some(record);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    let record = fetched.expect("deferred processing never produced a record");
    assert_eq!(record.status, DocumentStatus::Completed);
    assert!(record.simplified_text.contains("first party will deliver"));
}
