use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates the schema on an existing pool. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Documents table: one terminal record per upload
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            original_text TEXT NOT NULL,
            simplified_text TEXT NOT NULL,
            language TEXT NOT NULL,
            processing_time REAL NOT NULL,
            clause_count INTEGER NOT NULL,
            word_count INTEGER NOT NULL,
            status TEXT NOT NULL,
            upload_time TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Chat transcripts: one row per session, messages stored as a JSON array
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chat_sessions (
            session_id TEXT PRIMARY KEY,
            document_id TEXT,
            messages TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_upload_time ON documents(upload_time DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
