//! Database statistics overview.
//!
//! Prints document counts, word totals, and language/status breakdowns.
//! Used by `plaindoc stats` to confirm that ingestion is producing the
//! terminal records it should.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::store;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    crate::migrate::apply_schema(&pool).await?;

    let summary = store::stats(&pool).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("PlainDoc — Database Stats");
    println!("=========================");
    println!();
    println!("  Database:        {}", config.db.path.display());
    println!("  Size:            {}", format_bytes(db_size));
    println!();
    println!("  Documents:       {}", summary.total_documents_processed);
    println!("  Words processed: {}", summary.total_words_processed);
    println!(
        "  Avg processing:  {:.2}s",
        summary.average_processing_time_seconds
    );

    if !summary.language_distribution.is_empty() {
        println!();
        println!("  By language:");
        for (lang, count) in &summary.language_distribution {
            println!("    {:<8} {}", lang, count);
        }
    }

    if !summary.status_distribution.is_empty() {
        println!();
        println!("  By status:");
        for (status, count) in &summary.status_distribution {
            println!("    {:<12} {}", status, count);
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
