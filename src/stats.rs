//! Store and documents-directory health overview.
//!
//! Gives a quick summary of what's ingested: chunk counts, embedding
//! coverage, and a per-document breakdown. Used by `ragserve stats` to
//! confirm ingestion and embedding are behaving.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::store;

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_chunks = store::chunk_count(&pool).await?;
    let total_embedded = store::vector_count(&pool).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    let docs_dir = &config.documents.dir;
    let docs_status = if docs_dir.exists() { "OK" } else { "MISSING" };

    println!("ragserve — store stats");
    println!("======================");
    println!();
    println!("  Documents:   {} ({})", docs_dir.display(), docs_status);
    println!("  Store:       {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Chunks:      {}", total_chunks);
    println!(
        "  Embedded:    {} / {} ({}%)",
        total_embedded,
        total_chunks,
        if total_chunks > 0 {
            (total_embedded * 100) / total_chunks
        } else {
            0
        }
    );

    let source_rows = sqlx::query(
        r#"
        SELECT
            c.source,
            COUNT(DISTINCT c.page) AS page_count,
            COUNT(c.id) AS chunk_count,
            COUNT(cv.chunk_id) AS embedded_count
        FROM chunks c
        LEFT JOIN chunk_vectors cv ON cv.chunk_id = c.id
        GROUP BY c.source
        ORDER BY c.source
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if !source_rows.is_empty() {
        println!();
        println!("  By document:");
        println!(
            "  {:<40} {:>6} {:>8} {:>10}",
            "SOURCE", "PAGES", "CHUNKS", "EMBEDDED"
        );
        println!("  {}", "-".repeat(68));
        for row in &source_rows {
            let source: String = row.get("source");
            println!(
                "  {:<40} {:>6} {:>8} {:>10}",
                source,
                row.get::<i64, _>("page_count"),
                row.get::<i64, _>("chunk_count"),
                row.get::<i64, _>("embedded_count")
            );
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
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
