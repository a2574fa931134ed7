//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow: directory scan → per-page splitting →
//! identifier assignment → deduplication against the persisted
//! identifier set → embedding (non-fatal) → conditional insert. The
//! whole directory is re-read on every run; the identifier dedup is what
//! makes repeat runs cheap on the write side.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::chunk::split_text;
use crate::config::Config;
use crate::db;
use crate::embedding;
use crate::identity;
use crate::loader;
use crate::models::{Chunk, Fragment};
use crate::store;

/// Summary of one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: usize,
    pub extraction_skipped: usize,
    pub pages: usize,
    pub chunks: usize,
    pub new_chunks: usize,
    pub embedded: u64,
    pub embeddings_pending: u64,
}

impl IngestReport {
    /// The store message exposed on the HTTP surface.
    pub fn db_message(&self) -> String {
        if self.new_chunks > 0 {
            format!("Added new documents: {}", self.new_chunks)
        } else {
            "No new documents to add".to_string()
        }
    }
}

/// Run one ingestion pass against an open store.
pub async fn run_ingest(
    config: &Config,
    pool: &SqlitePool,
    limit: Option<usize>,
) -> Result<IngestReport> {
    let scan = loader::scan_documents(config, limit)?;

    let mut fragments: Vec<Fragment> = Vec::new();
    for page in &scan.pages {
        for piece in split_text(
            &page.text,
            config.chunking.max_chars,
            config.chunking.overlap_chars,
        ) {
            fragments.push(Fragment {
                source: page.source.clone(),
                page: page.page,
                text: piece,
            });
        }
    }

    let chunks = identity::assign_chunk_ids(fragments);
    let total_chunks = chunks.len();

    let existing = store::existing_ids(pool).await?;
    let new_chunks = identity::partition_new(chunks, &existing);

    let mut report = IngestReport {
        documents: scan.documents,
        extraction_skipped: scan.skipped,
        pages: scan.pages.len(),
        chunks: total_chunks,
        new_chunks: new_chunks.len(),
        ..Default::default()
    };

    if !new_chunks.is_empty() {
        store::insert_chunks(pool, &new_chunks).await?;
        let (embedded, pending) = embed_chunks_inline(config, pool, &new_chunks).await;
        report.embedded = embedded;
        report.embeddings_pending = pending;
    }

    Ok(report)
}

/// Embed freshly inserted chunks. Non-fatal: failures leave chunks
/// persisted without vectors and are only counted.
async fn embed_chunks_inline(config: &Config, pool: &SqlitePool, chunks: &[Chunk]) -> (u64, u64) {
    if !config.embedding.is_enabled() {
        return (0, 0);
    }

    let provider = match embedding::create_provider(&config.embedding) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "could not create embedding provider");
            return (0, chunks.len() as u64);
        }
    };

    let mut embedded = 0u64;
    let mut pending = 0u64;

    for batch in chunks.chunks(config.embedding.batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

        match embedding::embed_texts(&config.embedding, &texts).await {
            Ok(vectors) => {
                for (chunk, vec) in batch.iter().zip(vectors.iter()) {
                    let blob = embedding::vec_to_blob(vec);
                    match store::upsert_vector(
                        pool,
                        &chunk.id,
                        provider.model_name(),
                        provider.dims(),
                        &blob,
                    )
                    .await
                    {
                        Ok(()) => embedded += 1,
                        Err(e) => {
                            tracing::warn!(chunk_id = %chunk.id, error = %e, "failed to store embedding");
                            pending += 1;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "embedding batch failed");
                pending += batch.len() as u64;
            }
        }
    }

    (embedded, pending)
}

/// CLI entry point for `ragserve ingest`.
pub async fn run_ingest_cmd(config: &Config, dry_run: bool, limit: Option<usize>) -> Result<()> {
    if dry_run {
        let scan = loader::scan_documents(config, limit)?;
        let estimated: usize = scan
            .pages
            .iter()
            .map(|p| {
                split_text(
                    &p.text,
                    config.chunking.max_chars,
                    config.chunking.overlap_chars,
                )
                .len()
            })
            .sum();
        println!("ingest (dry-run)");
        println!("  documents found: {}", scan.documents);
        println!("  extraction skipped: {}", scan.skipped);
        println!("  estimated chunks: {}", estimated);
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let report = run_ingest(config, &pool, limit).await?;

    println!("ingest");
    println!("  documents scanned: {}", report.documents);
    if report.extraction_skipped > 0 {
        println!("  extraction skipped: {}", report.extraction_skipped);
    }
    println!("  pages: {}", report.pages);
    println!("  chunks: {}", report.chunks);
    println!("  new chunks persisted: {}", report.new_chunks);
    if config.embedding.is_enabled() {
        println!("  embeddings written: {}", report.embedded);
        println!("  embeddings pending: {}", report.embeddings_pending);
    }
    println!("  {}", report.db_message());
    println!("ok");

    pool.close().await;
    Ok(())
}
