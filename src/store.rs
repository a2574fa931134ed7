//! Persistence for identified chunks and their embedding vectors.
//!
//! The store exposes exactly what ingestion needs: the full set of
//! persisted identifiers, a conditional insert keyed by identifier, and
//! a vector upsert. Deduplication is enforced here with
//! `ON CONFLICT(id) DO NOTHING`, so two concurrent ingests over the same
//! batch may both do the work but only one row is ever persisted per
//! identifier.

use std::collections::HashSet;

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::embedding;
use crate::models::Chunk;

/// Fetch every persisted chunk identifier (identifiers only, no content).
pub async fn existing_ids(pool: &SqlitePool) -> Result<HashSet<String>> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM chunks")
        .fetch_all(pool)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Insert chunks keyed by identifier, skipping ones already present.
/// Runs in one transaction; the commit is the durability point. Returns
/// the number of rows actually inserted.
pub async fn insert_chunks(pool: &SqlitePool, chunks: &[Chunk]) -> Result<u64> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for chunk in chunks {
        let result = sqlx::query(
            r#"
            INSERT INTO chunks (id, source, page, seq, text, hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&chunk.id)
        .bind(&chunk.source)
        .bind(chunk.page)
        .bind(chunk.seq)
        .bind(&chunk.text)
        .bind(&chunk.hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Store (or replace) the embedding vector for a chunk.
pub async fn upsert_vector(
    pool: &SqlitePool,
    chunk_id: &str,
    model: &str,
    dims: usize,
    blob: &[u8],
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO chunk_vectors (chunk_id, model, dims, embedding, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(chunk_id) DO UPDATE SET
            model = excluded.model,
            dims = excluded.dims,
            embedding = excluded.embedding,
            created_at = excluded.created_at
        "#,
    )
    .bind(chunk_id)
    .bind(model)
    .bind(dims as i64)
    .bind(blob)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn chunk_count(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
        .fetch_one(pool)
        .await?)
}

pub async fn vector_count(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
        .fetch_one(pool)
        .await?)
}

/// A chunk scored against a query vector.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub source: String,
    pub page: i64,
    pub text: String,
    pub score: f64,
}

/// Brute-force cosine scan over all stored vectors, best `k` first.
pub async fn similar_chunks(
    pool: &SqlitePool,
    query_vec: &[f32],
    k: usize,
) -> Result<Vec<ScoredChunk>> {
    let rows = sqlx::query(
        r#"
        SELECT cv.chunk_id, cv.embedding, c.source, c.page, c.text
        FROM chunk_vectors cv
        JOIN chunks c ON c.id = cv.chunk_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut scored: Vec<ScoredChunk> = rows
        .iter()
        .map(|row| {
            let blob: Vec<u8> = row.get("embedding");
            let vec = embedding::blob_to_vec(&blob);
            ScoredChunk {
                chunk_id: row.get("chunk_id"),
                source: row.get("source"),
                page: row.get("page"),
                text: row.get("text"),
                score: embedding::cosine_similarity(query_vec, &vec) as f64,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.chunk_id.cmp(&b.chunk_id))
    });
    scored.truncate(k);

    Ok(scored)
}
