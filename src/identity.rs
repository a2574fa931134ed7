//! Stable chunk-identifier assignment and batch deduplication.
//!
//! Identifiers have the form `source:page:seq`. The `seq` counter
//! restarts at 0 whenever the `source:page` prefix differs from the
//! previous fragment in batch order, and increments while it repeats.
//! Uniqueness within a batch therefore depends on fragments arriving in
//! page-grouped order; the loader guarantees that by scanning documents
//! in sorted order and emitting pages and splits in sequence.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::{Chunk, Fragment};

/// Assign identifiers to fragments in batch order.
pub fn assign_chunk_ids(fragments: Vec<Fragment>) -> Vec<Chunk> {
    let mut last_page_key: Option<String> = None;
    let mut seq: i64 = 0;

    fragments
        .into_iter()
        .map(|frag| {
            let page_key = format!("{}:{}", frag.source, frag.page);
            if last_page_key.as_deref() == Some(page_key.as_str()) {
                seq += 1;
            } else {
                seq = 0;
            }
            let id = format!("{}:{}", page_key, seq);
            last_page_key = Some(page_key);

            let hash = hash_text(&frag.text);
            Chunk {
                id,
                source: frag.source,
                page: frag.page,
                seq,
                text: frag.text,
                hash,
            }
        })
        .collect()
}

/// Split a batch into the chunks whose identifier is not yet persisted.
///
/// Chunks keep their batch order. Already-present chunks are dropped.
pub fn partition_new(chunks: Vec<Chunk>, existing: &HashSet<String>) -> Vec<Chunk> {
    chunks
        .into_iter()
        .filter(|c| !existing.contains(&c.id))
        .collect()
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
