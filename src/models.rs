//! Core data models used throughout ragserve.
//!
//! These types represent the document pages, split fragments, and
//! identified chunks that flow through the ingestion pipeline.

/// One page of extracted text from a source document.
///
/// Produced by the loader; `source` is the document path relative to the
/// configured documents directory, `page` is zero-based.
#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub source: String,
    pub page: i64,
    pub text: String,
}

/// A split piece of a page's text, before identifier assignment.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub source: String,
    pub page: i64,
    pub text: String,
}

/// A chunk carrying its stable identifier, ready for persistence.
///
/// `id` is `source:page:seq`, where `seq` restarts at 0 whenever the
/// `source:page` prefix changes from the previous chunk in batch order.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub source: String,
    pub page: i64,
    pub seq: i64,
    pub text: String,
    pub hash: String,
}
