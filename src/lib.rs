//! # ragserve
//!
//! A small PDF question-answering service with incremental chunk
//! ingestion.
//!
//! ragserve loads PDF (and plain-text) documents from a local directory,
//! splits them into overlapping chunks, assigns each chunk a stable
//! identifier derived from its source document and page, deduplicates
//! against the chunks already persisted in a SQLite-backed vector store,
//! and answers prompts over HTTP using the most similar stored chunks as
//! context for a chat-completion model.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────────────┐   ┌──────────┐
//! │ Documents │──▶│ Split → Identify →    │──▶│  SQLite   │
//! │ (PDF/txt) │   │ Dedup → Embed        │   │ id + vec  │
//! └───────────┘   └──────────────────────┘   └────┬─────┘
//!                                                 │
//!                             ┌───────────────────┤
//!                             ▼                   ▼
//!                        ┌──────────┐       ┌──────────┐
//!                        │   CLI    │       │   HTTP   │
//!                        │(ragserve)│       │  (axum)  │
//!                        └──────────┘       └──────────┘
//! ```
//!
//! The chunk identifier is `source:page:index`, where `index` restarts
//! at 0 on every new `source:page` run and increments while the run
//! repeats. Re-ingesting an unchanged directory is therefore a no-op:
//! every identifier is already present in the store.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration + env-sourced secrets |
//! | [`models`] | Core data types |
//! | [`loader`] | Document-directory scan and PDF extraction |
//! | [`chunk`] | Overlapping text splitter |
//! | [`identity`] | Chunk-identifier assignment and dedup partition |
//! | [`store`] | Chunk + vector persistence, similarity scan |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`llm`] | Chat-completion provider |
//! | [`ingest`] | Pipeline orchestration |
//! | [`server`] | HTTP surface |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod identity;
pub mod ingest;
pub mod llm;
pub mod loader;
pub mod migrate;
pub mod models;
pub mod server;
pub mod stats;
pub mod store;
