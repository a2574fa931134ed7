//! Document-directory scanning and text extraction.
//!
//! Walks the configured documents directory, extracts PDF text page by
//! page (`pdf-extract`), and reads plain-text files as single-page
//! documents. Files are visited in sorted relative-path order and pages
//! in document order, so downstream identifier assignment sees a stable,
//! page-grouped sequence. Unreadable documents are skipped and counted,
//! never fatal.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::Config;
use crate::models::DocumentPage;

/// Result of one directory scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Extracted pages, in sorted document order then page order.
    pub pages: Vec<DocumentPage>,
    /// Documents successfully read.
    pub documents: usize,
    /// Documents skipped because extraction failed.
    pub skipped: usize,
}

/// Scan the documents directory and extract every page of every matching
/// file. `limit`, when set, caps the number of documents read.
pub fn scan_documents(config: &Config, limit: Option<usize>) -> Result<ScanOutcome> {
    let root = &config.documents.dir;
    if !root.exists() {
        bail!("Documents directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.documents.include_globs)?;
    let exclude_set = build_globset(&config.documents.exclude_globs)?;

    let mut paths: Vec<(String, std::path::PathBuf)> = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        paths.push((rel_str, path.to_path_buf()));
    }

    // Sorted traversal keeps chunk identifiers stable across scans.
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    if let Some(lim) = limit {
        paths.truncate(lim);
    }

    let mut outcome = ScanOutcome::default();

    for (rel, path) in &paths {
        match extract_pages(path) {
            Ok(texts) => {
                outcome.documents += 1;
                for (page, text) in texts.into_iter().enumerate() {
                    outcome.pages.push(DocumentPage {
                        source: rel.clone(),
                        page: page as i64,
                        text,
                    });
                }
            }
            Err(e) => {
                tracing::warn!(source = %rel, error = %e, "skipping unreadable document");
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

/// Extract one text string per page. Plain-text formats are a single
/// page 0; PDFs use the extractor's page boundaries.
fn extract_pages(path: &Path) -> Result<Vec<String>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => {
            let pages = pdf_extract::extract_text_by_pages(path)
                .map_err(|e| anyhow::anyhow!("PDF extraction failed: {}", e))?;
            Ok(pages)
        }
        _ => {
            let body = std::fs::read_to_string(path)?;
            Ok(vec![body])
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
