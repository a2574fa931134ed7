//! Integration tests for the ragserve CLI.
//!
//! Each test gets its own temp directory with a config file, a documents
//! directory, and a store path, and drives the compiled binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ragserve_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ragserve");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    fs::create_dir_all(root.join("docs")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/ragserve.sqlite"

[documents]
dir = "{}/docs"
include_globs = ["**/*.pdf", "**/*.md", "**/*.txt"]
exclude_globs = []

[chunking]
max_chars = 800
overlap_chars = 80

[server]
bind = "127.0.0.1:7431"
"#,
        root.display(),
        root.display()
    );

    let config_path = root.join("config").join("ragserve.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn write_sample_docs(root: &Path) {
    let docs = root.join("docs");
    fs::write(
        docs.join("alpha.md"),
        "# Alpha Document\n\nThis is the alpha document about Rust programming.\n\nIt covers cargo and crates.",
    )
    .unwrap();
    fs::write(
        docs.join("gamma.txt"),
        "Gamma plain text file.\n\nNotes about deployment and infrastructure.",
    )
    .unwrap();
}

fn run_ragserve(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ragserve_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ragserve binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_creates_store() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_ragserve(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("ragserve.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_ragserve(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_ragserve(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_ingest_empty_directory() {
    let (_tmp, config_path) = setup_test_env();

    run_ragserve(&config_path, &["init"]);
    let (stdout, stderr, success) = run_ragserve(&config_path, &["ingest"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No new documents to add"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_ingest_adds_then_no_op() {
    let (tmp, config_path) = setup_test_env();
    write_sample_docs(tmp.path());

    run_ragserve(&config_path, &["init"]);

    // Both sample docs fit in one chunk each.
    let (stdout1, stderr1, success1) = run_ragserve(&config_path, &["ingest"]);
    assert!(success1, "ingest failed: {} {}", stdout1, stderr1);
    assert!(
        stdout1.contains("Added new documents: 2"),
        "expected two new chunks on first ingest, got: {}",
        stdout1
    );

    // Unchanged directory: everything deduplicates away.
    let (stdout2, _, success2) = run_ragserve(&config_path, &["ingest"]);
    assert!(success2);
    assert!(
        stdout2.contains("No new documents to add"),
        "expected no-op on second ingest, got: {}",
        stdout2
    );
    assert!(stdout2.contains("new chunks persisted: 0"));
}

#[test]
fn test_ingest_picks_up_new_document() {
    let (tmp, config_path) = setup_test_env();
    write_sample_docs(tmp.path());

    run_ragserve(&config_path, &["init"]);
    run_ragserve(&config_path, &["ingest"]);

    fs::write(
        tmp.path().join("docs").join("zeta.txt"),
        "A document added after the first ingest.",
    )
    .unwrap();

    let (stdout, _, success) = run_ragserve(&config_path, &["ingest"]);
    assert!(success);
    assert!(
        stdout.contains("Added new documents: 1"),
        "only the new document's chunk should persist, got: {}",
        stdout
    );
}

#[test]
fn test_ingest_dry_run_writes_nothing() {
    let (tmp, config_path) = setup_test_env();
    write_sample_docs(tmp.path());

    run_ragserve(&config_path, &["init"]);
    let (stdout, _, success) = run_ragserve(&config_path, &["ingest", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("documents found: 2"));
    assert!(stdout.contains("estimated chunks: 2"));

    // A real ingest afterwards still sees everything as new.
    let (stdout, _, _) = run_ragserve(&config_path, &["ingest"]);
    assert!(stdout.contains("Added new documents: 2"));
}

#[test]
fn test_ingest_with_limit() {
    let (tmp, config_path) = setup_test_env();
    write_sample_docs(tmp.path());

    run_ragserve(&config_path, &["init"]);
    let (stdout, _, success) = run_ragserve(&config_path, &["ingest", "--limit", "1"]);
    assert!(success);
    assert!(
        stdout.contains("Added new documents: 1"),
        "limit should cap documents, got: {}",
        stdout
    );
}

#[test]
fn test_corrupt_pdf_is_skipped() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("docs").join("bad.pdf"), b"not a valid pdf").unwrap();
    fs::write(tmp.path().join("docs").join("good.txt"), "Readable body.").unwrap();

    run_ragserve(&config_path, &["init"]);
    let (stdout, stderr, success) = run_ragserve(&config_path, &["ingest"]);
    assert!(success, "ingest must succeed: {} {}", stdout, stderr);
    assert!(
        stdout.contains("extraction skipped: 1"),
        "bad.pdf should be skipped, got: {}",
        stdout
    );
    assert!(stdout.contains("Added new documents: 1"));
}

/// Build a small single-page PDF with one line of Courier text.
fn sample_pdf(text: &str) -> lopdf::Document {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().unwrap(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

#[test]
fn test_wellformed_pdf_is_ingested_or_cleanly_skipped() {
    let (tmp, config_path) = setup_test_env();
    let mut doc = sample_pdf("chunk identity fixture");
    doc.save(tmp.path().join("docs").join("fixture.pdf")).unwrap();

    run_ragserve(&config_path, &["init"]);
    let (stdout, stderr, success) = run_ragserve(&config_path, &["ingest"]);
    assert!(success, "ingest must not crash on a PDF: {} {}", stdout, stderr);
    assert!(
        stdout.contains("documents scanned: 1") || stdout.contains("extraction skipped: 1"),
        "the PDF must be counted one way or the other, got: {}",
        stdout
    );

    // Whatever the extractor produced, a second pass adds nothing new.
    let (stdout2, _, success2) = run_ragserve(&config_path, &["ingest"]);
    assert!(success2);
    assert!(stdout2.contains("No new documents to add"));
}

#[test]
fn test_ingest_missing_documents_dir_fails() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_dir_all(tmp.path().join("docs")).unwrap();

    run_ragserve(&config_path, &["init"]);
    let (_, stderr, success) = run_ragserve(&config_path, &["ingest"]);
    assert!(!success, "ingest with missing directory should fail");
    assert!(
        stderr.contains("does not exist"),
        "should name the missing directory, got: {}",
        stderr
    );
}

#[test]
fn test_stats_reports_counts() {
    let (tmp, config_path) = setup_test_env();
    write_sample_docs(tmp.path());

    run_ragserve(&config_path, &["init"]);
    run_ragserve(&config_path, &["ingest"]);

    let (stdout, _, success) = run_ragserve(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Chunks:      2"), "got: {}", stdout);
    assert!(stdout.contains("alpha.md"));
    assert!(stdout.contains("gamma.txt"));
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, config_path) = setup_test_env();
    let bad = format!(
        r#"[db]
path = "{}/data/ragserve.sqlite"

[documents]
dir = "{}/docs"

[chunking]
max_chars = 100
overlap_chars = 100
"#,
        tmp.path().display(),
        tmp.path().display()
    );
    fs::write(&config_path, bad).unwrap();

    let (_, stderr, success) = run_ragserve(&config_path, &["init"]);
    assert!(!success, "overlap >= max_chars must be rejected");
    assert!(stderr.contains("overlap_chars"));
}
