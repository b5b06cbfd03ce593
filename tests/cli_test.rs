//! Runs the built binary against the fixtures.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use zip::ZipArchive;

fn snipzip(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_snipzip"))
        .args(args)
        .current_dir(cwd)
        .env("SNIPZIP_LOG", "off")
        .output()
        .expect("Failed to run snipzip")
}

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .display()
        .to_string()
}

#[test]
fn extract_writes_code_snippets_zip_by_default() {
    let dir = TempDir::new().unwrap();
    let output = snipzip(&["extract", &fixture("manifest_round_trip.md")], dir.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let bytes = fs::read(dir.path().join("code_snippets.zip")).unwrap();
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 3);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello-world-plugin/pom.xml"));
    assert!(stdout.contains("sha256:"));
}

#[test]
fn extract_several_inputs_into_directory() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("archives");
    let output = snipzip(
        &[
            "extract",
            &fixture("fallback.md"),
            &fixture("collision.md"),
            "-o",
            &out.display().to_string(),
        ],
        dir.path(),
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("fallback.zip").exists());
    assert!(out.join("collision.zip").exists());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Summary:"));
}

#[test]
fn dry_run_leaves_no_archive() {
    let dir = TempDir::new().unwrap();
    let output = snipzip(&["--dry-run", "extract", &fixture("collision.md")], dir.path());
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("[DRY RUN] Would write"));
    assert!(!dir.path().join("code_snippets.zip").exists());
}

#[test]
fn no_code_exits_non_zero_with_diagnostic() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prose.md");
    fs::write(&input, "<p>Nothing to see here.</p>").unwrap();

    let output = snipzip(&["extract", &input.display().to_string()], dir.path());
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No code snippets found"));
    assert!(stderr.contains("Nothing to see here."));
}

#[test]
fn scan_emits_json_blocks() {
    let dir = TempDir::new().unwrap();
    let output = snipzip(&["scan", "--json", &fixture("html_turn.html")], dir.path());
    assert!(output.status.success());

    let blocks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let blocks = blocks.as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["language"], "java");
    assert_eq!(blocks[1]["dialect"], "html_language");
}

#[test]
fn manifest_prints_tree() {
    let dir = TempDir::new().unwrap();
    let output = snipzip(&["manifest", &fixture("ascii_tree.md")], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("my-app"));
    assert!(stdout.contains("utils.js"));
}
