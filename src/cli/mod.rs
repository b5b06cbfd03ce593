use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

pub mod logger;
mod progress;

use progress::ProgressIndicator;
use snipzip::contexts::{Archive, ConventionRegistry, Extraction, ExtractionConfig};
use snipzip::data::patterns::Dialect;
use snipzip::registries::FileConventionRegistry;

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub verbose: bool,
    pub dry_run: bool,
    pub conventions: Option<PathBuf>,
}

const DEFAULT_ARCHIVE: &str = "code_snippets.zip";
const STDIN_INPUT: &str = "-";
const SAMPLE_CHARS: usize = 1000;
const SAMPLE_WIDTH: usize = 100;

pub fn extract(inputs: Vec<String>, output: Option<PathBuf>, config: &Config) -> Result<()> {
    let extraction_config = load_conventions(config)?;
    let plan = plan_outputs(&inputs, output.as_deref());

    let mut progress = ProgressIndicator::new(plan.len());
    for (input, target) in &plan {
        progress.start_item(input);
        let text = read_input(input)?;

        let archive = Extraction::new(&text, &extraction_config)
            .run()
            .with_context(|| format!("Failed to build archive for {}", input))?;

        let Some(archive) = archive else {
            eprintln!("{}", no_code_report(input, &text));
            progress.complete_item(0);
            continue;
        };

        report_entries(&archive, config);
        write_archive(&archive, target, config)?;
        progress.complete_item(archive.files.len());
    }

    if plan.len() > 1 {
        progress.finish();
    }

    if progress.failed() > 0 {
        bail!("No code snippets found in {} input(s)", progress.failed());
    }
    Ok(())
}

pub fn scan(input: &str, json: bool, config: &Config) -> Result<()> {
    let extraction_config = load_conventions(config)?;
    let text = read_input(input)?;
    let blocks = Extraction::new(&text, &extraction_config).scan_blocks();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&blocks).context("Failed to serialize code blocks")?
        );
        return Ok(());
    }

    if blocks.is_empty() {
        println!("No code blocks found in {}", input);
        return Ok(());
    }

    println!("Found {} code block(s) in {}", blocks.len(), input);
    for (idx, block) in blocks.iter().enumerate() {
        println!(
            "  [{}] {} {} @{} ({} bytes)",
            idx + 1,
            block.dialect.description(),
            block.language.as_deref().unwrap_or("-"),
            block.source_offset,
            block.content.len()
        );
        if config.verbose {
            println!("      context: {}", context_tail(&block.context_before, 80));
        }
    }
    Ok(())
}

pub fn manifest(input: &str, json: bool, config: &Config) -> Result<()> {
    let extraction_config = load_conventions(config)?;
    let text = read_input(input)?;
    let manifest = Extraction::new(&text, &extraction_config).find_manifest();

    let Some(manifest) = manifest else {
        println!("No project layout found in {}", input);
        return Ok(());
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?
        );
    } else {
        if config.verbose {
            println!("Manifest kind: {:?}, {} file(s)", manifest.kind, manifest.tree.leaf_count());
        }
        println!("{}", manifest.tree.render());
    }
    Ok(())
}

fn load_conventions(config: &Config) -> Result<ExtractionConfig> {
    let registry = FileConventionRegistry::new(config.conventions.clone());
    let loaded = registry
        .load_config()
        .with_context(|| format!("Failed to load conventions from {}", registry.path().display()))?;
    if config.verbose {
        println!(
            "Using conventions from {} ({} language(s))",
            registry.path().display(),
            loaded.languages.conventions().len()
        );
    }
    Ok(loaded)
}

fn read_input(input: &str) -> Result<String> {
    if input == STDIN_INPUT {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read chat text from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read input file: {}", input))
}

/// Pairs every input with the archive it produces.
fn plan_outputs(inputs: &[String], output: Option<&Path>) -> Vec<(String, PathBuf)> {
    if let [single] = inputs {
        let target = match output {
            Some(path) if path.is_dir() => path.join(DEFAULT_ARCHIVE),
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_ARCHIVE),
        };
        return vec![(single.clone(), target)];
    }

    let dir = output.unwrap_or_else(|| Path::new("."));
    inputs
        .iter()
        .map(|input| {
            let stem = if input == STDIN_INPUT {
                "stdin".to_string()
            } else {
                Path::new(input)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "snippets".to_string())
            };
            (input.clone(), dir.join(format!("{}.zip", stem)))
        })
        .collect()
}

fn report_entries(archive: &Archive, config: &Config) {
    for file in &archive.files {
        let digest = hex::encode(Sha256::digest(file.content.as_bytes()));
        println!("  {} ({}) sha256:{}", file.path, file.origin, &digest[..16]);
    }
    if config.verbose {
        for excluded in &archive.excluded {
            println!("  - block {} skipped: {}", excluded.block_index + 1, excluded.reason);
        }
    }
}

fn write_archive(archive: &Archive, target: &Path, config: &Config) -> Result<()> {
    if config.dry_run {
        println!(
            "[DRY RUN] Would write {} ({} file(s), {} bytes)",
            target.display(),
            archive.files.len(),
            archive.bytes.len()
        );
        return Ok(());
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(target, &archive.bytes)
        .with_context(|| format!("Failed to write archive: {}", target.display()))?;
    println!("✓ Wrote {} ({} file(s))", target.display(), archive.files.len());
    Ok(())
}

/// Diagnostic printed when an input yields no archive.
fn no_code_report(input: &str, text: &str) -> String {
    let mut report = format!("No code snippets found in {}\n", input);
    report.push_str("Formats tried:\n");
    for dialect in Dialect::PRIORITY {
        report.push_str(&format!("  - {}\n", dialect.description()));
    }

    let sample: String = text.chars().take(SAMPLE_CHARS).collect();
    let rendered = html2text::from_read(sample.as_bytes(), SAMPLE_WIDTH).unwrap_or_else(|_| sample.clone());
    report.push_str("Content sample:\n");
    if rendered.trim().is_empty() {
        report.push_str("  (empty)\n");
    } else {
        for line in rendered.lines() {
            report.push_str("  ");
            report.push_str(line);
            report.push('\n');
        }
    }
    report
}

/// Last `max` characters of `context`, on one line.
fn context_tail(context: &str, max: usize) -> String {
    let flat: String = context.split_whitespace().collect::<Vec<_>>().join(" ");
    let count = flat.chars().count();
    if count <= max {
        flat
    } else {
        let tail: String = flat.chars().skip(count - max).collect();
        format!("…{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;
    use zip::ZipArchive;

    const CHAT: &str = "Here it is:\n\n```python\ndef greet():\n    print('hi')\n```\n";

    #[test]
    fn single_input_defaults_to_code_snippets_zip() {
        let plan = plan_outputs(&["chat.md".to_string()], None);
        assert_eq!(plan, vec![("chat.md".to_string(), PathBuf::from(DEFAULT_ARCHIVE))]);
    }

    #[test]
    fn single_input_into_existing_directory() {
        let dir = TempDir::new().unwrap();
        let plan = plan_outputs(&["chat.md".to_string()], Some(dir.path()));
        assert_eq!(plan[0].1, dir.path().join(DEFAULT_ARCHIVE));

        let file = dir.path().join("out.zip");
        let plan = plan_outputs(&["chat.md".to_string()], Some(file.as_path()));
        assert_eq!(plan[0].1, file);
    }

    #[test]
    fn several_inputs_get_one_archive_each() {
        let inputs = vec!["a/turn1.md".to_string(), "turn2.html".to_string(), "-".to_string()];
        let plan = plan_outputs(&inputs, Some(Path::new("out")));
        let targets: Vec<PathBuf> = plan.into_iter().map(|(_, target)| target).collect();
        assert_eq!(
            targets,
            vec![
                PathBuf::from("out/turn1.zip"),
                PathBuf::from("out/turn2.zip"),
                PathBuf::from("out/stdin.zip"),
            ]
        );
    }

    #[test]
    fn extract_writes_archive_to_disk() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("chat.md");
        fs::write(&input, CHAT).unwrap();
        let output = dir.path().join("nested").join("snippets.zip");

        let config = Config {
            conventions: Some(dir.path().join("absent.yml")),
            ..Config::default()
        };
        extract(vec![input.display().to_string()], Some(output.clone()), &config).unwrap();

        let bytes = fs::read(&output).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.by_index(0).unwrap().name(), "greet.py");
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("chat.md");
        fs::write(&input, CHAT).unwrap();
        let output = dir.path().join("snippets.zip");

        let config = Config {
            dry_run: true,
            conventions: Some(dir.path().join("absent.yml")),
            ..Config::default()
        };
        extract(vec![input.display().to_string()], Some(output.clone()), &config).unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn extract_fails_when_no_code_found() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("chat.md");
        fs::write(&input, "Just prose, no code.").unwrap();
        let output = dir.path().join("snippets.zip");

        let config = Config {
            conventions: Some(dir.path().join("absent.yml")),
            ..Config::default()
        };
        let err = extract(vec![input.display().to_string()], Some(output.clone()), &config).unwrap_err();
        assert!(err.to_string().contains("No code snippets found"));
        assert!(!output.exists());
    }

    #[test]
    fn missing_input_reports_path() {
        let err = read_input("/definitely/not/here.md").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.md"));
    }

    #[test]
    fn no_code_report_lists_formats_and_plain_sample() {
        let report = no_code_report("turn.html", "<p>Nothing <b>here</b></p>");
        for dialect in Dialect::PRIORITY {
            assert!(report.contains(dialect.description()));
        }
        assert!(report.contains("Nothing"));
        assert!(!report.contains("<b>"));
    }

    #[test]
    fn context_tail_keeps_the_end() {
        assert_eq!(context_tail("short\ntext", 80), "short text");
        assert_eq!(context_tail("abcdefghij", 4), "…ghij");
    }
}
