use crate::contexts::error::ExtractError;
use crate::data::ResolvedFile;
use log::{debug, warn};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Turns a resolved path into a safe relative archive path. Returns `None`
/// when nothing is left.
pub fn normalize_path(raw: &str) -> Option<String> {
    let unified = raw.trim().replace('\\', "/");
    let bytes = unified.as_bytes();
    let without_drive = if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        &unified[2..]
    } else {
        unified.as_str()
    };

    let segments: Vec<&str> = without_drive
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Collects resolved files and writes them as a deterministic ZIP.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<ResolvedFile>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file. A later file with the same normalized path replaces the
    /// earlier one's content but keeps its position.
    pub fn add(&mut self, mut file: ResolvedFile) {
        let Some(path) = normalize_path(&file.path) else {
            warn!("Skipping block {}: path '{}' is empty after normalization", file.block_index + 1, file.path);
            return;
        };
        file.path = path;

        match self.entries.iter_mut().find(|entry| entry.path == file.path) {
            Some(existing) => {
                debug!(
                    "Block {} replaces block {} at {}",
                    file.block_index + 1,
                    existing.block_index + 1,
                    file.path
                );
                *existing = file;
            }
            None => self.entries.push(file),
        }
    }

    pub fn entries(&self) -> &[ResolvedFile] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ResolvedFile> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the collected entries. `None` when there is nothing to write.
    pub fn write(&self) -> Result<Option<Vec<u8>>, ExtractError> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            writer.start_file(entry.path.as_str(), options)?;
            writer
                .write_all(entry.content.as_bytes())
                .map_err(|source| ExtractError::Entry {
                    path: entry.path.clone(),
                    source,
                })?;
        }
        let bytes = writer.finish()?.into_inner();
        debug!("Wrote {} entries, {} bytes", self.entries.len(), bytes.len());
        Ok(Some(bytes))
    }
}

/// Normalizes, deduplicates and writes `files`.
pub fn build(files: impl IntoIterator<Item = ResolvedFile>) -> Result<Option<Vec<u8>>, ExtractError> {
    let mut builder = ArchiveBuilder::new();
    for file in files {
        builder.add(file);
    }
    builder.write()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PathOrigin;
    use std::io::Read;
    use zip::ZipArchive;

    fn file(path: &str, content: &str, block_index: usize) -> ResolvedFile {
        ResolvedFile {
            path: path.to_string(),
            content: content.to_string(),
            origin: PathOrigin::Fallback,
            block_index,
        }
    }

    fn read_entries(bytes: Vec<u8>) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut content = String::new();
                entry.read_to_string(&mut content).unwrap();
                (entry.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("C:\\proj\\src\\App.java").as_deref(), Some("proj/src/App.java"));
        assert_eq!(normalize_path("/abs/./x/../y.txt").as_deref(), Some("abs/x/y.txt"));
        assert_eq!(normalize_path("a//b.txt").as_deref(), Some("a/b.txt"));
        assert_eq!(normalize_path("../.."), None);
        assert_eq!(normalize_path(""), None);
    }

    #[test]
    fn empty_input_writes_nothing() {
        assert!(build(Vec::new()).unwrap().is_none());
        assert!(build(vec![file("..", "x", 0)]).unwrap().is_none());
    }

    #[test]
    fn later_file_wins_and_keeps_first_slot() {
        let bytes = build(vec![
            file("a.txt", "first", 0),
            file("b.txt", "b", 1),
            file("./a.txt", "second", 2),
        ])
        .unwrap()
        .unwrap();
        assert_eq!(
            read_entries(bytes),
            vec![
                ("a.txt".to_string(), "second".to_string()),
                ("b.txt".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn output_is_byte_identical_across_runs() {
        let files = || vec![file("src/x.rs", "fn x() {}", 0), file("y.md", "# y", 1)];
        assert_eq!(build(files()).unwrap(), build(files()).unwrap());
    }

    #[test]
    fn entries_are_deflated_with_fixed_metadata() {
        let bytes = build(vec![file("x.txt", &"abc".repeat(100), 0)]).unwrap().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o644));
        let modified = entry.last_modified().unwrap();
        assert_eq!((modified.year(), modified.month(), modified.day()), (1980, 1, 1));
    }
}
