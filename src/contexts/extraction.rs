use crate::contexts::archive_builder::ArchiveBuilder;
use crate::contexts::block_scanner::{self, DEFAULT_CONTEXT_WINDOW};
use crate::contexts::error::{ExtractError, RegistryError};
use crate::contexts::manifest_extractor::{self, Manifest};
use crate::contexts::path_resolver::PathResolver;
use crate::data::{CodeBlock, ExclusionReason, LanguageTable, PathTree, Resolution, ResolvedFile};
use log::info;
use serde::Serialize;

/// Per-call configuration. Built fresh for every extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub languages: LanguageTable,
    /// Consulted by name when the text carries no manifest of its own.
    pub default_tree: Option<PathTree>,
    pub context_window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            languages: LanguageTable::builtin(),
            default_tree: None,
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

/// Source of extraction configuration
pub trait ConventionRegistry {
    fn load_config(&self) -> Result<ExtractionConfig, RegistryError>;
}

/// A scanned block that did not become an archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedBlock {
    pub block_index: usize,
    pub reason: ExclusionReason,
}

/// The result of one extraction.
#[derive(Debug, Clone, Serialize)]
pub struct Archive {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Entries in archive order, paths normalized.
    pub files: Vec<ResolvedFile>,
    pub manifest: Option<Manifest>,
    pub blocks: Vec<CodeBlock>,
    pub excluded: Vec<ExcludedBlock>,
}

/// Extraction context: turns one chat turn into an archive.
pub struct Extraction<'c> {
    /// The chat turn (role player)
    text: &'c str,
    config: &'c ExtractionConfig,
}

impl<'c> Extraction<'c> {
    pub fn new(text: &'c str, config: &'c ExtractionConfig) -> Self {
        Self { text, config }
    }

    /// Role method: text.scan_blocks
    pub fn scan_blocks(&self) -> Vec<CodeBlock> {
        block_scanner::scan(self.text, self.config.context_window)
    }

    /// Role method: text.find_manifest
    pub fn find_manifest(&self) -> Option<Manifest> {
        manifest_extractor::extract_manifest(self.text)
    }

    /// Role method: resolver.resolve_files
    ///
    /// Resolves every block in scan order and feeds the builder.
    fn resolve_files(
        &self,
        blocks: &[CodeBlock],
        manifest: Option<&Manifest>,
    ) -> (ArchiveBuilder, Vec<ExcludedBlock>) {
        let mut resolver = PathResolver::new(
            manifest,
            self.config.default_tree.as_ref(),
            &self.config.languages,
        );
        let mut builder = ArchiveBuilder::new();
        let mut excluded = Vec::new();

        for (idx, block) in blocks.iter().enumerate() {
            match resolver.resolve(block, idx + 1) {
                Resolution::Resolved(file) => builder.add(file),
                Resolution::Excluded(reason) => excluded.push(ExcludedBlock {
                    block_index: idx,
                    reason,
                }),
            }
        }
        (builder, excluded)
    }

    /// Runs the whole pipeline. `Ok(None)` means no code was found.
    pub fn run(&self) -> Result<Option<Archive>, ExtractError> {
        let blocks = self.scan_blocks();
        if blocks.is_empty() {
            info!("No code blocks found");
            return Ok(None);
        }

        let manifest = self.find_manifest();
        let (builder, excluded) = self.resolve_files(&blocks, manifest.as_ref());

        let Some(bytes) = builder.write()? else {
            info!("All {} block(s) were excluded", blocks.len());
            return Ok(None);
        };

        let files = builder.into_entries();
        info!(
            "Archived {} file(s) from {} block(s), {} excluded",
            files.len(),
            blocks.len(),
            excluded.len()
        );
        Ok(Some(Archive {
            bytes,
            files,
            manifest,
            blocks,
            excluded,
        }))
    }
}

/// Builds an archive from `text` with the built-in conventions.
pub fn create_archive(text: &str) -> Result<Option<Vec<u8>>, ExtractError> {
    let config = ExtractionConfig::default();
    Ok(Extraction::new(text, &config).run()?.map(|archive| archive.bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_prose_only_input_produce_nothing() {
        assert!(create_archive("").unwrap().is_none());
        assert!(create_archive("Sorry, I cannot help with that.").unwrap().is_none());
    }

    #[test]
    fn only_empty_blocks_produce_nothing() {
        assert!(create_archive("```java\n```\n").unwrap().is_none());
    }

    #[test]
    fn archive_reports_entries_and_exclusions() {
        let text = "```json\n{\"p\": {\"main.py\": null}}\n```\n\n```python\nif __name__ == \"__main__\":\n    print(1)\n```\n\n```python\nx = 2\n```\n";
        let config = ExtractionConfig::default();
        let archive = Extraction::new(text, &config).run().unwrap().unwrap();

        assert_eq!(archive.blocks.len(), 3);
        assert_eq!(archive.files.len(), 1);
        assert_eq!(archive.files[0].path, "p/main.py");
        assert_eq!(
            archive.excluded,
            vec![
                ExcludedBlock { block_index: 0, reason: ExclusionReason::ManifestBlock },
                ExcludedBlock { block_index: 2, reason: ExclusionReason::NotInManifest },
            ]
        );
        assert!(archive.manifest.is_some());
    }

    #[test]
    fn default_tree_places_files_when_text_has_no_manifest() {
        let tree = manifest_extractor::parse_tolerant("{\"svc\": {\"cmd\": {\"main.go\": null}}}")
            .unwrap()
            .tree;
        let config = ExtractionConfig {
            default_tree: Some(tree),
            ..ExtractionConfig::default()
        };
        let archive = Extraction::new("```go\npackage main\n\nfunc main() {}\n```\n", &config)
            .run()
            .unwrap()
            .unwrap();
        assert_eq!(archive.files[0].path, "svc/cmd/main.go");
    }
}
