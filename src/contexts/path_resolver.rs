use crate::contexts::manifest_extractor::Manifest;
use crate::contexts::path_hints::{self, PathHint};
use crate::data::patterns::ManifestKind;
use crate::data::{
    CodeBlock, ExclusionReason, HintKind, LanguageConvention, LanguageTable, Location, PathOrigin,
    PathTree, Resolution, ResolvedFile,
};
use log::debug;
use std::collections::HashSet;

/// How the language of a block was determined.
enum BlockLanguage<'a> {
    Known(&'a LanguageConvention),
    /// Tagged with a language the table does not know.
    Unknown(String),
    /// Untagged and not recognizable from content.
    PlainText(&'a LanguageConvention),
}

impl<'a> BlockLanguage<'a> {
    fn convention(&self) -> Option<&'a LanguageConvention> {
        match self {
            BlockLanguage::Known(convention) => Some(*convention),
            _ => None,
        }
    }
}

/// Joins manifest, optional default tree and language table into file paths.
///
/// One resolver serves one chat turn: it remembers which manifest leaves
/// earlier blocks claimed.
pub struct PathResolver<'a> {
    manifest: Option<&'a Manifest>,
    default_tree: Option<&'a PathTree>,
    languages: &'a LanguageTable,
    manifest_leaves: Vec<String>,
    default_leaves: Vec<String>,
    claimed: HashSet<String>,
}

impl<'a> PathResolver<'a> {
    pub fn new(
        manifest: Option<&'a Manifest>,
        default_tree: Option<&'a PathTree>,
        languages: &'a LanguageTable,
    ) -> Self {
        Self {
            manifest,
            default_tree,
            languages,
            manifest_leaves: manifest.map(|m| m.tree.leaf_paths()).unwrap_or_default(),
            default_leaves: default_tree.map(PathTree::leaf_paths).unwrap_or_default(),
            claimed: HashSet::new(),
        }
    }

    /// Resolves the `n`-th block (1-based, scan order).
    pub fn resolve(&mut self, block: &CodeBlock, n: usize) -> Resolution {
        let language = self.block_language(block);
        let hint = path_hints::find_hint(block, language.convention(), self.languages);

        if self.is_manifest_block(block, hint.as_ref()) {
            debug!("Block {} is the manifest", n);
            return Resolution::Excluded(ExclusionReason::ManifestBlock);
        }
        if block.is_blank() {
            debug!("Block {} is empty", n);
            return Resolution::Excluded(ExclusionReason::EmptyContent);
        }

        let resolved = match self.resolve_path(block, n, &language, hint.as_ref()) {
            Some(resolved) => resolved,
            None => {
                debug!("Block {} matches nothing in the manifest", n);
                return Resolution::Excluded(ExclusionReason::NotInManifest);
            }
        };

        let (path, origin) = resolved;
        debug!("Block {} -> {} ({})", n, path, origin);
        Resolution::Resolved(ResolvedFile {
            path,
            content: block.content.clone(),
            origin,
            block_index: n - 1,
        })
    }

    fn resolve_path(
        &mut self,
        block: &CodeBlock,
        n: usize,
        language: &BlockLanguage<'_>,
        hint: Option<&PathHint>,
    ) -> Option<(String, PathOrigin)> {
        // Explicit paths.
        if let Some(hint) = hint.filter(|h| h.is_qualified()) {
            if let Some(leaf) = self.manifest_leaf_ending_with(&hint.path) {
                return Some((leaf, PathOrigin::Manifest));
            }
            return Some((hint.path.clone(), PathOrigin::ContextHint(hint.kind)));
        }

        // Tree lookup by simple name.
        let inferred = language.convention().and_then(|c| c.infer_name(&block.content));
        let candidate = hint
            .map(|h| h.file_name().to_string())
            .or_else(|| inferred.as_ref().map(|i| i.file_name.clone()));
        if let Some(name) = &candidate {
            if let Some(found) = self.claim_by_name(name) {
                return Some(found);
            }
        }

        // A manifest in the text makes unrelated snippets drop out.
        let strict_root = match self.manifest {
            Some(manifest) => {
                if hint.is_none() {
                    return None;
                }
                manifest.tree.root.clone()
            }
            None => None,
        };

        let (directory, file_name, origin) = match language {
            BlockLanguage::Known(convention) => {
                let directory = match inferred.as_ref().map(|i| &i.location) {
                    Some(Location::Nested(sub)) => join(&[convention.directory.as_str(), sub.as_str()]),
                    Some(Location::ProjectRoot(dir)) => dir.clone(),
                    Some(Location::Default) | None => convention.directory.clone(),
                };
                match (hint, inferred) {
                    (Some(hint), _) => (directory, hint.path.clone(), PathOrigin::ContextHint(hint.kind)),
                    (None, Some(inferred)) => (directory, inferred.file_name, PathOrigin::Inferred),
                    (None, None) => (
                        directory,
                        format!("snippet_{}.{}", n, convention.primary_extension()),
                        PathOrigin::Fallback,
                    ),
                }
            }
            BlockLanguage::Unknown(tag) => {
                let directory = format!("other/{}", tag);
                match hint {
                    Some(hint) => (directory, hint.path.clone(), PathOrigin::ContextHint(hint.kind)),
                    None => (directory, format!("snippet_{}.{}", n, tag), PathOrigin::Fallback),
                }
            }
            BlockLanguage::PlainText(convention) => match hint {
                Some(hint) => (
                    convention.directory.clone(),
                    hint.path.clone(),
                    PathOrigin::ContextHint(hint.kind),
                ),
                None => (
                    convention.directory.clone(),
                    format!("snippet_{}.{}", n, convention.primary_extension()),
                    PathOrigin::Fallback,
                ),
            },
        };

        let path = join(&[strict_root.as_deref().unwrap_or(""), directory.as_str(), file_name.as_str()]);
        Some((path, origin))
    }

    fn block_language(&self, block: &CodeBlock) -> BlockLanguage<'a> {
        let languages: &'a LanguageTable = self.languages;
        match block.language_key() {
            Some(key) => match languages.lookup(&key) {
                Some(convention) => BlockLanguage::Known(convention),
                None => BlockLanguage::Unknown(sanitize_tag(&key)),
            },
            None => match languages.detect(&block.content) {
                Some(convention) => {
                    debug!("Detected {} from content", convention.name);
                    BlockLanguage::Known(convention)
                }
                None => BlockLanguage::PlainText(languages.plain_text()),
            },
        }
    }

    /// A block that names its own file is kept even when its text matches the
    /// manifest, unless the manifest was explicitly marked as the layout.
    fn is_manifest_block(&self, block: &CodeBlock, hint: Option<&PathHint>) -> bool {
        let Some(manifest) = self.manifest else {
            return false;
        };
        if manifest.kind != ManifestKind::ProjectLayout {
            if let Some(hint) = hint.filter(|h| h.kind != HintKind::BareName) {
                debug!("Block names its own file '{}', not treating it as the manifest", hint.path);
                return false;
            }
        }
        if manifest
            .span
            .as_ref()
            .is_some_and(|span| span.contains(&block.source_offset))
        {
            return true;
        }
        let source = manifest.source.trim();
        let content = block.content.trim();
        !source.is_empty() && content.contains(source) && source.len() * 2 >= content.len()
    }

    fn manifest_leaf_ending_with(&mut self, hint_path: &str) -> Option<String> {
        let suffix = format!("/{}", hint_path);
        let leaf = self
            .manifest_leaves
            .iter()
            .find(|leaf| leaf.as_str() == hint_path || leaf.ends_with(&suffix))?
            .clone();
        self.claimed.insert(leaf.clone());
        Some(leaf)
    }

    /// First unclaimed leaf called `name`; a fully claimed name resolves to
    /// its first leaf again so a repeated file replaces the earlier one.
    fn claim_by_name(&mut self, name: &str) -> Option<(String, PathOrigin)> {
        let (leaves, origin) = if self.manifest.is_some() {
            (&self.manifest_leaves, PathOrigin::Manifest)
        } else if self.default_tree.is_some() {
            (&self.default_leaves, PathOrigin::DefaultTree)
        } else {
            return None;
        };

        let mut matching = leaves.iter().filter(|leaf| leaf_name(leaf) == name);
        let first = matching.clone().next()?.clone();
        let leaf = matching
            .find(|leaf| !self.claimed.contains(leaf.as_str()))
            .cloned()
            .unwrap_or(first);
        self.claimed.insert(leaf.clone());
        Some((leaf, origin))
    }
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn sanitize_tag(tag: &str) -> String {
    tag.chars()
        .map(|c| if c.is_alphanumeric() || "+#-_".contains(c) { c } else { '_' })
        .collect()
}
