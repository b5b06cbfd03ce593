use crate::contexts::{
    ConventionRegistry, DEFAULT_CONTEXT_WINDOW, ExtractionConfig, RegistryError, parse_ascii_tree,
    parse_tolerant,
};
use crate::data::{LanguageConvention, LanguageTable};
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONVENTIONS_FILE: &str = "snipzip.yml";

/// On-disk shape of the conventions file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConventionsFile {
    context_window: Option<usize>,
    languages: Vec<LanguageConvention>,
    /// JSON-like object or ASCII tree, same syntax as a manifest.
    default_tree: Option<String>,
}

/// File-based implementation of ConventionRegistry
/// A missing file means the built-in conventions.
#[derive(Clone, Debug)]
pub struct FileConventionRegistry {
    conventions_path: PathBuf,
}

impl FileConventionRegistry {
    /// Creates a new FileConventionRegistry
    ///
    /// # Arguments
    /// * `conventions_path` - Optional path to the YAML file (defaults to "snipzip.yml")
    pub fn new(conventions_path: Option<PathBuf>) -> Self {
        Self {
            conventions_path: conventions_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONVENTIONS_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.conventions_path
    }
}

impl ConventionRegistry for FileConventionRegistry {
    fn load_config(&self) -> Result<ExtractionConfig, RegistryError> {
        if !self.conventions_path.exists() {
            debug!(
                "No conventions file at {}, using built-in conventions",
                self.conventions_path.display()
            );
            return Ok(ExtractionConfig::default());
        }

        let content = fs::read_to_string(&self.conventions_path).map_err(|source| RegistryError::Read {
            path: self.conventions_path.clone(),
            source,
        })?;

        let config = parse_conventions(&content, &self.conventions_path)?;
        info!(
            "Loaded conventions from {} ({} language(s))",
            self.conventions_path.display(),
            config.languages.conventions().len()
        );
        Ok(config)
    }
}

/// Parses the YAML conventions file into an ExtractionConfig
fn parse_conventions(yaml_content: &str, path: &Path) -> Result<ExtractionConfig, RegistryError> {
    if yaml_content.trim().is_empty() {
        return Ok(ExtractionConfig::default());
    }

    let file: ConventionsFile =
        serde_yaml::from_str(yaml_content).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let default_tree = match file.default_tree.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => {
            let tree = parse_tolerant(text)
                .map(|parsed| parsed.tree)
                .or_else(|| parse_ascii_tree(text).map(|(tree, _)| tree))
                .ok_or_else(|| RegistryError::EmptyDefaultTree {
                    path: path.to_path_buf(),
                })?;
            Some(tree)
        }
    };

    Ok(ExtractionConfig {
        languages: LanguageTable::builtin().with_overrides(file.languages),
        default_tree,
        context_window: file.context_window.unwrap_or(DEFAULT_CONTEXT_WINDOW),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NamingRule;
    use std::io::Write;

    #[test]
    fn test_parse_full_conventions() {
        let yaml = r#"
context_window: 400
languages:
  - name: groovy
    aliases: [gradle]
    extensions: [groovy, gradle]
    directory: src/main/groovy
    naming: jvm_declaration
    markers: ["apply plugin:"]
  - name: java
    extensions: [java]
    directory: java-src
    naming: jvm_declaration
default_tree: |
  { "my-plugin": { "pom.xml": null } }
"#;

        let config = parse_conventions(yaml, Path::new("snipzip.yml")).unwrap();
        assert_eq!(config.context_window, 400);

        let groovy = config.languages.lookup("gradle").unwrap();
        assert_eq!(groovy.naming, NamingRule::JvmDeclaration);
        assert_eq!(config.languages.conventions()[0].name, "groovy");
        assert_eq!(config.languages.lookup("java").unwrap().directory, "java-src");

        let tree = config.default_tree.unwrap();
        assert_eq!(tree.leaf_paths(), vec!["my-plugin/pom.xml"]);
    }

    #[test]
    fn test_language_fields_default() {
        let yaml = "languages:\n  - name: zig\n";
        let config = parse_conventions(yaml, Path::new("snipzip.yml")).unwrap();
        let zig = config.languages.lookup("zig").unwrap();
        assert_eq!(zig.naming, NamingRule::Counter);
        assert!(zig.extensions.is_empty());
        assert_eq!(zig.primary_extension(), "zig");
    }

    #[test]
    fn test_parse_empty_conventions() {
        let config = parse_conventions("", Path::new("snipzip.yml")).unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }

    #[test]
    fn test_ascii_default_tree() {
        let yaml = "default_tree: |\n  app/\n  ├── main.py\n  └── util.py\n";
        let config = parse_conventions(yaml, Path::new("snipzip.yml")).unwrap();
        assert_eq!(
            config.default_tree.unwrap().leaf_paths(),
            vec!["app/main.py", "app/util.py"]
        );
    }

    #[test]
    fn test_default_tree_without_files_is_rejected() {
        let yaml = "default_tree: '{\"a\": {}}'\n";
        let err = parse_conventions(yaml, Path::new("snipzip.yml")).unwrap_err();
        assert!(matches!(err, RegistryError::EmptyDefaultTree { .. }));
    }

    #[test]
    fn test_invalid_yaml_is_a_parse_error() {
        let err = parse_conventions("languages: [: nope", Path::new("x.yml")).unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
        let unknown = parse_conventions("colour: blue\n", Path::new("x.yml")).unwrap_err();
        assert!(matches!(unknown, RegistryError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileConventionRegistry::new(Some(dir.path().join("absent.yml")));
        assert_eq!(registry.load_config().unwrap(), ExtractionConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "context_window: 64").unwrap();
        let registry = FileConventionRegistry::new(Some(file.path().to_path_buf()));
        assert_eq!(registry.load_config().unwrap().context_window, 64);
    }
}
