use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures while producing an archive. Heuristics that do not fire
/// are never errors.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("archive I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip writer failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write archive entry '{path}': {source}")]
    Entry {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while loading a conventions file.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read conventions file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid conventions file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("default_tree in {path} has no file entries")]
    EmptyDefaultTree { path: PathBuf },
}
