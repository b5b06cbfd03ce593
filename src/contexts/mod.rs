mod archive_builder;
mod block_scanner;
mod error;
mod extraction;
mod manifest_extractor;
mod path_hints;
mod path_resolver;

pub use archive_builder::{ArchiveBuilder, build, normalize_path};
pub use block_scanner::{DEFAULT_CONTEXT_WINDOW, scan};
pub use error::{ExtractError, RegistryError};
pub use extraction::{
    Archive, ConventionRegistry, ExcludedBlock, Extraction, ExtractionConfig, create_archive,
};
pub use manifest_extractor::{
    Manifest, ParsedManifest, extract_manifest, looks_like_file_name, parse_ascii_tree,
    parse_tolerant,
};
pub use path_hints::{PathHint, find_hint};
pub use path_resolver::PathResolver;
