mod file_convention_registry;

pub use file_convention_registry::{DEFAULT_CONVENTIONS_FILE, FileConventionRegistry};
