//! Pulls code snippets out of LLM chat text and packs them into a ZIP archive
//! laid out the way the conversation described the project.

pub mod contexts;
pub mod data;
pub mod registries;

pub use contexts::{Archive, ExtractError, Extraction, ExtractionConfig, create_archive};
