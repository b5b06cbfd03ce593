use crate::data::patterns::Dialect;
use serde::Serialize;

/// One code span detected in a chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    /// Language tag attached to the span, as written (`java`, `language-xml` → `xml`).
    pub language: Option<String>,
    /// Decoded content: highlighter markup stripped, entities resolved.
    pub content: String,
    /// Text immediately before the content, bounded by the context window and
    /// by the end of the previous block. Includes the opening delimiter.
    pub context_before: String,
    /// Byte offset of the whole span in the input.
    pub source_offset: usize,
    /// Byte offset one past the end of the span.
    pub source_end: usize,
    pub dialect: Dialect,
}

impl CodeBlock {
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Lowercased language tag, if any.
    pub fn language_key(&self) -> Option<String> {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_ascii_lowercase)
    }
}
