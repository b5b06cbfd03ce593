use crate::data::patterns::{self, CodeSpan, Dialect};
use crate::data::CodeBlock;
use log::debug;

/// Bytes of preceding text kept with each block.
pub const DEFAULT_CONTEXT_WINDOW: usize = 500;

/// Finds every code block in `text`.
///
/// Dialects are tried from most to least specific; the first dialect with at
/// least one match is used for the whole text and the rest are ignored.
pub fn scan(text: &str, context_window: usize) -> Vec<CodeBlock> {
    for dialect in Dialect::PRIORITY {
        let spans = dialect.find_spans(text);
        if spans.is_empty() {
            debug!("No {:?} blocks, falling through", dialect);
            continue;
        }

        debug!("Found {} {:?} block(s)", spans.len(), dialect);
        let mut blocks = Vec::with_capacity(spans.len());
        let mut previous_end = 0;
        for span in &spans {
            blocks.push(to_block(text, span, previous_end, context_window));
            previous_end = span.end;
        }
        return blocks;
    }

    debug!("No recognizer matched ({} bytes of input)", text.len());
    Vec::new()
}

fn to_block(text: &str, span: &CodeSpan<'_>, previous_end: usize, window: usize) -> CodeBlock {
    CodeBlock {
        language: span.language.map(str::to_string),
        content: decode_content(span),
        context_before: context_before(text, span.content_start, previous_end, window),
        source_offset: span.start,
        source_end: span.end,
        dialect: span.dialect,
    }
}

fn decode_content(span: &CodeSpan<'_>) -> String {
    if span.dialect.is_html() {
        patterns::decode_entities(&patterns::strip_highlight_markup(span.raw_content))
    } else {
        // The closing fence owns the final line break.
        let raw = span.raw_content;
        let raw = raw
            .strip_suffix("\r\n")
            .or_else(|| raw.strip_suffix('\n'))
            .unwrap_or(raw);
        patterns::decode_entities(raw)
    }
}

fn context_before(text: &str, content_start: usize, previous_end: usize, window: usize) -> String {
    let mut start = content_start.saturating_sub(window).max(previous_end);
    while start < content_start && !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..content_start].to_string()
}
