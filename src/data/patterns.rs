//! Canonical catalog of recognizers for code spans and manifest spans.
//!
//! Every recognizer lives here exactly once. Compiled regexes are immutable
//! statics; nothing in this module keeps state between calls.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Bumped whenever a recognizer is added, removed or reordered.
pub const PATTERN_LIBRARY_VERSION: u32 = 1;

/// Markup dialect that produced a code span, in descending specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `<pre><code class="language-x">…</code></pre>`
    HtmlLanguage,
    /// `<pre><code>…</code></pre>`
    HtmlPlain,
    /// `<div class="code-block-container"><pre>…</pre></div>`
    Container,
    /// `<pre>…</pre>`
    BarePre,
    /// ```` ```lang ```` fences
    FencedLanguage,
    /// ```` ``` ```` fences
    FencedPlain,
}

impl Dialect {
    /// Scan order used by the block scanner.
    pub const PRIORITY: [Dialect; 6] = [
        Dialect::HtmlLanguage,
        Dialect::HtmlPlain,
        Dialect::Container,
        Dialect::BarePre,
        Dialect::FencedLanguage,
        Dialect::FencedPlain,
    ];

    /// Human readable shape of the recognizer, used in diagnostics.
    pub fn description(&self) -> &'static str {
        match self {
            Dialect::HtmlLanguage => r#"<pre><code class="language-xxx">...</code></pre>"#,
            Dialect::HtmlPlain => "<pre><code [any attributes]>...</code></pre>",
            Dialect::Container => r#"<div class="code-block-container"><pre>...</pre></div>"#,
            Dialect::BarePre => "<pre>...</pre>",
            Dialect::FencedLanguage => "```language\\ncode\\n```",
            Dialect::FencedPlain => "```\\ncode\\n```",
        }
    }

    pub fn is_html(&self) -> bool {
        !matches!(self, Dialect::FencedLanguage | Dialect::FencedPlain)
    }

    fn regex(&self) -> &'static Regex {
        match self {
            Dialect::HtmlLanguage => &HTML_LANGUAGE,
            Dialect::HtmlPlain => &HTML_PLAIN,
            Dialect::Container => &CONTAINER,
            Dialect::BarePre => &BARE_PRE,
            Dialect::FencedLanguage => &FENCED_LANGUAGE,
            Dialect::FencedPlain => &FENCED_PLAIN,
        }
    }

    fn has_language_group(&self) -> bool {
        matches!(self, Dialect::HtmlLanguage | Dialect::FencedLanguage)
    }

    /// Finds every non-overlapping span of this dialect in `text`.
    pub fn find_spans<'t>(&self, text: &'t str) -> Vec<CodeSpan<'t>> {
        let content_group = if self.has_language_group() { 2 } else { 1 };

        self.regex()
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let content = caps.get(content_group)?;
                let language = if self.has_language_group() {
                    caps.get(1).map(|m| m.as_str())
                } else {
                    None
                };
                Some(CodeSpan {
                    dialect: *self,
                    language,
                    raw_content: content.as_str(),
                    start: whole.start(),
                    content_start: content.start(),
                    end: whole.end(),
                })
            })
            .collect()
    }
}

/// A raw recognizer hit, before decoding.
#[derive(Debug, Clone, Copy)]
pub struct CodeSpan<'t> {
    pub dialect: Dialect,
    pub language: Option<&'t str>,
    pub raw_content: &'t str,
    pub start: usize,
    pub content_start: usize,
    pub end: usize,
}

static HTML_LANGUAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<pre[^>]*>\s*<code\s+[^>]*?class\s*=\s*"[^"]*?\blanguage-([\w+#.-]+)[^"]*"[^>]*>(.*?)</code>\s*</pre>"#,
    )
    .expect("html language pattern")
});

static HTML_PLAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<pre[^>]*>\s*<code(?:\s[^>]*)?>(.*?)</code>\s*</pre>"#)
        .expect("html plain pattern")
});

static CONTAINER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div\s+class\s*=\s*"code-block-container"[^>]*>\s*<pre[^>]*>(.*?)</pre>"#)
        .expect("container pattern")
});

static BARE_PRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<pre(?:\s[^>]*)?>(.*?)</pre>"#).expect("bare pre pattern")
});

static FENCED_LANGUAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[ \t]*([\w+#.-]+)[^\n`]*\n(.*?)^[ \t]*```[ \t]*\r?$")
        .expect("fenced language pattern")
});

static FENCED_PLAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[ \t]*\r?\n(.*?)^[ \t]*```[ \t]*\r?$")
        .expect("fenced plain pattern")
});

/// Manifest recognizer families, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    /// A block explicitly marked as the project layout.
    ProjectLayout,
    /// Any code block tagged `json`.
    JsonBlock,
    /// An unfenced JSON-looking object.
    RawJson,
    /// ASCII directory-tree art.
    AsciiTree,
}

/// A candidate manifest text located in the input.
#[derive(Debug, Clone, Copy)]
pub struct ManifestSpan<'t> {
    pub body: &'t str,
    pub start: usize,
    pub end: usize,
}

static LAYOUT_HTML: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<(?:p|h[1-6]|strong|b)>\s*(?:<(?:strong|b)>)?\s*project\s+(?:layout|structure)\s*:?\s*(?:</(?:strong|b)>)?\s*</(?:p|h[1-6]|strong|b)>\s*(?:<p>\s*</p>\s*)?<pre[^>]*>\s*<code[^>]*>(.*?)</code>\s*</pre>"#,
    )
    .expect("layout html pattern")
});

static LAYOUT_MARKDOWN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ims)(?:\*\*|__|^#+[ \t]*)project[ \t]+(?:layout|structure)[ \t]*:?[ \t]*(?:\*\*|__)?[^\n]*\n\s*^[ \t]*```[^\n]*\n(.*?)^[ \t]*```",
    )
    .expect("layout markdown pattern")
});

static LAYOUT_FENCE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ims)^[ \t]*```[ \t]*(?:project-layout|layout)[ \t]*\r?\n(.*?)^[ \t]*```")
        .expect("layout fence tag pattern")
});

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ims)^[ \t]*```[ \t]*json[ \t]*\r?\n(.*?)^[ \t]*```").expect("json fence pattern")
});

static JSON_HTML: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<pre[^>]*>\s*<code\s+[^>]*?class\s*=\s*"[^"]*?\blanguage-json\b[^"]*"[^>]*>(.*?)</code>\s*</pre>"#)
        .expect("json html pattern")
});

static RAW_JSON_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\s*"[^"\n]{1,200}"\s*:"#).expect("raw json start pattern")
});

fn spans<'t>(re: &Regex, text: &'t str) -> Vec<ManifestSpan<'t>> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1)?;
            Some(ManifestSpan {
                body: body.as_str(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Project-layout candidates: marked HTML blocks, marked Markdown blocks,
/// then layout-tagged fences.
pub fn project_layout_spans(text: &str) -> Vec<ManifestSpan<'_>> {
    let mut found = spans(&LAYOUT_HTML, text);
    found.extend(spans(&LAYOUT_MARKDOWN, text));
    found.extend(spans(&LAYOUT_FENCE_TAG, text));
    found
}

/// Code blocks tagged `json`, fenced first.
pub fn json_block_spans(text: &str) -> Vec<ManifestSpan<'_>> {
    let mut found = spans(&JSON_FENCE, text);
    found.extend(spans(&JSON_HTML, text));
    found
}

/// Offsets where an unfenced object with a quoted first key starts.
pub fn raw_json_starts(text: &str) -> Vec<usize> {
    RAW_JSON_START.find_iter(text).map(|m| m.start()).collect()
}

/// Characters allowed in the prefix of an ASCII tree line.
pub const TREE_PREFIX_CHARS: &[char] = &[
    ' ', '\t', '\u{a0}', '│', '├', '└', '─', '┬', '┼', '┃', '┣', '┗', '━', '|', '+', '`', '\\', '-',
];

/// Branch markers that make a line part of an ASCII tree.
pub const TREE_BRANCH_MARKERS: &[&str] = &[
    "├──", "└──", "├─", "└─", "┣━", "┗━", "|--", "|__", "+--", "`--", "\\--",
];

static HIGHLIGHT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?span\b[^>]*>").expect("span pattern"));

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern"));

static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").expect("tag pattern"));

/// Removes syntax-highlighter markup that renderers wrap around tokens.
pub fn strip_highlight_markup(raw: &str) -> String {
    let without_breaks = LINE_BREAK.replace_all(raw, "\n");
    HIGHLIGHT_SPAN.replace_all(&without_breaks, "").into_owned()
}

/// Removes every HTML tag, keeping the text between them.
pub fn strip_tags(raw: &str) -> String {
    ANY_TAG.replace_all(raw, "").into_owned()
}

/// Decodes HTML character references in a single left-to-right pass, so
/// `&amp;lt;` becomes `&lt;` rather than `<`.
pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match decode_one(candidate) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
    ("&quot;", '"'),
    ("&#39;", '\''),
    ("&apos;", '\''),
    ("&nbsp;", ' '),
];

fn decode_one(candidate: &str) -> Option<(char, usize)> {
    for (name, ch) in NAMED_ENTITIES {
        if candidate.starts_with(name) {
            return Some((*ch, name.len()));
        }
    }

    let body = candidate.strip_prefix("&#")?;
    let end = body.find(';')?;
    if end == 0 || end > 8 {
        return None;
    }
    let digits = &body[..end];
    let hex = digits
        .strip_prefix('x')
        .or_else(|| digits.strip_prefix('X'));
    let code = match hex {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    let ch = char::from_u32(code)?;
    Some((ch, 2 + end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_five_basic_entities() {
        assert_eq!(
            decode_entities("&lt;div class=&quot;a&quot;&gt;it&#39;s &amp; more&lt;/div&gt;"),
            r#"<div class="a">it's & more</div>"#
        );
    }

    #[test]
    fn decoding_is_single_pass() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn decodes_numeric_references_and_keeps_stray_ampersands() {
        assert_eq!(decode_entities("&#60;&#x3E; a && b &bogus;"), "<> a && b &bogus;");
    }

    #[test]
    fn html_language_block_captures_language_and_content() {
        let text = r#"<p>Intro</p><pre><code class="language-java">class A {}</code></pre>"#;
        let spans = Dialect::HtmlLanguage.find_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].language, Some("java"));
        assert_eq!(spans[0].raw_content, "class A {}");
        assert_eq!(spans[0].start, 12);
    }

    #[test]
    fn html_language_block_tolerates_extra_classes() {
        let text = r#"<pre><code class="hljs language-python" data-x="1">pass</code></pre>"#;
        let spans = Dialect::HtmlLanguage.find_spans(text);
        assert_eq!(spans[0].language, Some("python"));
    }

    #[test]
    fn fenced_language_block_keeps_trailing_newline_and_stops_at_line_fence() {
        let text = "Intro\n```java\nclass A {\n  String s = \"```\";\n}\n```\nafter";
        let spans = Dialect::FencedLanguage.find_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].language, Some("java"));
        assert_eq!(spans[0].raw_content, "class A {\n  String s = \"```\";\n}\n");
    }

    #[test]
    fn fenced_language_block_with_header_suffix() {
        let spans = Dialect::FencedLanguage.find_spans("```java:App.java\nclass App {}\n```\n");
        assert_eq!(spans[0].language, Some("java"));
        assert_eq!(spans[0].raw_content, "class App {}\n");
    }

    #[test]
    fn empty_fenced_block_is_still_a_span() {
        let spans = Dialect::FencedLanguage.find_spans("```rust\n```\n");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].raw_content, "");
    }

    #[test]
    fn plain_fence_ignores_tagged_fences() {
        let text = "```\nplain\n```\n";
        assert_eq!(Dialect::FencedPlain.find_spans(text).len(), 1);
        assert!(Dialect::FencedLanguage.find_spans(text).is_empty());
    }

    #[test]
    fn html_plain_block_has_no_language() {
        let text = r#"<p>Run:</p><pre class="x"><code data-lang="py">x = 1</code></pre>"#;
        let spans = Dialect::HtmlPlain.find_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].language, None);
        assert_eq!(spans[0].raw_content, "x = 1");
        assert_eq!(spans[0].start, 11);
    }

    #[test]
    fn container_block_captures_the_inner_pre() {
        let text = r#"<div class="code-block-container"><pre>echo hi</pre></div>"#;
        let spans = Dialect::Container.find_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].raw_content, "echo hi");
        assert_eq!(spans[0].start, 0);
        assert!(Dialect::Container.find_spans("<div><pre>echo hi</pre></div>").is_empty());
    }

    #[test]
    fn bare_pre_block() {
        let text = "<p>out</p><pre>total 0</pre><pre data-x=\"1\">second</pre>";
        let spans = Dialect::BarePre.find_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].raw_content, "total 0");
        assert_eq!(spans[0].start, 10);
        assert_eq!(spans[1].raw_content, "second");
        assert!(Dialect::BarePre.find_spans("<prelude>x</prelude>").is_empty());
    }

    #[test]
    fn strips_highlighter_spans_and_breaks() {
        let raw = r#"<span class="hljs-keyword">int</span> x;<br>y;"#;
        assert_eq!(strip_highlight_markup(raw), "int x;\ny;");
    }

    #[test]
    fn finds_layout_marked_json() {
        let text = "<p><strong>Project layout</strong></p>\n<pre><code class=\"language-json\">{\"a\": null}</code></pre>";
        let spans = project_layout_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].body, "{\"a\": null}");
    }

    #[test]
    fn finds_markdown_layout_heading() {
        let text = "## Project structure\n\n```json\n{\"app\": {\"main.py\": null}}\n```\n";
        let spans = project_layout_spans(text);
        assert_eq!(spans.len(), 1);
        assert!(spans[0].body.contains("main.py"));
    }
}
