//! Explicit file-name hints in the prose around a code block.
//!
//! Strategies run from most to least explicit. Within a strategy the match
//! closest to the block wins.

use crate::contexts::manifest_extractor::{EXTENSIONLESS_FILES, looks_like_file_name};
use crate::data::patterns;
use crate::data::{CodeBlock, HintKind, LanguageConvention, LanguageTable};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// A file name or path named near a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHint {
    pub kind: HintKind,
    /// Forward-slash path without a leading slash.
    pub path: String,
}

impl PathHint {
    fn new(kind: HintKind, raw: &str) -> Self {
        let path = raw.replace('\\', "/");
        let path = path.trim_start_matches("./").trim_start_matches('/');
        Self {
            kind,
            path: path.to_string(),
        }
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Whether the hint carries directories.
    pub fn is_qualified(&self) -> bool {
        self.path.contains('/')
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rfind('.')
            .filter(|dot| *dot > 0)
            .map(|dot| &name[dot + 1..])
    }
}

const STRATEGIES: [HintKind; 7] = [
    HintKind::Breadcrumb,
    HintKind::QualifiedPath,
    HintKind::CommentMarker,
    HintKind::Heading,
    HintKind::Phrase,
    HintKind::FenceHeader,
    HintKind::BareName,
];

/// Framework names that look like script files.
const FRAMEWORK_NAMES: &[&str] = &[
    "node.js",
    "vue.js",
    "next.js",
    "nuxt.js",
    "react.js",
    "express.js",
    "three.js",
    "d3.js",
    "chart.js",
    "ember.js",
    "backbone.js",
    "angular.js",
    "alpine.js",
    "p5.js",
];

static BREADCRUMB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[\w.@-]+[ \t]*[→›»][ \t]*)+[\w.@-]+\.[A-Za-z0-9]+").expect("breadcrumb pattern")
});

static BREADCRUMB_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*[→›»][ \t]*").expect("breadcrumb separator pattern"));

static QUALIFIED_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[\w.@-]+/)+[\w@-][\w.@-]*\.[A-Za-z][A-Za-z0-9]{0,9}\b")
        .expect("qualified path pattern")
});

static COMMENT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)(?://|#|--|/\*|<!--|;|\*)[ \t]*(?:file(?:[ \t]*name)?|path)[ \t]*:[ \t]*([\w./\\@+-]+)")
        .expect("comment marker pattern")
});

static HTML_EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<(?:h[1-6]|strong|b|em|i|code)\b[^>]*>\s*(?:<(?:code|strong|b|em)>\s*)?([^<>\n]{1,200}?)\s*(?:</(?:code|strong|b|em)>\s*)?</(?:h[1-6]|strong|b|em|i|code)>",
    )
    .expect("html emphasis pattern")
});

static MARKDOWN_EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*([^*\n]{1,200})\*\*|__([^_\n]{1,200})__|`([^`\n]{1,200})`")
        .expect("markdown emphasis pattern")
});

static MARKDOWN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+(.+)$").expect("markdown heading pattern"));

static NUMBERED_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:[#*_]+[ \t]*)?file[ \t]+\d+[ \t]*[:.)-][ \t]*(.+)$")
        .expect("numbered file pattern")
});

static PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:file[ \t]*name|file|path|save[ \t]+(?:this[ \t]+|it[ \t]+)?as|file[ \t]+is|named|called)[ \t]*[:=]?[ \t]*[`'"*]*([\w./\\@+-]*[\w@+-]\.[A-Za-z][A-Za-z0-9]{0,9})\b"#,
    )
    .expect("phrase pattern")
});

static FENCE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*```[ \t]*[\w+#.-]*(?::|[ \t]+(?:title|file(?:name)?)=["']?)([^\s"'`]+)"#)
        .expect("fence suffix pattern")
});

static FILE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[\w.@+-]+/)*[\w@+-][\w.@+-]*\.[A-Za-z][A-Za-z0-9]{0,9}\b")
        .expect("file token pattern")
});

static BARE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[\w@+-][\w.@+-]*\.([A-Za-z][A-Za-z0-9]{0,9})\b").expect("bare name pattern")
});

/// Finds the most explicit path hint for `block`. Hints naming a file of a
/// different known language than `block_language` are skipped.
pub fn find_hint(
    block: &CodeBlock,
    block_language: Option<&LanguageConvention>,
    languages: &LanguageTable,
) -> Option<PathHint> {
    let context = patterns::decode_entities(&block.context_before);

    for kind in STRATEGIES {
        for candidate in candidates(kind, &context, &block.content, languages) {
            let hint = PathHint::new(kind, &candidate);
            if hint.path.is_empty() {
                continue;
            }
            if conflicts(&hint, block_language, languages) {
                debug!("Skipping {} hint '{}': language mismatch", kind, hint.path);
                continue;
            }
            debug!("Using {} hint '{}'", kind, hint.path);
            return Some(hint);
        }
    }
    None
}

fn conflicts(hint: &PathHint, block_language: Option<&LanguageConvention>, languages: &LanguageTable) -> bool {
    let (Some(block_language), Some(extension)) = (block_language, hint.extension()) else {
        return false;
    };
    match languages.by_extension(extension) {
        Some(hint_language) => hint_language.name != block_language.name,
        None => false,
    }
}

/// Candidates for one strategy, closest to the block first.
fn candidates(kind: HintKind, context: &str, content: &str, languages: &LanguageTable) -> Vec<String> {
    match kind {
        HintKind::Breadcrumb => closest_first(
            BREADCRUMB
                .find_iter(context)
                .map(|m| BREADCRUMB_SEPARATOR.replace_all(m.as_str(), "/").into_owned())
                .collect(),
        ),
        HintKind::QualifiedPath => closest_first(
            QUALIFIED_PATH
                .find_iter(context)
                .filter(|m| !is_url_part(context, m.start()))
                .map(|m| m.as_str().to_string())
                .collect(),
        ),
        HintKind::CommentMarker => {
            let head: String = content.lines().take(3).collect::<Vec<_>>().join("\n");
            let mut found = captures(&COMMENT_MARKER, &head);
            found.extend(closest_first(captures(&COMMENT_MARKER, context)));
            found.retain(|name| looks_like_file_name(name));
            found
        }
        HintKind::Heading => heading_candidates(context, languages),
        HintKind::Phrase => closest_first(captures(&PHRASE, context)),
        HintKind::FenceHeader => closest_first(
            captures(&FENCE_SUFFIX, context)
                .into_iter()
                .filter(|name| looks_like_file_name(name))
                .collect(),
        ),
        HintKind::BareName => closest_first(
            BARE_NAME
                .captures_iter(context)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    let extension = caps.get(1)?.as_str();
                    if !languages.knows_extension(extension) || is_framework_name(whole.as_str()) {
                        return None;
                    }
                    // Part of a longer path or URL handled by earlier strategies.
                    if context[..whole.start()].ends_with(['/', '\\', '.']) {
                        return None;
                    }
                    Some(whole.as_str().to_string())
                })
                .collect(),
        ),
    }
}

fn closest_first(mut found: Vec<String>) -> Vec<String> {
    found.reverse();
    found
}

fn captures(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// `example.com/app.js` in `https://example.com/app.js` is not a project path.
fn is_url_part(text: &str, start: usize) -> bool {
    let before = &text[..start];
    before.ends_with("//") || before.ends_with(':')
}

fn is_framework_name(name: &str) -> bool {
    FRAMEWORK_NAMES.iter().any(|framework| framework.eq_ignore_ascii_case(name))
}

fn heading_candidates(context: &str, languages: &LanguageTable) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();

    for caps in HTML_EMPHASIS.captures_iter(context) {
        if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
            found.push((whole.end(), inner.as_str().to_string()));
        }
    }
    for caps in MARKDOWN_EMPHASIS.captures_iter(context) {
        let inner = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3));
        if let (Some(whole), Some(inner)) = (caps.get(0), inner) {
            found.push((whole.end(), inner.as_str().to_string()));
        }
    }
    for re in [&*MARKDOWN_HEADING, &*NUMBERED_FILE] {
        for caps in re.captures_iter(context) {
            if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
                found.push((whole.end(), inner.as_str().to_string()));
            }
        }
    }

    found.sort_by(|a, b| b.0.cmp(&a.0));
    found
        .into_iter()
        .filter_map(|(_, text)| file_token(&text, languages))
        .collect()
}

/// First file-like token in a heading's text.
fn file_token(text: &str, languages: &LanguageTable) -> Option<String> {
    let trimmed = text.trim().trim_matches(|c| c == '`' || c == '*' || c == '"' || c == '\'');
    if EXTENSIONLESS_FILES.contains(&trimmed) {
        return Some(trimmed.to_string());
    }
    FILE_TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|token| {
            let extension = token.rsplit('.').next().unwrap_or("");
            (token.contains('/') || languages.knows_extension(extension)) && !is_framework_name(token)
        })
        .map(str::to_string)
}
