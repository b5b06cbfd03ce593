//! Locates the project manifest an LLM emitted alongside its code and turns
//! it into a [`PathTree`].
//!
//! Manifests arrive in many shapes: a JSON object marked as the project
//! layout, any JSON code block, an unfenced JSON object in the prose, or
//! ASCII tree art. None of them are guaranteed to be well formed, so JSON-like
//! text goes through a recovering recursive-descent parser rather than a
//! strict JSON reader.

use crate::data::patterns::{self, ManifestKind, ManifestSpan, TREE_BRANCH_MARKERS, TREE_PREFIX_CHARS};
use crate::data::{PathTree, PathTreeNode};
use log::{debug, info};
use serde::Serialize;
use std::ops::Range;

/// A parsed manifest plus the text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub tree: PathTree,
    /// Manifest text as the resolver will see it inside a block.
    pub source: String,
    /// Byte range of the manifest in the raw input, when it maps back to it.
    pub span: Option<Range<usize>>,
    pub kind: ManifestKind,
}

impl Manifest {
    fn new(tree: PathTree, source: &str, span: Option<Range<usize>>, kind: ManifestKind) -> Self {
        Self {
            tree,
            source: source.trim().to_string(),
            span,
            kind,
        }
    }
}

/// Finds the first manifest candidate with at least one file leaf.
pub fn extract_manifest(text: &str) -> Option<Manifest> {
    let manifest = from_project_layout(text)
        .or_else(|| from_json_blocks(text))
        .or_else(|| from_raw_json(text))
        .or_else(|| from_ascii_tree(text));

    match &manifest {
        Some(m) => info!(
            "Manifest found ({:?}): {} file(s), root {:?}",
            m.kind,
            m.tree.leaf_count(),
            m.tree.root
        ),
        None => debug!("No manifest in input"),
    }
    manifest
}

fn clean_body(body: &str) -> String {
    patterns::decode_entities(&patterns::strip_tags(&patterns::strip_highlight_markup(body)))
}

fn from_project_layout(text: &str) -> Option<Manifest> {
    for ManifestSpan { body, start, end } in patterns::project_layout_spans(text) {
        let body = clean_body(body);
        let tree = parse_tolerant(&body)
            .map(|parsed| parsed.tree)
            .or_else(|| parse_ascii_tree(&body).map(|(tree, _)| tree));
        match tree {
            Some(tree) => {
                return Some(Manifest::new(tree, &body, Some(start..end), ManifestKind::ProjectLayout));
            }
            None => debug!("Project layout block at {} has no file entries", start),
        }
    }
    None
}

fn from_json_blocks(text: &str) -> Option<Manifest> {
    for ManifestSpan { body, start, end } in patterns::json_block_spans(text) {
        let body = clean_body(body);
        if looks_like_project_document(&body) {
            debug!("JSON block at {} is a project document, not a layout", start);
            continue;
        }
        match parse_tolerant(&body) {
            Some(parsed) if parsed.null_leaves > 0 => {
                return Some(Manifest::new(parsed.tree, &body, Some(start..end), ManifestKind::JsonBlock));
            }
            Some(_) => debug!("JSON block at {} has no null leaves, treating it as a file", start),
            None => debug!("JSON block at {} has no file entries", start),
        }
    }
    None
}

fn from_raw_json(text: &str) -> Option<Manifest> {
    if let Some(found) = raw_json_in(text) {
        let (parsed, range) = found;
        let source = &text[range.clone()];
        return Some(Manifest::new(parsed.tree, source, Some(range), ManifestKind::RawJson));
    }

    // Offsets into the decoded text do not map back to the input.
    let decoded = clean_body(text);
    raw_json_in(&decoded).map(|(parsed, range)| {
        Manifest::new(parsed.tree, &decoded[range], None, ManifestKind::RawJson)
    })
}

/// Each candidate is parsed at most once: starts inside text an earlier
/// attempt already consumed are skipped.
fn raw_json_in(text: &str) -> Option<(ParsedManifest, Range<usize>)> {
    let mut covered = 0;
    for start in patterns::raw_json_starts(text) {
        if start < covered {
            continue;
        }
        let candidate = &text[start..];
        if let Some(len) = project_document_len(candidate) {
            covered = start + len;
            continue;
        }
        let (parsed, consumed) = parse_with_extent(candidate);
        covered = start + consumed.max(1);
        match parsed {
            Some(parsed) if parsed.nested && parsed.null_leaves > 0 => {
                let end = start + parsed.consumed;
                return Some((parsed, start..end));
            }
            Some(_) => debug!("Raw JSON at {} is not a nested layout with null leaves", start),
            None => {}
        }
    }
    None
}

fn from_ascii_tree(text: &str) -> Option<Manifest> {
    let cleaned = clean_body(text);
    let (tree, source) = parse_ascii_tree(&cleaned)?;
    Some(Manifest::new(tree, &source, None, ManifestKind::AsciiTree))
}

/// `package.json` and `tsconfig.json` style documents describe a project
/// but are files of their own.
fn looks_like_project_document(body: &str) -> bool {
    project_document_len(body).is_some()
}

/// Byte length of the leading project document in `body`, if it starts with one.
fn project_document_len(body: &str) -> Option<usize> {
    // Only the first value counts; raw candidates run to the end of the input.
    let mut stream = serde_json::Deserializer::from_str(body).into_iter::<serde_json::Value>();
    let Some(Ok(serde_json::Value::Object(object))) = stream.next() else {
        return None;
    };
    ["dependencies", "devDependencies", "compilerOptions", "scripts"]
        .iter()
        .any(|key| object.contains_key(*key))
        .then(|| stream.byte_offset())
}

/// Names without an extension that still denote files.
pub const EXTENSIONLESS_FILES: &[&str] = &[
    "Dockerfile",
    "Makefile",
    "LICENSE",
    "Procfile",
    "Jenkinsfile",
    "Gemfile",
    "Rakefile",
    "Vagrantfile",
];

/// True when the last segment of `name` has an extension or is a well-known
/// extensionless file.
pub fn looks_like_file_name(name: &str) -> bool {
    let base = name.rsplit('/').next().unwrap_or(name);
    if base.is_empty() || base.chars().any(|c| c.is_whitespace() || "*?<>|\"".contains(c)) {
        return false;
    }
    if EXTENSIONLESS_FILES.contains(&base) {
        return true;
    }
    match base.rfind('.') {
        Some(dot) => dot + 1 < base.len(),
        None => false,
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of the tolerant parser.
#[derive(Debug, Clone)]
pub struct ParsedManifest {
    pub tree: PathTree,
    /// Bytes of input consumed by the outermost object.
    pub consumed: usize,
    /// Whether any member held an object.
    pub nested: bool,
    /// Leaves written as `"name": null`.
    pub null_leaves: usize,
}

/// Objects nested deeper than this are skipped, not descended into.
const MAX_DEPTH: usize = 64;

/// Parses the first JSON-like object in `text`. Returns `None` when it holds
/// no file leaves.
pub fn parse_tolerant(text: &str) -> Option<ParsedManifest> {
    parse_with_extent(text).0
}

/// Like [`parse_tolerant`], also reporting how far into `text` the parser
/// read, whether or not it found leaves.
fn parse_with_extent(text: &str) -> (Option<ParsedManifest>, usize) {
    let mut parser = TolerantParser::new(text);
    let Some(top) = parser.parse_document() else {
        return (None, text.len());
    };
    let consumed = parser.pos;
    let tree = into_path_tree(top);
    if !tree.has_leaves() {
        return (None, consumed);
    }
    let parsed = ParsedManifest {
        tree,
        consumed,
        nested: parser.nested,
        null_leaves: parser.null_leaves,
    };
    (Some(parsed), consumed)
}

fn into_path_tree(top: PathTreeNode) -> PathTree {
    let PathTreeNode::Directory(mut children) = top else {
        return PathTree::new(None);
    };
    if children.first().is_none_or(|(_, node)| node.is_file()) {
        return PathTree {
            root: None,
            entries: PathTreeNode::Directory(children),
        };
    }

    let (root, mut entries) = children.remove(0);
    let siblings = PathTree {
        root: None,
        entries: PathTreeNode::Directory(children),
    };
    for path in siblings.leaf_paths() {
        let mut segments = split_path(&path);
        if let Some(name) = segments.pop() {
            entries.add_file(&segments, &name);
        }
    }
    PathTree {
        root: Some(root),
        entries,
    }
}

struct TolerantParser<'a> {
    text: &'a str,
    pos: usize,
    nested: bool,
    null_leaves: usize,
    root: PathTreeNode,
}

impl<'a> TolerantParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            nested: false,
            null_leaves: 0,
            root: PathTreeNode::new_directory(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if self.text[self.pos..].starts_with("//") {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Whitespace, comments and stray separators between members.
    fn skip_separators(&mut self) {
        loop {
            self.skip_whitespace();
            if self.peek() == Some(',') {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn parse_document(&mut self) -> Option<PathTreeNode> {
        let offset = self.text.find('{')?;
        if offset > 0 {
            debug!("Skipping {} byte(s) before manifest object", offset);
        }
        self.pos = offset;
        self.parse_object(&[], 1);
        Some(std::mem::replace(&mut self.root, PathTreeNode::new_directory()))
    }

    /// Expects the cursor on `{`. Returns at the matching `}` or end of input.
    /// `depth` counts this object.
    fn parse_object(&mut self, dir: &[String], depth: usize) {
        self.bump();
        loop {
            self.skip_separators();
            let key = match self.peek() {
                None => return,
                Some('}') => {
                    self.bump();
                    return;
                }
                Some(quote @ ('"' | '\'')) => self.parse_string(quote),
                Some(c) if is_bare_key_char(c) => self.parse_bare(),
                Some(c) => {
                    debug!("Unexpected '{}' at {} in manifest object", c, self.pos);
                    self.bump();
                    self.recover();
                    continue;
                }
            };

            self.skip_whitespace();
            match self.peek() {
                Some(':') => {
                    self.bump();
                }
                // `{"a.txt", "b.txt"}` lists files without values.
                Some(',') | Some('}') | None => {
                    self.record_if_file(dir, &key);
                    continue;
                }
                Some(c) => {
                    debug!("Expected ':' after '{}', found '{}'", key, c);
                    self.recover();
                    continue;
                }
            }

            self.skip_whitespace();
            match self.peek() {
                Some('{' | '[') if depth >= MAX_DEPTH => {
                    debug!("Manifest nesting exceeds {} levels at {}, skipping '{}'", MAX_DEPTH, self.pos, key);
                    self.skip_nested();
                }
                Some('{') => {
                    self.nested = true;
                    let mut path = dir.to_vec();
                    path.extend(split_path(&key));
                    self.root.ensure_directory(&path);
                    self.parse_object(&path, depth + 1);
                }
                Some('[') => {
                    let mut path = dir.to_vec();
                    path.extend(split_path(&key));
                    self.parse_array(&path, depth + 1);
                }
                Some(quote @ ('"' | '\'')) => {
                    self.parse_string(quote);
                    self.record_if_file(dir, &key);
                }
                Some(',') | Some('}') | None => self.record_if_file(dir, &key),
                Some(_) => {
                    let literal = self.parse_bare();
                    if literal == "null" {
                        self.null_leaves += 1;
                        self.record(dir, &key);
                    } else if literal.is_empty() {
                        debug!("Unreadable value for '{}' at {}", key, self.pos);
                        self.bump();
                        self.recover();
                    } else {
                        self.record_if_file(dir, &key);
                    }
                }
            }
        }
    }

    /// Expects the cursor on `[`. String items that look like files become
    /// leaves of `dir`.
    fn parse_array(&mut self, dir: &[String], depth: usize) {
        self.bump();
        loop {
            self.skip_separators();
            match self.peek() {
                None => return,
                Some(']') => {
                    self.bump();
                    return;
                }
                // Unbalanced; let the enclosing object close.
                Some('}') => return,
                Some(quote @ ('"' | '\'')) => {
                    let item = self.parse_string(quote);
                    if looks_like_file_name(&item) {
                        self.record(dir, &item);
                    }
                }
                Some('{' | '[') if depth >= MAX_DEPTH => {
                    debug!("Manifest nesting exceeds {} levels at {}", MAX_DEPTH, self.pos);
                    self.skip_nested();
                }
                Some('{') => {
                    self.nested = true;
                    self.parse_object(dir, depth + 1);
                }
                Some('[') => self.parse_array(dir, depth + 1),
                Some(_) => {
                    if self.parse_bare().is_empty() {
                        self.bump();
                    }
                }
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> String {
        self.bump();
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if c == quote {
                return out;
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            match self.bump() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('u') => {
                    let end = (self.pos + 4).min(self.text.len());
                    let decoded = self
                        .text
                        .get(self.pos..end)
                        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                        .and_then(char::from_u32);
                    if let Some(ch) = decoded {
                        out.push(ch);
                        self.pos = end;
                    }
                }
                Some(other) => out.push(other),
                None => break,
            }
        }
        debug!("Unterminated string in manifest");
        out
    }

    fn parse_bare(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_bare_key_char(c) {
                break;
            }
            self.bump();
        }
        self.text[start..self.pos].to_string()
    }

    /// Expects the cursor on `{` or `[`. Moves past the balanced value without
    /// recursing; stops at end of input when it never closes.
    fn skip_nested(&mut self) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => {
                    self.parse_string(c);
                    continue;
                }
                '{' | '[' => depth += 1,
                '}' | ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                _ => {}
            }
            self.bump();
        }
    }

    /// Skips to the next `,` or `}` at the current nesting depth.
    fn recover(&mut self) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => {
                    self.parse_string(c);
                    continue;
                }
                '{' | '[' => depth += 1,
                '}' | ']' if depth > 0 => depth -= 1,
                '}' => return,
                ',' if depth == 0 => return,
                _ => {}
            }
            self.bump();
        }
    }

    fn record_if_file(&mut self, dir: &[String], key: &str) {
        if looks_like_file_name(key) {
            self.record(dir, key);
        }
    }

    fn record(&mut self, dir: &[String], key: &str) {
        let mut path = dir.to_vec();
        path.extend(split_path(key));
        if key.trim_end().ends_with('/') {
            self.root.ensure_directory(&path);
            return;
        }
        let Some(name) = path.pop() else {
            return;
        };
        if !self.root.add_file(&path, &name) {
            debug!("Manifest entry '{}' could not be placed", key);
        }
    }
}

fn is_bare_key_char(c: char) -> bool {
    c.is_alphanumeric() || "_-./$@+~#".contains(c)
}

/// Reads the first ASCII tree region in `text`. Returns the tree and the
/// region's lines as they appear in `text`.
pub fn parse_ascii_tree(text: &str) -> Option<(PathTree, String)> {
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        if !is_glyph_line(lines[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < lines.len() && is_glyph_line(lines[i]) {
            i += 1;
        }
        let region = &lines[start..i];
        let root_line = start
            .checked_sub(1)
            .map(|prev| lines[prev].trim())
            .filter(|prev| prev.ends_with('/') && !prev.contains(char::is_whitespace));

        if let Some(tree) = read_tree_region(root_line, region) {
            let first = if root_line.is_some() { start - 1 } else { start };
            return Some((tree, lines[first..i].join("\n")));
        }
        debug!("Tree-like region at line {} has no file entries", start + 1);
    }
    None
}

fn is_glyph_line(line: &str) -> bool {
    if TREE_BRANCH_MARKERS.iter().any(|marker| line.contains(marker)) {
        return true;
    }
    // Vertical spacer lines between siblings.
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.chars().all(|c| "│┃|".contains(c) || c.is_whitespace())
}

struct TreeLine {
    width: usize,
    name: String,
}

fn split_tree_line(line: &str) -> TreeLine {
    let prefix_len = line
        .char_indices()
        .find(|(_, c)| !TREE_PREFIX_CHARS.contains(c))
        .map(|(idx, _)| idx)
        .unwrap_or(line.len());
    let width = line[..prefix_len].chars().count();
    TreeLine {
        width,
        name: clean_tree_name(&line[prefix_len..]),
    }
}

fn clean_tree_name(raw: &str) -> String {
    let mut name = raw;
    for marker in [" #", "\t#", " //", "\t//", " <-", " ←"] {
        if let Some(idx) = name.find(marker) {
            name = &name[..idx];
        }
    }
    name.trim()
        .trim_matches(|c| c == '`' || c == '*')
        .trim()
        .to_string()
}

fn read_tree_region(root_line: Option<&str>, region: &[&str]) -> Option<PathTree> {
    let entries: Vec<TreeLine> = region
        .iter()
        .map(|line| split_tree_line(line))
        .filter(|entry| !entry.name.is_empty() && !entry.name.contains('|'))
        .collect();
    if entries.len() < 2 {
        return None;
    }

    let unit = entries
        .iter()
        .map(|entry| entry.width)
        .filter(|width| *width > 0)
        .min()
        .unwrap_or(1);
    let depths: Vec<usize> = entries.iter().map(|entry| entry.width / unit).collect();

    let mut tree = PathTree::new(root_line.map(|line| line.trim_end_matches('/').to_string()));
    let mut stack: Vec<(usize, String)> = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        let depth = depths[idx];
        while stack.last().is_some_and(|(d, _)| *d >= depth) {
            stack.pop();
        }

        let deeper_follows = depths.get(idx + 1).is_some_and(|next| *next > depth);
        let is_dir = entry.name.ends_with('/') || (deeper_follows && !entry.name.contains('.'));
        let name = entry.name.trim_end_matches('/').to_string();

        let dir: Vec<String> = stack.iter().map(|(_, n)| n.clone()).collect();
        if (is_dir || deeper_follows) && stack.len() >= MAX_DEPTH {
            debug!("Tree nesting exceeds {} levels, flattening '{}'", MAX_DEPTH, name);
        } else if is_dir || deeper_follows {
            tree.entries.ensure_directory(&[dir, vec![name.clone()]].concat());
            stack.push((depth, name));
        } else if looks_like_file_name(&name) {
            tree.entries.add_file(&dir, &name);
        } else {
            debug!("Ignoring tree entry '{}'", entry.name);
        }
    }

    tree.has_leaves().then_some(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_object_key_becomes_root() {
        let parsed = parse_tolerant(
            r#"{"demo": {"pom.xml": null, "src": {"main": {"java": {"App.java": null}}}}}"#,
        )
        .unwrap();
        assert_eq!(parsed.tree.root.as_deref(), Some("demo"));
        assert_eq!(
            parsed.tree.leaf_paths(),
            vec!["demo/pom.xml", "demo/src/main/java/App.java"]
        );
        assert!(parsed.nested);
    }

    #[test]
    fn leading_file_key_means_no_root() {
        let parsed = parse_tolerant(r#"{"README.md": null, "src": {"lib.rs": null}}"#).unwrap();
        assert_eq!(parsed.tree.root, None);
        assert_eq!(parsed.tree.leaf_paths(), vec!["README.md", "src/lib.rs"]);
    }

    #[test]
    fn siblings_of_the_root_are_merged_beneath_it() {
        let parsed = parse_tolerant(r#"{"app": {"main.py": null}, "README.md": null}"#).unwrap();
        assert_eq!(parsed.tree.leaf_paths(), vec!["app/main.py", "app/README.md"]);
    }

    #[test]
    fn accepts_bare_keys_single_quotes_and_trailing_commas() {
        let parsed = parse_tolerant("{ app: { 'index.js': null, lib: { util.js: null, }, }, }").unwrap();
        assert_eq!(parsed.tree.leaf_paths(), vec!["app/index.js", "app/lib/util.js"]);
    }

    #[test]
    fn keys_with_slashes_expand_into_directories() {
        let parsed = parse_tolerant(r#"{"web": {"src/main/java": {"A.java": null}, "docs/guide.md": null}}"#).unwrap();
        assert_eq!(
            parsed.tree.leaf_paths(),
            vec!["web/src/main/java/A.java", "web/docs/guide.md"]
        );
    }

    #[test]
    fn arrays_of_names_become_leaves() {
        let parsed = parse_tolerant(r#"{"site": {"css": ["main.css", "theme.css"], "notes": ["todo"]}}"#).unwrap();
        assert_eq!(parsed.tree.leaf_paths(), vec!["site/css/main.css", "site/css/theme.css"]);
    }

    #[test]
    fn scalar_values_count_only_for_file_like_keys() {
        let parsed = parse_tolerant(r#"{"p": {"main.go": "entry point", "version": "1.0"}}"#).unwrap();
        assert_eq!(parsed.tree.leaf_paths(), vec!["p/main.go"]);
    }

    #[test]
    fn recovers_from_garbage_inside_an_object() {
        let parsed = parse_tolerant(r#"{"p": {"a.txt": null, ??? junk, "b.txt": null}}"#).unwrap();
        assert_eq!(parsed.tree.leaf_paths(), vec!["p/a.txt", "p/b.txt"]);
    }

    #[test]
    fn truncated_manifest_keeps_its_leaves() {
        let parsed = parse_tolerant(r#"{"p": {"a.txt": null, "src": {"b.rs": null, "c.rs"#).unwrap();
        assert_eq!(parsed.tree.leaf_paths(), vec!["p/a.txt", "p/src/b.rs", "p/src/c.rs"]);
    }

    #[test]
    fn prose_before_the_object_is_skipped() {
        let parsed = parse_tolerant("Here you go: {\"x\": {\"y.txt\": null}}").unwrap();
        assert_eq!(parsed.tree.leaf_paths(), vec!["x/y.txt"]);
    }

    #[test]
    fn manifest_without_leaves_is_absent() {
        assert!(parse_tolerant(r#"{"a": {"b": {}}}"#).is_none());
        assert!(parse_tolerant("no braces at all").is_none());
    }

    #[test]
    fn reads_unicode_tree_with_root_line() {
        let text = "Layout:\nmy-app/\n├── src/\n│   ├── main.rs   # entry\n│   └── lib.rs\n└── Cargo.toml\n\nDone.";
        let (tree, source) = parse_ascii_tree(text).unwrap();
        assert_eq!(tree.root.as_deref(), Some("my-app"));
        assert_eq!(
            tree.leaf_paths(),
            vec!["my-app/src/main.rs", "my-app/src/lib.rs", "my-app/Cargo.toml"]
        );
        assert!(source.starts_with("my-app/"));
        assert!(source.ends_with("Cargo.toml"));
    }

    #[test]
    fn reads_ascii_tree_without_slashes_on_directories() {
        let text = "|-- server\n|   |-- app.js\n|   `-- routes.js\n`-- package.json";
        let (tree, _) = parse_ascii_tree(text).unwrap();
        assert_eq!(tree.root, None);
        assert_eq!(
            tree.leaf_paths(),
            vec!["server/app.js", "server/routes.js", "package.json"]
        );
    }

    #[test]
    fn markdown_tables_are_not_trees() {
        assert!(parse_ascii_tree("| File | Purpose |\n| main.rs | entry |").is_none());
    }

    #[test]
    fn layout_marked_block_wins() {
        let text = "```json\n{\"other\": {\"x.txt\": null}}\n```\n\n**Project layout**\n```json\n{\"demo\": {\"a.py\": null}}\n```\n";
        let manifest = extract_manifest(text).unwrap();
        assert_eq!(manifest.kind, ManifestKind::ProjectLayout);
        assert_eq!(manifest.tree.leaf_paths(), vec!["demo/a.py"]);
    }

    #[test]
    fn html_json_block_is_decoded_before_parsing() {
        let text = r#"<pre><code class="language-json">{&quot;demo&quot;: {&quot;a.py&quot;: null}}</code></pre>"#;
        let manifest = extract_manifest(text).unwrap();
        assert_eq!(manifest.kind, ManifestKind::JsonBlock);
        assert_eq!(manifest.source, r#"{"demo": {"a.py": null}}"#);
        assert_eq!(manifest.span, Some(0..text.len()));
    }

    #[test]
    fn package_json_is_not_a_manifest() {
        let text = "```json\n{\"name\": \"x\", \"files\": [\"dist/index.js\"], \"scripts\": {}}\n```\n";
        assert!(extract_manifest(text).is_none());
    }

    #[test]
    fn raw_json_needs_a_nested_object() {
        let flat = "Files: {\"a.txt\": null} and more";
        assert!(extract_manifest(flat).is_none());

        let nested = "Structure: {\"p\": {\"a.txt\": null}} then code";
        let manifest = extract_manifest(nested).unwrap();
        assert_eq!(manifest.kind, ManifestKind::RawJson);
        assert_eq!(manifest.source, "{\"p\": {\"a.txt\": null}}");
    }

    #[test]
    fn raw_json_is_found_in_entity_encoded_prose() {
        let text = "<p>{&quot;p&quot;: {&quot;a.txt&quot;: null}}</p>";
        let manifest = extract_manifest(text).unwrap();
        assert_eq!(manifest.kind, ManifestKind::RawJson);
        assert_eq!(manifest.span, None);
    }

    #[test]
    fn ascii_tree_is_the_last_resort() {
        let text = "<pre><code>proj/\n├── a.c\n└── b.h\n</code></pre>";
        let manifest = extract_manifest(text).unwrap();
        assert_eq!(manifest.kind, ManifestKind::AsciiTree);
        assert_eq!(manifest.tree.leaf_paths(), vec!["proj/a.c", "proj/b.h"]);
    }

    #[test]
    fn deep_nesting_is_skipped_without_recursing() {
        let deep = format!("{}{{\"a.txt\": null", "{\"a\": ".repeat(100_000));
        assert!(parse_tolerant(&deep).is_none());

        let arrays = format!("{{\"p\": {}", "[".repeat(100_000));
        assert!(parse_tolerant(&arrays).is_none());

        let text = format!("```json\n{}\n```\n", "{\"a\":".repeat(100_000));
        assert!(extract_manifest(&text).is_none());
    }

    #[test]
    fn nesting_up_to_the_limit_is_kept() {
        let keys: Vec<String> = (0..MAX_DEPTH - 1).map(|i| format!("{{\"d{}\": ", i)).collect();
        let text = format!("{}{{\"leaf.txt\": null{}", keys.concat(), "}".repeat(MAX_DEPTH));
        let parsed = parse_tolerant(&text).unwrap();
        assert_eq!(parsed.tree.leaf_count(), 1);
        assert!(parsed.tree.leaf_paths()[0].ends_with("/d62/leaf.txt"));
    }

    #[test]
    fn deep_ascii_tree_is_flattened() {
        let lines: Vec<String> = (0..200)
            .map(|i| format!("{}└── d{}", "    ".repeat(i), i))
            .chain(std::iter::once(format!("{}└── end.txt", "    ".repeat(200))))
            .collect();
        let (tree, _) = parse_ascii_tree(&lines.join("\n")).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.leaf_paths()[0].matches('/').count(), MAX_DEPTH);
    }

    #[test]
    fn raw_candidates_are_parsed_once() {
        let text = format!("```rust\nlet x = 1;\n```\n{}", "{\"k\": 1, ".repeat(20_000));
        let started = std::time::Instant::now();
        assert!(extract_manifest(&text).is_none());
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn json_files_without_null_leaves_are_not_layouts() {
        let text = "```json\n{\"manifest_version\": 3, \"background\": {\"service_worker\": \"background.js\"}, \"content_scripts\": [{\"js\": [\"content.js\"]}]}\n```\n";
        assert!(extract_manifest(text).is_none());

        let raw = "Config: {\"assets\": {\"logo.png\": \"base64\", \"files\": [\"a.css\"]}}";
        assert!(extract_manifest(raw).is_none());
    }

    #[test]
    fn null_leaves_are_counted() {
        let parsed = parse_tolerant(r#"{"p": {"a.txt": null, "b.txt": "x", "c": ["d.txt"]}}"#).unwrap();
        assert_eq!(parsed.null_leaves, 1);
        assert_eq!(parsed.tree.leaf_count(), 3);
    }
}
