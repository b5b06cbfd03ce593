//! Per-language path conventions and file-name inference rules.
//!
//! The table is plain data: adding a language means adding a row, never a
//! new branch in the resolver.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Strategy used to derive a file name from code content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingRule {
    /// `package a.b;` + `public class Foo` → `a/b/Foo.<ext>`
    JvmDeclaration,
    /// `class Foo` or `function foo(` → `Foo.<ext>` / `foo.<ext>`
    ScriptDeclaration,
    /// `<title>My Page</title>` → `my-page.html`
    MarkupTitle,
    /// Well-known XML descriptors (`pom.xml`, `web.xml`, ...)
    XmlDescriptor,
    /// Dominant key prefix: `plugin.id=…` → `plugin.properties`
    PropertiesPrefix,
    RustModule,
    GoPackage,
    PythonModule,
    Dockerfile,
    YamlDocument,
    TomlManifest,
    SqlSchema,
    JsonDocument,
    MarkdownReadme,
    /// No inference; the resolver falls back to `snippet_<n>`.
    #[default]
    Counter,
}

/// Where an inferred file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Directly in the language's default directory.
    Default,
    /// Below the language's default directory.
    Nested(String),
    /// Relative to the project root, ignoring the default directory.
    ProjectRoot(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredName {
    pub location: Location,
    pub file_name: String,
}

impl InferredName {
    fn new(location: Location, file_name: impl Into<String>) -> Self {
        Self {
            location,
            file_name: file_name.into(),
        }
    }
}

impl NamingRule {
    /// Derives a file name from `content`; `extension` is the language's
    /// primary extension.
    pub fn infer(&self, content: &str, extension: &str) -> Option<InferredName> {
        match self {
            NamingRule::JvmDeclaration => infer_jvm(content, extension),
            NamingRule::ScriptDeclaration => infer_script(content, extension),
            NamingRule::MarkupTitle => infer_markup(content, extension),
            NamingRule::XmlDescriptor => infer_xml(content),
            NamingRule::PropertiesPrefix => infer_properties(content),
            NamingRule::RustModule => infer_rust(content),
            NamingRule::GoPackage => infer_go(content),
            NamingRule::PythonModule => infer_python(content),
            NamingRule::Dockerfile => infer_dockerfile(content),
            NamingRule::YamlDocument => infer_yaml(content),
            NamingRule::TomlManifest => infer_toml(content),
            NamingRule::SqlSchema => infer_sql(content),
            NamingRule::JsonDocument => infer_json(content),
            NamingRule::MarkdownReadme => infer_markdown(content),
            NamingRule::Counter => None,
        }
    }
}

static JVM_PACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*package\s+([A-Za-z_][\w.]*)\s*;?\s*$").expect("jvm package pattern")
});

static JVM_PUBLIC_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*public\s+(?:(?:abstract|final|sealed|static|strictfp|partial)\s+)*(?:class|interface|enum|record|@interface)\s+([A-Za-z_]\w*)",
    )
    .expect("jvm public type pattern")
});

static JVM_ANY_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:(?:public|private|protected|internal|abstract|final|sealed|static|open|data|inline|value|partial)\s+)*(?:class|interface|enum\s+class|enum|record|object|@interface)\s+([A-Za-z_]\w*)",
    )
    .expect("jvm type pattern")
});

static SCRIPT_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+(?:default\s+)?)?(?:abstract\s+|final\s+)?class\s+([A-Za-z_$][\w$]*)")
        .expect("script class pattern")
});

static SCRIPT_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+(?:default\s+)?)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*\(")
        .expect("script function pattern")
});

static MARKUP_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<title[^>]*>\s*([^<]*?)\s*</title>").expect("title pattern")
});

static RUST_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*pub(?:\([^)]*\))?\s+(?:struct|enum|trait)\s+([A-Za-z_]\w*)")
        .expect("rust type pattern")
});

static GO_PACKAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*package\s+(\w+)").expect("go package pattern"));

static PY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^class\s+([A-Za-z_]\w*)").expect("python class pattern"));

static PY_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:async\s+)?def\s+([A-Za-z_]\w*)").expect("python def pattern")
});

static YAML_KIND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^kind:\s*(\w+)").expect("yaml kind pattern"));

static SQL_CREATE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcreate\s+table\b").expect("sql create pattern"));

static SQL_INSERT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*insert\s+into\b").expect("sql insert pattern"));

fn capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn has_line_starting(content: &str, prefix: &str) -> bool {
    content.lines().any(|line| line.starts_with(prefix))
}

fn first_meaningful_line(content: &str) -> &str {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

/// `HelloWorld` → `hello_world`, `HTTPServer` → `http_server`
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// `My Landing Page!` → `my-landing-page`
pub fn slugify(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

fn infer_jvm(content: &str, extension: &str) -> Option<InferredName> {
    let type_name = capture(&JVM_PUBLIC_TYPE, content).or_else(|| capture(&JVM_ANY_TYPE, content))?;
    let location = match capture(&JVM_PACKAGE, content) {
        Some(package) => Location::Nested(package.replace('.', "/")),
        None => Location::Default,
    };
    Some(InferredName::new(location, format!("{}.{}", type_name, extension)))
}

fn infer_script(content: &str, extension: &str) -> Option<InferredName> {
    let name = capture(&SCRIPT_CLASS, content).or_else(|| capture(&SCRIPT_FUNCTION, content))?;
    Some(InferredName::new(Location::Default, format!("{}.{}", name, extension)))
}

fn infer_markup(content: &str, extension: &str) -> Option<InferredName> {
    if let Some(title) = capture(&MARKUP_TITLE, content) {
        let slug = slugify(&title);
        if !slug.is_empty() {
            return Some(InferredName::new(Location::Default, format!("{}.{}", slug, extension)));
        }
    }
    if content.to_ascii_lowercase().contains("<html") {
        return Some(InferredName::new(Location::Default, format!("index.{}", extension)));
    }
    None
}

fn infer_xml(content: &str) -> Option<InferredName> {
    if content.contains("<project")
        && (content.contains("<modelVersion>") || content.contains("maven.apache.org"))
    {
        return Some(InferredName::new(Location::ProjectRoot(String::new()), "pom.xml"));
    }
    if content.contains("<web-app") {
        return Some(InferredName::new(
            Location::ProjectRoot("src/main/webapp/WEB-INF".to_string()),
            "web.xml",
        ));
    }
    if content.contains("<manifest") && content.contains("android") {
        return Some(InferredName::new(
            Location::ProjectRoot("app/src/main".to_string()),
            "AndroidManifest.xml",
        ));
    }
    if content.contains("<beans") {
        return Some(InferredName::new(Location::Default, "applicationContext.xml"));
    }
    if content.contains("<configuration") && content.contains("<appender") {
        return Some(InferredName::new(Location::Default, "logback.xml"));
    }
    None
}

fn infer_properties(content: &str) -> Option<InferredName> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut total = 0usize;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some(key) = line.split(|c| c == '=' || c == ':').next() else {
            continue;
        };
        total += 1;
        let Some((prefix, _)) = key.trim().split_once('.') else {
            continue;
        };
        match counts.iter_mut().find(|(p, _)| p == prefix) {
            Some((_, n)) => *n += 1,
            None => counts.push((prefix.to_string(), 1)),
        }
    }

    // First prefix wins ties so the result does not depend on hash order.
    let mut best: Option<(String, usize)> = None;
    for (prefix, n) in counts {
        if best.as_ref().is_none_or(|(_, b)| n > *b) {
            best = Some((prefix, n));
        }
    }
    let (prefix, n) = best?;
    if n * 2 < total || prefix.is_empty() {
        return None;
    }
    let file_name = match prefix.as_str() {
        "spring" | "server" | "management" => "application.properties".to_string(),
        _ => format!("{}.properties", prefix),
    };
    Some(InferredName::new(Location::Default, file_name))
}

fn infer_rust(content: &str) -> Option<InferredName> {
    if content.contains("fn main(") {
        return Some(InferredName::new(Location::Default, "main.rs"));
    }
    if let Some(name) = capture(&RUST_TYPE, content) {
        return Some(InferredName::new(
            Location::Default,
            format!("{}.rs", to_snake_case(&name)),
        ));
    }
    if has_line_starting(content, "pub mod ") {
        return Some(InferredName::new(Location::Default, "lib.rs"));
    }
    None
}

fn infer_go(content: &str) -> Option<InferredName> {
    let package = capture(&GO_PACKAGE, content)?;
    if package == "main" {
        return Some(InferredName::new(Location::Default, "main.go"));
    }
    Some(InferredName::new(
        Location::Nested(package.clone()),
        format!("{}.go", package),
    ))
}

fn infer_python(content: &str) -> Option<InferredName> {
    if content.contains("from setuptools import") || has_line_starting(content, "setup(") {
        return Some(InferredName::new(Location::ProjectRoot(String::new()), "setup.py"));
    }
    if content.contains("Flask(__name__)") {
        return Some(InferredName::new(Location::Default, "app.py"));
    }
    if content.contains("__name__ == \"__main__\"") || content.contains("__name__ == '__main__'") {
        return Some(InferredName::new(Location::Default, "main.py"));
    }
    if let Some(class) = capture(&PY_CLASS, content) {
        return Some(InferredName::new(
            Location::Default,
            format!("{}.py", to_snake_case(&class)),
        ));
    }
    capture(&PY_DEF, content)
        .map(|function| InferredName::new(Location::Default, format!("{}.py", function)))
}

fn infer_dockerfile(content: &str) -> Option<InferredName> {
    let first = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))?;
    if first.to_ascii_uppercase().starts_with("FROM ") {
        Some(InferredName::new(Location::ProjectRoot(String::new()), "Dockerfile"))
    } else {
        None
    }
}

fn infer_yaml(content: &str) -> Option<InferredName> {
    if has_line_starting(content, "apiVersion:") {
        if let Some(kind) = capture(&YAML_KIND, content) {
            return Some(InferredName::new(
                Location::ProjectRoot("k8s".to_string()),
                format!("{}.yaml", kind.to_ascii_lowercase()),
            ));
        }
    }
    if has_line_starting(content, "services:") {
        return Some(InferredName::new(
            Location::ProjectRoot(String::new()),
            "docker-compose.yml",
        ));
    }
    if has_line_starting(content, "spring:") {
        return Some(InferredName::new(
            Location::ProjectRoot("src/main/resources".to_string()),
            "application.yml",
        ));
    }
    if has_line_starting(content, "jobs:") && has_line_starting(content, "on:") {
        return Some(InferredName::new(
            Location::ProjectRoot(".github/workflows".to_string()),
            "ci.yml",
        ));
    }
    if has_line_starting(content, "openapi:") {
        return Some(InferredName::new(Location::Default, "openapi.yaml"));
    }
    None
}

fn infer_toml(content: &str) -> Option<InferredName> {
    if has_line_starting(content, "[package]") {
        return Some(InferredName::new(Location::ProjectRoot(String::new()), "Cargo.toml"));
    }
    if has_line_starting(content, "[project]") || has_line_starting(content, "[tool.poetry]") {
        return Some(InferredName::new(
            Location::ProjectRoot(String::new()),
            "pyproject.toml",
        ));
    }
    None
}

fn infer_sql(content: &str) -> Option<InferredName> {
    if SQL_CREATE_TABLE.is_match(content) {
        return Some(InferredName::new(Location::Default, "schema.sql"));
    }
    if SQL_INSERT.is_match(content) {
        return Some(InferredName::new(Location::Default, "data.sql"));
    }
    None
}

fn infer_json(content: &str) -> Option<InferredName> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    let object = value.as_object()?;
    if object.contains_key("compilerOptions") {
        return Some(InferredName::new(Location::ProjectRoot(String::new()), "tsconfig.json"));
    }
    if object.contains_key("name")
        && ["dependencies", "devDependencies", "scripts"]
            .iter()
            .any(|key| object.contains_key(*key))
    {
        return Some(InferredName::new(Location::ProjectRoot(String::new()), "package.json"));
    }
    None
}

fn infer_markdown(content: &str) -> Option<InferredName> {
    if first_meaningful_line(content).starts_with("# ") {
        Some(InferredName::new(Location::ProjectRoot(String::new()), "README.md"))
    } else {
        None
    }
}

/// One row of the language table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConvention {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Known extensions, primary first.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Default directory relative to the project root; empty for the root.
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub naming: NamingRule,
    /// Line prefixes that identify untagged content. A leading `^` restricts
    /// the marker to the first non-blank line.
    #[serde(default)]
    pub markers: Vec<String>,
}

impl LanguageConvention {
    pub fn primary_extension(&self) -> &str {
        self.extensions
            .first()
            .map(String::as_str)
            .unwrap_or(&self.name)
    }

    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.aliases.iter().any(|a| a == key)
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(extension))
    }

    pub fn detects(&self, content: &str) -> bool {
        let first = first_meaningful_line(content);
        self.markers.iter().any(|marker| match marker.strip_prefix('^') {
            Some(anchored) => first.starts_with(anchored),
            None => content
                .lines()
                .any(|line| line.trim_start().starts_with(marker.as_str())),
        })
    }

    pub fn infer_name(&self, content: &str) -> Option<InferredName> {
        self.naming.infer(content, self.primary_extension())
    }
}

struct Row {
    name: &'static str,
    aliases: &'static [&'static str],
    extensions: &'static [&'static str],
    directory: &'static str,
    naming: NamingRule,
    markers: &'static [&'static str],
}

/// Built-in conventions. Order is detection priority for untagged blocks.
const BUILTIN: &[Row] = &[
    Row {
        name: "html",
        aliases: &["htm", "xhtml"],
        extensions: &["html", "htm"],
        directory: "src/main/resources/static",
        naming: NamingRule::MarkupTitle,
        markers: &["^<!DOCTYPE html", "^<!doctype html", "^<html"],
    },
    Row {
        name: "xml",
        aliases: &["xsd", "xsl"],
        extensions: &["xml"],
        directory: "src/main/resources",
        naming: NamingRule::XmlDescriptor,
        markers: &["^<?xml", "^<project", "^<beans", "^<web-app", "^<configuration"],
    },
    Row {
        name: "php",
        aliases: &[],
        extensions: &["php"],
        directory: "src",
        naming: NamingRule::ScriptDeclaration,
        markers: &["^<?php"],
    },
    Row {
        name: "csharp",
        aliases: &["cs", "c#", "dotnet"],
        extensions: &["cs"],
        directory: "src",
        naming: NamingRule::JvmDeclaration,
        markers: &["using System", "namespace "],
    },
    Row {
        name: "kotlin",
        aliases: &["kt", "kts"],
        extensions: &["kt", "kts"],
        directory: "src/main/kotlin",
        naming: NamingRule::JvmDeclaration,
        markers: &["fun ", "import kotlin", "data class "],
    },
    Row {
        name: "go",
        aliases: &["golang"],
        extensions: &["go"],
        directory: "",
        naming: NamingRule::GoPackage,
        markers: &["func "],
    },
    Row {
        name: "rust",
        aliases: &["rs"],
        extensions: &["rs"],
        directory: "src",
        naming: NamingRule::RustModule,
        markers: &["fn ", "pub fn ", "use std", "impl ", "pub struct ", "#[derive"],
    },
    Row {
        name: "java",
        aliases: &[],
        extensions: &["java"],
        directory: "src/main/java",
        naming: NamingRule::JvmDeclaration,
        markers: &[
            "package ",
            "import java",
            "public class ",
            "public final class ",
            "public abstract class ",
            "public interface ",
        ],
    },
    Row {
        name: "typescript",
        aliases: &["ts", "tsx"],
        extensions: &["ts", "tsx"],
        directory: "src",
        naming: NamingRule::ScriptDeclaration,
        markers: &["export interface ", "import type ", "interface ", "type "],
    },
    Row {
        name: "javascript",
        aliases: &["js", "jsx", "mjs", "cjs", "node", "nodejs"],
        extensions: &["js", "jsx", "mjs", "cjs"],
        directory: "src/main/resources/static/js",
        naming: NamingRule::ScriptDeclaration,
        markers: &[
            "function ",
            "const ",
            "let ",
            "var ",
            "export ",
            "module.exports",
            "import React",
            "document.",
            "$(document",
        ],
    },
    Row {
        name: "css",
        aliases: &["scss", "sass", "less"],
        extensions: &["css", "scss", "less"],
        directory: "src/main/resources/static/css",
        naming: NamingRule::Counter,
        markers: &["body {", ":root {", "@media ", "@import "],
    },
    Row {
        name: "python",
        aliases: &["py", "python3", "py3"],
        extensions: &["py"],
        directory: "",
        naming: NamingRule::PythonModule,
        markers: &["def ", "import ", "from ", "if __name__", "class "],
    },
    Row {
        name: "sql",
        aliases: &["mysql", "postgresql", "postgres", "psql", "plsql", "sqlite"],
        extensions: &["sql"],
        directory: "src/main/resources",
        naming: NamingRule::SqlSchema,
        markers: &["CREATE ", "SELECT ", "INSERT ", "ALTER ", "create ", "select ", "insert "],
    },
    Row {
        name: "shell",
        aliases: &["sh", "bash", "zsh"],
        extensions: &["sh"],
        directory: "scripts",
        naming: NamingRule::Counter,
        markers: &["^#!/bin/bash", "^#!/bin/sh", "^#!/usr/bin/env bash", "^#!/usr/bin/env sh"],
    },
    Row {
        name: "dockerfile",
        aliases: &["docker"],
        extensions: &["dockerfile"],
        directory: "",
        naming: NamingRule::Dockerfile,
        markers: &["^FROM "],
    },
    Row {
        name: "yaml",
        aliases: &["yml"],
        extensions: &["yaml", "yml"],
        directory: "config",
        naming: NamingRule::YamlDocument,
        markers: &["apiVersion:", "services:", "spring:", "jobs:", "openapi:"],
    },
    Row {
        name: "toml",
        aliases: &[],
        extensions: &["toml"],
        directory: "",
        naming: NamingRule::TomlManifest,
        markers: &["[package]", "[dependencies]", "[project]", "[tool."],
    },
    Row {
        name: "json",
        aliases: &["jsonc"],
        extensions: &["json"],
        directory: "",
        naming: NamingRule::JsonDocument,
        markers: &["^{", "^["],
    },
    Row {
        name: "properties",
        aliases: &["props", "ini"],
        extensions: &["properties"],
        directory: "src/main/resources",
        naming: NamingRule::PropertiesPrefix,
        markers: &[],
    },
    Row {
        name: "markdown",
        aliases: &["md"],
        extensions: &["md", "markdown"],
        directory: "docs",
        naming: NamingRule::MarkdownReadme,
        markers: &["^# "],
    },
    Row {
        name: "cpp",
        aliases: &["c++", "cc", "cxx", "hpp"],
        extensions: &["cpp", "hpp", "cc"],
        directory: "src",
        naming: NamingRule::Counter,
        markers: &["#include <iostream>", "#include <vector>", "#include <string>", "using namespace std"],
    },
    Row {
        name: "c",
        aliases: &["h"],
        extensions: &["c", "h"],
        directory: "src",
        naming: NamingRule::Counter,
        markers: &["#include "],
    },
];

/// Name of the convention used for untagged, unrecognizable content.
pub const PLAIN_TEXT: &str = "text";

impl From<&Row> for LanguageConvention {
    fn from(row: &Row) -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        LanguageConvention {
            name: row.name.to_string(),
            aliases: owned(row.aliases),
            extensions: owned(row.extensions),
            directory: row.directory.to_string(),
            naming: row.naming,
            markers: owned(row.markers),
        }
    }
}

fn plain_text_convention() -> LanguageConvention {
    LanguageConvention {
        name: PLAIN_TEXT.to_string(),
        aliases: vec!["plaintext".to_string(), "plain".to_string(), "txt".to_string()],
        extensions: vec!["txt".to_string()],
        directory: format!("other/{}", PLAIN_TEXT),
        naming: NamingRule::Counter,
        markers: Vec::new(),
    }
}

/// Ordered set of language conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTable {
    conventions: Vec<LanguageConvention>,
    plain_text: LanguageConvention,
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageTable {
    pub fn builtin() -> Self {
        Self {
            conventions: BUILTIN.iter().map(LanguageConvention::from).collect(),
            plain_text: plain_text_convention(),
        }
    }

    /// Replaces built-in rows that share a name with an override; new
    /// languages go ahead of the built-ins so their markers win detection.
    pub fn with_overrides(mut self, overrides: Vec<LanguageConvention>) -> Self {
        let mut insert_at = 0;
        for convention in overrides {
            if convention.name == PLAIN_TEXT {
                self.plain_text = convention;
                continue;
            }
            match self.conventions.iter().position(|c| c.name == convention.name) {
                Some(idx) => self.conventions[idx] = convention,
                None => {
                    self.conventions.insert(insert_at, convention);
                    insert_at += 1;
                }
            }
        }
        self
    }

    fn all(&self) -> impl Iterator<Item = &LanguageConvention> {
        self.conventions.iter().chain(std::iter::once(&self.plain_text))
    }

    /// Finds the convention for a language tag (`Java`, `language-js`, `py`).
    pub fn lookup(&self, language: &str) -> Option<&LanguageConvention> {
        let key = language.trim().to_ascii_lowercase();
        let key = key.strip_prefix("language-").unwrap_or(&key);
        self.all().find(|c| c.answers_to(key))
    }

    pub fn by_extension(&self, extension: &str) -> Option<&LanguageConvention> {
        self.all().find(|c| c.has_extension(extension))
    }

    /// First convention whose markers appear in `content`.
    pub fn detect(&self, content: &str) -> Option<&LanguageConvention> {
        self.conventions.iter().find(|c| c.detects(content))
    }

    pub fn plain_text(&self) -> &LanguageConvention {
        &self.plain_text
    }

    pub fn knows_extension(&self, extension: &str) -> bool {
        self.by_extension(extension).is_some()
    }

    pub fn conventions(&self) -> &[LanguageConvention] {
        &self.conventions
    }
}
