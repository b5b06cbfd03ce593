use serde::Serialize;
use std::fmt;

/// Which context-hint strategy produced a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Breadcrumb,
    QualifiedPath,
    CommentMarker,
    Heading,
    Phrase,
    FenceHeader,
    BareName,
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            HintKind::Breadcrumb => "breadcrumb",
            HintKind::QualifiedPath => "qualified path",
            HintKind::CommentMarker => "comment marker",
            HintKind::Heading => "heading",
            HintKind::Phrase => "phrase",
            HintKind::FenceHeader => "fence header",
            HintKind::BareName => "bare name",
        };
        write!(f, "{}", label)
    }
}

/// Resolver tier that decided a file's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathOrigin {
    /// Explicit path taken from the text around the block.
    ContextHint(HintKind),
    /// Leaf of the manifest carried by the chat turn.
    Manifest,
    /// Leaf of the configured default tree.
    DefaultTree,
    /// Name inferred from the code itself.
    Inferred,
    /// `snippet_<n>` counter name.
    Fallback,
}

impl fmt::Display for PathOrigin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathOrigin::ContextHint(kind) => write!(f, "hint ({})", kind),
            PathOrigin::Manifest => write!(f, "manifest"),
            PathOrigin::DefaultTree => write!(f, "default tree"),
            PathOrigin::Inferred => write!(f, "inferred"),
            PathOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// A `(path, content)` pair ready for the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
    /// Forward-slash relative path.
    pub path: String,
    pub content: String,
    pub origin: PathOrigin,
    /// Position of the source block in scan order, 0-based.
    pub block_index: usize,
}

/// Why a scanned block did not make it into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The block is the manifest itself.
    ManifestBlock,
    /// Nothing but whitespace.
    EmptyContent,
    /// A manifest exists and the block matches none of its files.
    NotInManifest,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExclusionReason::ManifestBlock => write!(f, "block is the project manifest"),
            ExclusionReason::EmptyContent => write!(f, "block is empty"),
            ExclusionReason::NotInManifest => write!(f, "block matches no manifest entry"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedFile),
    Excluded(ExclusionReason),
}
