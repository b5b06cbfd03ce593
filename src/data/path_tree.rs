//! In-memory form of a manifest: directories as inner nodes, files as leaves.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTreeNode {
    /// Children in the order the manifest declared them.
    Directory(Vec<(String, PathTreeNode)>),
    File,
}

impl PathTreeNode {
    pub fn new_directory() -> Self {
        PathTreeNode::Directory(Vec::new())
    }

    pub fn is_file(&self) -> bool {
        matches!(self, PathTreeNode::File)
    }

    /// Returns the directory at `segments`, creating missing directories on
    /// the way. Returns `None` when a file already occupies one of the names.
    pub fn ensure_directory(&mut self, segments: &[String]) -> Option<&mut PathTreeNode> {
        let mut node = self;
        for segment in segments {
            let PathTreeNode::Directory(children) = node else {
                return None;
            };
            let idx = match children.iter().position(|(name, _)| name == segment) {
                Some(idx) => idx,
                None => {
                    children.push((segment.clone(), PathTreeNode::new_directory()));
                    children.len() - 1
                }
            };
            node = &mut children[idx].1;
        }
        if node.is_file() { None } else { Some(node) }
    }

    /// Adds a file leaf `name` inside the directory at `dir_segments`.
    /// Returns false when the leaf could not be placed or already existed.
    pub fn add_file(&mut self, dir_segments: &[String], name: &str) -> bool {
        let Some(PathTreeNode::Directory(children)) = self.ensure_directory(dir_segments) else {
            return false;
        };
        if children.iter().any(|(existing, _)| existing == name) {
            return false;
        }
        children.push((name.to_string(), PathTreeNode::File));
        true
    }

    fn collect_leaves(&self, prefix: &str, out: &mut Vec<String>) {
        if let PathTreeNode::Directory(children) = self {
            for (name, child) in children {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", prefix, name)
                };
                match child {
                    PathTreeNode::File => out.push(path),
                    PathTreeNode::Directory(_) => child.collect_leaves(&path, out),
                }
            }
        }
    }

    fn has_directory_child(&self) -> bool {
        match self {
            PathTreeNode::Directory(children) => {
                children.iter().any(|(_, child)| !child.is_file())
            }
            PathTreeNode::File => false,
        }
    }

    fn render_children(&self, indent: &str, out: &mut Vec<String>) {
        let PathTreeNode::Directory(children) = self else {
            return;
        };
        for (i, (name, child)) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            let branch = if last { "└── " } else { "├── " };
            let suffix = if child.is_file() { "" } else { "/" };
            out.push(format!("{}{}{}{}", indent, branch, name, suffix));
            let next_indent = format!("{}{}", indent, if last { "    " } else { "│   " });
            child.render_children(&next_indent, out);
        }
    }
}

impl Serialize for PathTreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathTreeNode::File => serializer.serialize_unit(),
            PathTreeNode::Directory(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (name, child) in children {
                    map.serialize_entry(name, child)?;
                }
                map.end()
            }
        }
    }
}

/// A parsed manifest. When `root` is set, every leaf path starts with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTree {
    pub root: Option<String>,
    pub entries: PathTreeNode,
}

impl PathTree {
    pub fn new(root: Option<String>) -> Self {
        Self {
            root,
            entries: PathTreeNode::new_directory(),
        }
    }

    /// Full relative paths of every file leaf, in manifest order.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.entries
            .collect_leaves(self.root.as_deref().unwrap_or(""), &mut out);
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_paths().len()
    }

    pub fn has_leaves(&self) -> bool {
        self.leaf_count() > 0
    }

    /// True when at least one directory sits below the root.
    pub fn is_nested(&self) -> bool {
        self.root.is_some() || self.entries.has_directory_child()
    }

    /// Renders the tree the way `tree(1)` would.
    pub fn render(&self) -> String {
        let mut lines = vec![match &self.root {
            Some(root) => format!("{}/", root),
            None => ".".to_string(),
        }];
        self.entries.render_children("", &mut lines);
        lines.join("\n")
    }
}

impl Serialize for PathTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.root {
            Some(root) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(root, &self.entries)?;
                map.end()
            }
            None => self.entries.serialize(serializer),
        }
    }
}
