pub mod patterns;
mod code_block;
mod language;
mod path_tree;
mod resolved_file;

pub use code_block::CodeBlock;
pub use language::{
    InferredName, LanguageConvention, LanguageTable, Location, NamingRule, PLAIN_TEXT,
};
pub use path_tree::{PathTree, PathTreeNode};
pub use resolved_file::{
    ExclusionReason, HintKind, PathOrigin, Resolution, ResolvedFile,
};
