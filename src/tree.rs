//! The in-memory tree model.
//!
//! A [`Node`] is either a file or a directory; a directory owns its
//! children exclusively, so freeing a subtree is just a recursive drop —
//! no back-references from child to parent are needed, since parent
//! context (the accumulating relative path) travels down the recursion
//! instead of being stored on each node.

use std::path::PathBuf;

/// An identifier assigned by the formatter (`ROOT`, `D001`, `F002`, ...).
/// Empty until the formatter runs.
pub type LlmId = String;

/// A single entry in the tree: a file's bytes, or a directory's children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(FileNode),
    Directory(DirNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub relative_path: PathBuf,
    pub last_modified: u64,
    pub llm_id: LlmId,
    pub content_size: u64,
    pub content_offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirNode {
    pub relative_path: PathBuf,
    pub last_modified: u64,
    pub llm_id: LlmId,
    pub children: Vec<Node>,
}

impl Node {
    pub fn relative_path(&self) -> &std::path::Path {
        match self {
            Node::File(f) => &f.relative_path,
            Node::Directory(d) => &d.relative_path,
        }
    }

    pub fn last_modified(&self) -> u64 {
        match self {
            Node::File(f) => f.last_modified,
            Node::Directory(d) => d.last_modified,
        }
    }

    pub fn llm_id(&self) -> &str {
        match self {
            Node::File(f) => &f.llm_id,
            Node::Directory(d) => &d.llm_id,
        }
    }

    pub fn set_llm_id(&mut self, id: impl Into<LlmId>) {
        match self {
            Node::File(f) => f.llm_id = id.into(),
            Node::Directory(d) => d.llm_id = id.into(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn as_dir(&self) -> Option<&DirNode> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }

    /// Visits this node and every descendant, in pre-order: a node is
    /// visited before its children, and children are visited in the order
    /// the walker produced them. This is the order the archive format and
    /// the manifest formatter both rely on.
    pub fn walk_pre_order<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        if let Node::Directory(dir) = self {
            for child in &dir.children {
                child.walk_pre_order(f);
            }
        }
    }
}

impl DirNode {
    pub fn empty_root() -> DirNode {
        DirNode {
            relative_path: PathBuf::new(),
            last_modified: 0,
            llm_id: String::new(),
            children: Vec::new(),
        }
    }
}
