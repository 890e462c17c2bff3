//! The tree differ, plus its content-verification false-positive
//! suppression pass.
//!
//! Structural comparison pairs children by relative path within each
//! directory and is blind to file *content* — two files of the same size
//! and timestamp are assumed unmodified, and two of differing size or
//! timestamp are assumed modified. The verification pass then reads both
//! candidates' actual bytes for same-size "modified" files and drops any
//! that come back identical, catching no-op touches.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::error::Result;
use crate::tree::{FileNode, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub kind: ChangeKind,
    pub relative_path: PathBuf,
    pub is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffReport {
    pub has_changes: bool,
    pub entries: Vec<DiffEntry>,
}

impl DiffReport {
    fn new(entries: Vec<DiffEntry>) -> DiffReport {
        DiffReport { has_changes: !entries.is_empty(), entries }
    }
}

/// The structural pass: compares `old` against `new` (both must be
/// `Node::Directory` roots) and returns every added/removed/modified
/// entry, without yet running content verification.
pub fn diff_trees(old: &Node, new: &Node) -> Vec<DiffEntry> {
    let mut out = Vec::new();
    if let (Some(old_dir), Some(new_dir)) = (old.as_dir(), new.as_dir()) {
        diff_dir(old_dir, new_dir, &mut out);
    }
    out
}

fn diff_dir(old: &crate::tree::DirNode, new: &crate::tree::DirNode, out: &mut Vec<DiffEntry>) {
    let old_by_path: HashMap<&Path, &Node> =
        old.children.iter().map(|c| (c.relative_path(), c)).collect();
    let new_by_path: HashMap<&Path, &Node> =
        new.children.iter().map(|c| (c.relative_path(), c)).collect();

    for new_child in &new.children {
        match old_by_path.get(new_child.relative_path()) {
            None => out.push(DiffEntry {
                kind: ChangeKind::Added,
                relative_path: new_child.relative_path().to_path_buf(),
                is_dir: new_child.is_dir(),
            }),
            Some(old_child) => match (old_child, new_child) {
                (Node::Directory(od), Node::Directory(nd)) => diff_dir(od, nd, out),
                (Node::File(of), Node::File(nf)) => {
                    if of.content_size != nf.content_size || of.last_modified != nf.last_modified {
                        out.push(DiffEntry {
                            kind: ChangeKind::Modified,
                            relative_path: nf.relative_path.clone(),
                            is_dir: false,
                        });
                    }
                }
                _ => out.push(DiffEntry {
                    kind: ChangeKind::Modified,
                    relative_path: new_child.relative_path().to_path_buf(),
                    is_dir: new_child.is_dir(),
                }),
            },
        }
    }

    for old_child in &old.children {
        if !new_by_path.contains_key(old_child.relative_path()) {
            out.push(DiffEntry {
                kind: ChangeKind::Removed,
                relative_path: old_child.relative_path().to_path_buf(),
                is_dir: old_child.is_dir(),
            });
        }
    }
}

/// The content-verification pass: for every `Modified` file entry whose
/// old and new sizes match, reads the prior archive's bytes for that file
/// and the new file's bytes on disk, and drops the entry if they're
/// identical. Must run with the prior archive still on disk and the new
/// file not yet archived over it.
pub fn verify_and_finalize(
    entries: Vec<DiffEntry>,
    old_tree: &Node,
    new_tree: &Node,
    old_archive: &archive::Archive,
    new_root_abs: &Path,
) -> Result<DiffReport> {
    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.kind == ChangeKind::Modified && !entry.is_dir {
            if let (Some(old_file), Some(new_file)) =
                (find_file(old_tree, &entry.relative_path), find_file(new_tree, &entry.relative_path))
            {
                if old_file.content_size == new_file.content_size
                    && contents_match(old_file, new_file, old_archive, new_root_abs)?
                {
                    continue;
                }
            }
        }
        kept.push(entry);
    }
    Ok(DiffReport::new(kept))
}

fn contents_match(
    old_file: &FileNode,
    new_file: &FileNode,
    old_archive: &archive::Archive,
    new_root_abs: &Path,
) -> Result<bool> {
    let old_bytes =
        archive::read_file_content(&old_archive.path, old_archive.data_section_start, old_file)?;
    let new_path = new_root_abs.join(&new_file.relative_path);
    let new_bytes = match fs::read(&new_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("{}: {}", new_path.display(), err);
            return Ok(false);
        }
    };
    Ok(old_bytes == new_bytes)
}

fn find_file<'a>(root: &'a Node, relative_path: &Path) -> Option<&'a FileNode> {
    let mut found = None;
    root.walk_pre_order(&mut |n| {
        if found.is_none() && n.relative_path() == relative_path {
            found = n.as_file();
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{DirNode, FileNode};

    fn file(path: &str, size: u64, mtime: u64) -> Node {
        Node::File(FileNode {
            relative_path: PathBuf::from(path),
            last_modified: mtime,
            llm_id: String::new(),
            content_size: size,
            content_offset: 0,
        })
    }

    fn dir(path: &str, children: Vec<Node>) -> Node {
        Node::Directory(DirNode {
            relative_path: PathBuf::from(path),
            last_modified: 0,
            llm_id: String::new(),
            children,
        })
    }

    #[test]
    fn identical_trees_have_no_changes() {
        let tree = dir("", vec![file("a.txt", 2, 10)]);
        let entries = diff_trees(&tree, &tree);
        assert!(entries.is_empty());
    }

    #[test]
    fn detects_added_removed_and_modified() {
        let old = dir("", vec![file("a.txt", 2, 10), file("b.txt", 3, 10)]);
        let new = dir("", vec![file("a.txt", 5, 20), file("c.txt", 1, 30)]);
        let mut entries = diff_trees(&old, &new);
        entries.sort_by_key(|e| e.relative_path.clone());

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].relative_path, PathBuf::from("a.txt"));
        assert_eq!(entries[0].kind, ChangeKind::Modified);
        assert_eq!(entries[1].relative_path, PathBuf::from("b.txt"));
        assert_eq!(entries[1].kind, ChangeKind::Removed);
        assert_eq!(entries[2].relative_path, PathBuf::from("c.txt"));
        assert_eq!(entries[2].kind, ChangeKind::Added);
    }

    #[test]
    fn type_change_counts_as_modified() {
        let old = dir("", vec![file("x", 1, 1)]);
        let new = dir("", vec![dir("x", vec![])]);
        let entries = diff_trees(&old, &new);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn unchanged_directory_does_not_yield_modified_itself() {
        let old = dir("", vec![dir("sub", vec![file("sub/a.txt", 1, 1)])]);
        let new = dir("", vec![dir("sub", vec![file("sub/a.txt", 1, 1)])]);
        assert!(diff_trees(&old, &new).is_empty());
    }
}
