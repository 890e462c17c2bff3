//! The filesystem walker.
//!
//! Builds a [`Node`] tree directly via recursive `read_dir`, rather than
//! adapting a flat directory-iterator crate: the archive format needs a
//! directory's child count known before its children are serialized,
//! which falls out naturally from recursion but would need buffering to
//! reconstruct from a flat walk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ignore::IgnoreSet;
use crate::pathutil;
use crate::tree::{DirNode, FileNode, Node};

/// Walks `root`, applying `ignores`, and returns the resulting tree rooted
/// at an empty relative path.
///
/// Fails only when `root` itself can't be opened/stat'd or isn't a
/// directory; every other I/O failure on an individual entry is logged
/// and that entry is skipped.
pub fn walk(root: &Path, ignores: &IgnoreSet) -> Result<Node> {
    let root_meta = pathutil::metadata(root).map_err(|err| Error::io(root, err))?;
    if !root_meta.is_dir() {
        return Err(Error::fatal(format!("{}: not a directory", root.display())));
    }

    let mut dir = DirNode {
        relative_path: PathBuf::new(),
        last_modified: pathutil::modified_secs(&root_meta),
        llm_id: String::new(),
        children: Vec::new(),
    };
    walk_into(root, Path::new(""), ignores, &mut dir.children);
    Ok(Node::Directory(dir))
}

/// Populates `children` with every non-ignored entry of `dir_abs`, in the
/// order `read_dir` discovers them, recursing into accepted
/// subdirectories.
fn walk_into(dir_abs: &Path, dir_rel: &Path, ignores: &IgnoreSet, children: &mut Vec<Node>) {
    let entries = match fs::read_dir(dir_abs) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("{}: {}", dir_abs.display(), err);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("{}: {}", dir_abs.display(), err);
                continue;
            }
        };

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == "." || name == ".." {
            continue;
        }

        let abs = entry.path();
        let meta = match pathutil::metadata(&abs) {
            Ok(meta) => meta,
            Err(err) => {
                log::warn!("{}: {}", abs.display(), err);
                continue;
            }
        };
        let is_dir = meta.is_dir();
        if !is_dir && !meta.is_file() {
            // Non-regular, non-directory (devices, sockets, ...): dropped.
            continue;
        }

        let rel = dir_rel.join(name.as_ref());
        if rel.as_os_str().len() > crate::archive::MAX_PATH_LEN {
            log::warn!("{}: path exceeds {} bytes, dropped", rel.display(), crate::archive::MAX_PATH_LEN);
            continue;
        }
        // The ignore engine matches PREFIX patterns against this string, not
        // against the stored relative_path, so a directory gets its trailing
        // separator appended here only — a rule like "build/*" must see
        // "build/" itself, not just its children, or the directory entry
        // would slip through unpruned with its children excluded underneath
        // it instead of the whole subtree being absent.
        let ignore_check_path = if is_dir {
            let mut s = rel.as_os_str().to_os_string();
            s.push(std::path::MAIN_SEPARATOR.to_string());
            PathBuf::from(s)
        } else {
            rel.clone()
        };
        if ignores.is_ignored(&ignore_check_path, &name, is_dir) {
            log::debug!("{}: ignored", rel.display());
            continue;
        }

        let last_modified = pathutil::modified_secs(&meta);
        if is_dir {
            let mut node = DirNode {
                relative_path: rel.clone(),
                last_modified,
                llm_id: String::new(),
                children: Vec::new(),
            };
            walk_into(&abs, &rel, ignores, &mut node.children);
            children.push(Node::Directory(node));
        } else {
            children.push(Node::File(FileNode {
                relative_path: rel,
                last_modified,
                llm_id: String::new(),
                content_size: meta.len(),
                content_offset: 0,
            }));
        }
    }
}
