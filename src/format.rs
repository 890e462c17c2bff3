//! The text manifest and diff formatter.
//!
//! Both artifact shapes share the directory-tree rendering and the
//! per-file content block; the manifest renders every file, the diff
//! renders only added/modified ones.

use std::path::Path;

use crate::archive::{self, Archive};
use crate::differ::{ChangeKind, DiffEntry};
use crate::error::Result;
use crate::tree::{FileNode, Node};
use crate::version::Version;

const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff",
    // audio/video
    "mp3", "wav", "flac", "ogg", "mp4", "mov", "avi", "mkv", "webm",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar",
    // executables/object code
    "exe", "dll", "so", "dylib", "o", "obj", "bin", "class", "wasm",
    // compiled bytecode
    "pyc", "pyo",
    // binary databases
    "db", "sqlite", "sqlite3",
];

const MAX_SNIFF_BYTES: usize = 512;

/// Assigns `ROOT`/`D<NNN>`/`F<NNN>` identifiers to every node in `tree`,
/// in pre-order, sharing one monotonic counter across directories and
/// files. Mutates the tree in place; the IDs are then available to both
/// the tree rendering and the content-block rendering.
pub fn assign_ids(tree: &mut Node) {
    let mut counter = 0u32;
    assign_ids_rec(tree, true, &mut counter);
}

fn assign_ids_rec(node: &mut Node, is_root: bool, counter: &mut u32) {
    if is_root {
        node.set_llm_id("ROOT");
    } else {
        *counter += 1;
        let prefix = if node.is_dir() { "D" } else { "F" };
        node.set_llm_id(format!("{}{:03}", prefix, counter));
    }
    if let Node::Directory(dir) = node {
        for child in &mut dir.children {
            assign_ids_rec(child, false, counter);
        }
    }
}

/// Renders the full manifest for `tree`, whose IDs must already be
/// assigned (see [`assign_ids`]). File content is pulled from `archive`,
/// which must be the archive the tree was just written to.
pub fn render_manifest(tree: &Node, version: Version, archive: &Archive) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("[DIRCONTXT_LLM_SNAPSHOT_{}]\n", version));
    out.push_str(INSTRUCTIONS);
    out.push_str("\n<DIRECTORY_TREE>\n");
    render_tree(tree, &mut out);
    out.push_str("</DIRECTORY_TREE>\n\n");

    tree.walk_pre_order(&mut |node| {
        if let Node::File(file) = node {
            if let Ok(block) = content_block(file, archive) {
                out.push_str(&block);
            }
        }
    });

    Ok(out)
}

/// Renders a diff file: a changes summary, the new tree, then content
/// blocks for every `ADDED`/`MODIFIED` file only.
pub fn render_diff(
    old_version: Version,
    new_version: Version,
    report_entries: &[DiffEntry],
    new_tree: &Node,
    archive: &Archive,
) -> Result<String> {
    let mut out = String::new();
    out.push_str("[DIRCONTXT_LLM_DIFF_V1]\n");
    out.push_str(&format!("Version Change: {} -> {}\n\n", old_version, new_version));

    out.push_str("<CHANGES_SUMMARY>\n");
    for entry in report_entries {
        let tag = match entry.kind {
            ChangeKind::Added => "ADDED",
            ChangeKind::Removed => "REMOVED",
            ChangeKind::Modified => "MODIFIED",
        };
        let suffix = if entry.is_dir { "/" } else { "" };
        out.push_str(&format!("[{}] {}{}\n", tag, display_path(&entry.relative_path), suffix));
    }
    out.push_str("</CHANGES_SUMMARY>\n\n");

    out.push_str("<UPDATED_DIRECTORY_TREE>\n");
    render_tree(new_tree, &mut out);
    out.push_str("</UPDATED_DIRECTORY_TREE>\n\n");

    for entry in report_entries {
        if entry.is_dir || !matches!(entry.kind, ChangeKind::Added | ChangeKind::Modified) {
            continue;
        }
        if let Some(Node::File(file)) = find_node(new_tree, &entry.relative_path) {
            out.push_str(&content_block(file, archive)?);
        }
    }

    Ok(out)
}

const INSTRUCTIONS: &str = "<INSTRUCTIONS>\n\
This file is a snapshot of a directory tree generated for consumption by a \
language model. The directory tree below lists every file and directory \
with a stable identifier and last-modified timestamp; file entries also \
carry a byte size. File contents follow the tree, each delimited by a \
FILE_CONTENT_START/END pair tagged with the same identifier. Binary files \
are represented by a placeholder instead of raw bytes.\n\
</INSTRUCTIONS>\n";

fn render_tree(tree: &Node, out: &mut String) {
    tree.walk_pre_order(&mut |node| {
        out.push_str(&tree_line(node));
    });
}

fn tree_line(node: &Node) -> String {
    match node {
        Node::Directory(dir) => {
            format!("[D] {} (ID:{}, MOD:{})\n", display_path(&dir.relative_path), dir.llm_id, dir.last_modified)
        }
        Node::File(file) => {
            let hint = if has_binary_extension(&file.relative_path) { ", CONTENT:BINARY_HINT" } else { "" };
            format!(
                "[F] {} (ID:{}, MOD:{}, SIZE:{}{})\n",
                display_path(&file.relative_path),
                file.llm_id,
                file.last_modified,
                file.content_size,
                hint
            )
        }
    }
}

fn display_path(path: &Path) -> std::borrow::Cow<str> {
    if path.as_os_str().is_empty() {
        std::borrow::Cow::Borrowed(".")
    } else {
        path.to_string_lossy()
    }
}

fn content_block(file: &FileNode, archive: &Archive) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!(
        "<FILE_CONTENT_START ID=\"{}\" PATH=\"{}\">\n",
        file.llm_id,
        display_path(&file.relative_path)
    ));
    if is_binary(file, archive)? {
        out.push_str(&format!("[BINARY CONTENT PLACEHOLDER - Size: {} bytes]\n", file.content_size));
    } else {
        // Raw bytes, verbatim — no padding. A reader reconstructing a
        // file's contents from the manifest must get back exactly what
        // was on disk, not a copy with a newline tacked on, so nothing is
        // inserted between the bytes and the closing tag below.
        let bytes = archive::read_file_content(&archive.path, archive.data_section_start, file)?;
        out.push_str(&String::from_utf8_lossy(&bytes));
    }
    out.push_str(&format!("</FILE_CONTENT_END ID=\"{}\">\n\n", file.llm_id));
    Ok(out)
}

fn is_binary(file: &FileNode, archive: &Archive) -> Result<bool> {
    if has_binary_extension(&file.relative_path) {
        return Ok(true);
    }
    if file.content_size == 0 {
        return Ok(false);
    }
    let prefix = archive::read_file_prefix(&archive.path, archive.data_section_start, file, MAX_SNIFF_BYTES)?;
    Ok(sniff_binary(&prefix))
}

fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
}

/// A file is content-binary if its probed prefix contains a NUL byte or
/// more than 20% bytes that are neither printable ASCII nor whitespace.
fn sniff_binary(prefix: &[u8]) -> bool {
    if prefix.contains(&0) {
        return true;
    }
    if prefix.is_empty() {
        return false;
    }
    let unprintable = prefix.iter().filter(|&&b| !is_printable_or_whitespace(b)).count();
    unprintable * 5 > prefix.len()
}

fn is_printable_or_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\r') || (0x20..=0x7e).contains(&b)
}

fn find_node<'a>(root: &'a Node, relative_path: &Path) -> Option<&'a Node> {
    let mut found = None;
    root.walk_pre_order(&mut |n| {
        if found.is_none() && n.relative_path() == relative_path {
            found = Some(n);
        }
    });
    found
}
