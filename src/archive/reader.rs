use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::{MAX_PATH_LEN, NODE_TYPE_DIRECTORY, NODE_TYPE_FILE, SIGNATURE};
use crate::error::{Error, Result};
use crate::tree::{DirNode, FileNode, Node};

/// A parsed archive: its reconstructed tree, plus the byte offset at
/// which the data section begins (needed for random-access content
/// reads, since `node.content_offset` is relative to that point, not to
/// the start of the file).
#[derive(Debug)]
pub struct Archive {
    pub tree: Node,
    pub data_section_start: u64,
    pub path: PathBuf,
}

/// Parses `path` as a `.dircontxt` archive: verifies the signature, then
/// recursively parses node records in the same pre-order the writer
/// emits them.
pub fn read_archive(path: &Path) -> Result<Archive> {
    let mut file = File::open(path).map_err(|err| Error::io(path, err))?;

    let mut sig = [0u8; 8];
    read_exact(&mut file, &mut sig, path)?;
    if &sig != SIGNATURE {
        return Err(Error::format(path, "bad signature"));
    }

    let tree = parse_node(&mut file, path)?;
    let data_section_start = file
        .stream_position()
        .map_err(|err| Error::io(path, err))?;

    Ok(Archive { tree, data_section_start, path: path.to_path_buf() })
}

fn parse_node(r: &mut File, path: &Path) -> Result<Node> {
    let node_type = read_u8(r, path)?;
    let path_len = read_u16(r, path)? as usize;
    if path_len > MAX_PATH_LEN {
        return Err(Error::format(path, format!("path length {} exceeds {}", path_len, MAX_PATH_LEN)));
    }
    let mut path_bytes = vec![0u8; path_len];
    read_exact(r, &mut path_bytes, path)?;
    let relative_path = PathBuf::from(String::from_utf8_lossy(&path_bytes).into_owned());
    let last_modified = read_u64(r, path)?;

    match node_type {
        NODE_TYPE_FILE => {
            let content_offset = read_u64(r, path)?;
            let content_size = read_u64(r, path)?;
            Ok(Node::File(FileNode {
                relative_path,
                last_modified,
                llm_id: String::new(),
                content_size,
                content_offset,
            }))
        }
        NODE_TYPE_DIRECTORY => {
            let child_count = read_u32(r, path)?;
            let mut children = Vec::with_capacity(child_count as usize);
            for _ in 0..child_count {
                children.push(parse_node(r, path)?);
            }
            Ok(Node::Directory(DirNode {
                relative_path,
                last_modified,
                llm_id: String::new(),
                children,
            }))
        }
        other => Err(Error::format(path, format!("unknown node type {}", other))),
    }
}

/// Reads a single file node's content out of the archive at `archive_path`,
/// given the data section's start offset. Reopens the archive for each
/// call so that a seek and read never race against another call's cursor.
pub fn read_file_content(archive_path: &Path, data_section_start: u64, node: &FileNode) -> Result<Vec<u8>> {
    let mut file = File::open(archive_path).map_err(|err| Error::io(archive_path, err))?;
    file.seek(SeekFrom::Start(data_section_start + node.content_offset))
        .map_err(|err| Error::io(archive_path, err))?;
    let mut buf = vec![0u8; node.content_size as usize];
    read_exact(&mut file, &mut buf, archive_path)?;
    Ok(buf)
}

/// Reads at most `max_bytes` from the start of a file node's content,
/// used by the formatter's binary-sniffing heuristic so it
/// doesn't have to pull an entire large file into memory just to classify
/// it.
pub fn read_file_prefix(archive_path: &Path, data_section_start: u64, node: &FileNode, max_bytes: usize) -> Result<Vec<u8>> {
    let mut file = File::open(archive_path).map_err(|err| Error::io(archive_path, err))?;
    file.seek(SeekFrom::Start(data_section_start + node.content_offset))
        .map_err(|err| Error::io(archive_path, err))?;
    let len = (node.content_size as usize).min(max_bytes);
    let mut buf = vec![0u8; len];
    read_exact(&mut file, &mut buf, archive_path)?;
    Ok(buf)
}

fn read_exact(r: &mut File, buf: &mut [u8], path: &Path) -> Result<()> {
    r.read_exact(buf).map_err(|err| Error::format(path, format!("short read: {}", err)))
}

fn read_u8(r: &mut File, path: &Path) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact(r, &mut buf, path)?;
    Ok(buf[0])
}

fn read_u16(r: &mut File, path: &Path) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(r, &mut buf, path)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(r: &mut File, path: &Path) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf, path)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut File, path: &Path) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf, path)?;
    Ok(u64::from_le_bytes(buf))
}
