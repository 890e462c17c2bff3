use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use super::{NODE_TYPE_DIRECTORY, NODE_TYPE_FILE, SIGNATURE};
use crate::error::{Error, Result};
use crate::tree::Node;

/// Writes `tree` (rooted at `root_abs` on disk) to `output` as a
/// `.dircontxt` archive, annotating every file node's `content_offset`
/// and `content_size` in place as pass 1 streams its bytes.
///
/// Pass 1 (data collection) runs before pass 2 (header serialization) so
/// that every file's offset is known by the time its record is written;
/// both passes use their own scratch file so neither has to hold the
/// whole archive in memory.
pub fn write_archive(tree: &mut Node, root_abs: &Path, output: &Path) -> Result<()> {
    let mut data_stream = tempfile::tempfile()
        .map_err(|err| Error::fatal(format!("cannot create scratch file: {}", err)))?;
    let mut running_total: u64 = 0;
    collect_data(tree, root_abs, &mut data_stream, &mut running_total)?;

    let mut header_stream = tempfile::tempfile()
        .map_err(|err| Error::fatal(format!("cannot create scratch file: {}", err)))?;
    write_header(tree, &mut header_stream, output)?;

    let result = assemble(output, &mut header_stream, &mut data_stream);
    if result.is_err() {
        let _ = fs::remove_file(output);
    }
    result
}

fn assemble(output: &Path, header_stream: &mut File, data_stream: &mut File) -> Result<()> {
    let mut out = File::create(output).map_err(|err| Error::io(output, err))?;
    out.write_all(SIGNATURE).map_err(|err| Error::io(output, err))?;

    header_stream.seek(SeekFrom::Start(0)).map_err(|err| Error::io(output, err))?;
    io::copy(header_stream, &mut out).map_err(|err| Error::io(output, err))?;

    data_stream.seek(SeekFrom::Start(0)).map_err(|err| Error::io(output, err))?;
    io::copy(data_stream, &mut out).map_err(|err| Error::io(output, err))?;

    out.flush().map_err(|err| Error::io(output, err))?;
    Ok(())
}

/// Pass 1: pre-order walk streaming every file's bytes into `data_stream`,
/// recording the offset/size it ends up at. A file that can't be opened
/// is kept in the tree with `content_size = 0` (and no advance of
/// `running_total`) and a logged warning.
fn collect_data(node: &mut Node, root_abs: &Path, data_stream: &mut File, running_total: &mut u64) -> Result<()> {
    match node {
        Node::File(file) => {
            let source_path = root_abs.join(&file.relative_path);
            match File::open(&source_path) {
                Ok(mut source) => {
                    file.content_offset = *running_total;
                    let written = io::copy(&mut source, data_stream)
                        .map_err(|err| Error::io(&source_path, err))?;
                    file.content_size = written;
                    *running_total += written;
                }
                Err(err) => {
                    log::warn!("{}: {}", source_path.display(), err);
                    file.content_offset = *running_total;
                    file.content_size = 0;
                }
            }
            Ok(())
        }
        Node::Directory(dir) => {
            for child in &mut dir.children {
                collect_data(child, root_abs, data_stream, running_total)?;
            }
            Ok(())
        }
    }
}

/// Pass 2: pre-order walk writing each node's metadata record to
/// `header_stream`, mirroring the field order `parse_node` reads back.
fn write_header(node: &Node, header_stream: &mut File, output: &Path) -> Result<()> {
    let err = |e: io::Error| Error::io(output, e);

    let path_bytes = node.relative_path().to_string_lossy().into_owned().into_bytes();
    let path_len: u16 = path_bytes
        .len()
        .try_into()
        .map_err(|_| Error::fatal(format!("{}: path too long to encode", node.relative_path().display())))?;

    match node {
        Node::File(file) => {
            header_stream.write_all(&[NODE_TYPE_FILE]).map_err(err)?;
            header_stream.write_all(&path_len.to_le_bytes()).map_err(err)?;
            header_stream.write_all(&path_bytes).map_err(err)?;
            header_stream.write_all(&file.last_modified.to_le_bytes()).map_err(err)?;
            header_stream.write_all(&file.content_offset.to_le_bytes()).map_err(err)?;
            header_stream.write_all(&file.content_size.to_le_bytes()).map_err(err)?;
            Ok(())
        }
        Node::Directory(dir) => {
            header_stream.write_all(&[NODE_TYPE_DIRECTORY]).map_err(err)?;
            header_stream.write_all(&path_len.to_le_bytes()).map_err(err)?;
            header_stream.write_all(&path_bytes).map_err(err)?;
            header_stream.write_all(&dir.last_modified.to_le_bytes()).map_err(err)?;
            let child_count: u32 = dir
                .children
                .len()
                .try_into()
                .map_err(|_| Error::fatal(format!("{}: too many children to encode", dir.relative_path.display())))?;
            header_stream.write_all(&child_count.to_le_bytes()).map_err(err)?;
            for child in &dir.children {
                write_header(child, header_stream, output)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::read_archive;
    use std::fs;

    #[test]
    fn writes_and_reads_back_a_small_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("proj");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.txt"), b"hi").unwrap();
        fs::create_dir(root.join("b")).unwrap();

        let ignores = crate::ignore::IgnoreSet::new();
        let mut tree = crate::walk::walk(&root, &ignores).unwrap();

        let archive_path = tmp.path().join("proj.dircontxt");
        write_archive(&mut tree, &root, &archive_path).unwrap();

        let archive = read_archive(&archive_path).unwrap();
        let dir = archive.tree.as_dir().unwrap();
        assert_eq!(dir.children.len(), 2);
        let a = dir.children.iter().find(|n| n.relative_path().ends_with("a.txt")).unwrap();
        assert_eq!(a.as_file().unwrap().content_size, 2);
    }

    #[test]
    fn two_runs_on_unchanged_tree_produce_identical_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("proj");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.txt"), b"hi").unwrap();

        let ignores = crate::ignore::IgnoreSet::new();
        let archive_path = tmp.path().join("proj.dircontxt");

        let mut tree1 = crate::walk::walk(&root, &ignores).unwrap();
        write_archive(&mut tree1, &root, &archive_path).unwrap();
        let bytes1 = fs::read(&archive_path).unwrap();

        let mut tree2 = crate::walk::walk(&root, &ignores).unwrap();
        write_archive(&mut tree2, &root, &archive_path).unwrap();
        let bytes2 = fs::read(&archive_path).unwrap();

        assert_eq!(bytes1, bytes2);
    }
}
