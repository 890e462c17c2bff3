//! The binary archive codec.
//!
//! A `.dircontxt` file is an 8-byte signature, a header section of
//! pre-order node records, then a data section of concatenated file
//! bytes. The writer is two-pass (data bytes are streamed to a scratch
//! file before any offset is known, then the header is written once every
//! node has its offset/size); the reader parses the header in one pass
//! and returns the data section's start offset for later random-access
//! reads.

mod reader;
mod writer;

pub use reader::{read_archive, read_file_content, read_file_prefix, Archive};
pub use writer::write_archive;

/// The archive's fixed 8-byte signature. No null terminator on disk.
pub const SIGNATURE: &[u8; 8] = b"DIRCTXTV";

/// The maximum path length a single node record may declare, matching
/// POSIX's `PATH_MAX`. The reader rejects any record exceeding this; the
/// walker's policy for oversize live paths is to drop the entry with a
/// warning (see `crate::walk`).
pub const MAX_PATH_LEN: usize = 4096;

const NODE_TYPE_FILE: u8 = 0;
const NODE_TYPE_DIRECTORY: u8 = 1;
