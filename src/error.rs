//! Error kinds shared by every stage of the snapshot pipeline.
//!
//! Config-file and ignore-file line errors never reach this type at all:
//! `config.rs` and `ignore.rs` log and recover inline, one bad line at a
//! time, per spec §7's "Config" kind. What's left to propagate is `Io`
//! (recovered by the caller wherever it's produced), plus `Format` and
//! `Fatal`, which end the run with a non-zero exit code.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// An error produced by some stage of the snapshot pipeline.
#[derive(Debug)]
pub enum Error {
    /// A file or directory operation failed for reasons other than
    /// "not found" on an optional source, or any I/O failure on a
    /// required one.
    Io {
        path: PathBuf,
        err: io::Error,
    },
    /// The archive's on-disk layout didn't match what the reader expects:
    /// bad signature, unknown node type, an oversize path length, or a
    /// short read.
    Format {
        path: PathBuf,
        message: String,
    },
    /// Unrecoverable: the target path couldn't be resolved, or the new
    /// archive couldn't be written.
    Fatal(String),
}

impl Error {
    pub fn io<P: Into<PathBuf>>(path: P, err: io::Error) -> Error {
        Error::Io { path: path.into(), err }
    }

    pub fn format<P: Into<PathBuf>>(path: P, message: impl Into<String>) -> Error {
        Error::Format { path: path.into(), message: message.into() }
    }

    pub fn fatal(message: impl Into<String>) -> Error {
        Error::Fatal(message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => write!(f, "{}: {}", path.display(), err),
            Error::Format { path, message } => {
                write!(f, "{}: malformed archive: {}", path.display(), message)
            }
            Error::Fatal(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { err, .. } => Some(err),
            _ => None,
        }
    }
}
