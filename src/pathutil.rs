//! Platform path and stat helpers.
//!
//! This module is deliberately thin: resolve, stat and basename are the
//! only operations the rest of the crate needs from the filesystem layer,
//! and none of them carry ignore- or tree-specific logic.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Error, Result};

/// Resolves `path` to an absolute path, following symlinks in the path
/// itself (but not changing what the path points at).
pub fn resolve(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|err| {
        Error::fatal(format!("cannot resolve {}: {}", path.display(), err))
    })
}

/// The final path component, as a UTF-8 string. Non-UTF-8 names are
/// replaced with their lossy conversion; this only affects display and
/// ignore matching on the rare platform where a path component isn't
/// valid UTF-8.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The last-modified time of `path`, as seconds since the Unix epoch.
/// A metadata that reports a time before the epoch clamps to zero rather
/// than failing.
pub fn modified_secs(metadata: &fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Stats `path`, following symlinks.
pub fn metadata(path: &Path) -> io::Result<fs::Metadata> {
    fs::metadata(path)
}
