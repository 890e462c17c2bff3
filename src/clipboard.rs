//! Platform clipboard invocation.
//!
//! No clipboard crate is pulled in; the manifest bytes are piped into
//! whichever platform utility is found on `PATH`, the same way a shell
//! script would do it. This keeps clipboard mode a thin wrapper around
//! the same manifest-generation path used for a normal run.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

#[cfg(target_os = "macos")]
const CANDIDATES: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const CANDIDATES: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CANDIDATES: &[(&str, &[&str])] =
    &[("wl-copy", &[]), ("xclip", &["-selection", "clipboard"]), ("xsel", &["--clipboard", "--input"])];

/// Writes `bytes` to the system clipboard via the first available
/// platform utility. Fails with `Error::Fatal` if none of them can be
/// spawned.
pub fn copy(bytes: &[u8]) -> Result<()> {
    for (program, args) in CANDIDATES {
        match spawn_and_feed(program, args, bytes) {
            Ok(()) => return Ok(()),
            Err(err) => log::debug!("{}: {}", program, err),
        }
    }
    Err(Error::fatal(format!(
        "no clipboard utility found (tried: {})",
        CANDIDATES.iter().map(|(p, _)| *p).collect::<Vec<_>>().join(", ")
    )))
}

fn spawn_and_feed(program: &str, args: &[&str], bytes: &[u8]) -> std::io::Result<()> {
    let mut child = Command::new(program).args(args).stdin(Stdio::piped()).spawn()?;
    child.stdin.take().expect("piped stdin").write_all(bytes)?;
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("{} exited with {}", program, status)))
    }
}
