//! Sequences a single snapshot run.
//!
//! Ordering matters here more than anywhere else in the crate: the differ
//! must read the prior archive's bytes before the new archive overwrites
//! it, and the version token must only advance when real changes survive
//! content verification.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{self, Archive};
use crate::config::{Config, OutputMode};
use crate::differ::{self, DiffReport};
use crate::error::{Error, Result};
use crate::format;
use crate::ignore::IgnoreSet;
use crate::pathutil;
use crate::tree::Node;
use crate::version::Version;
use crate::walk;

/// What a run produced, handed back to `main` for exit-code translation
/// and optional clipboard handling.
pub struct Outcome {
    pub archive_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub diff_path: Option<PathBuf>,
    pub manifest_text: String,
    pub has_changes: bool,
}

/// Runs the full pipeline against `root` (already resolved to an absolute
/// path) using `config`.
pub fn run(root: &Path, config: &Config) -> Result<Outcome> {
    let basename = pathutil::basename(root);
    let parent = root.parent().unwrap_or(root).to_path_buf();

    let archive_path = artifact_path(&parent, &basename, "dircontxt");
    let manifest_path = artifact_path(&parent, &basename, "llmcontext.txt");

    let prior_exists = archive_path.exists() && manifest_path.exists();
    log::info!(
        "{}: entering {} mode",
        root.display(),
        if prior_exists { "update" } else { "fresh" }
    );

    let home = std::env::var("HOME").ok().map(PathBuf::from);
    let ignores = IgnoreSet::load(root, home.as_deref(), &basename);
    let mut new_tree = walk::walk(root, &ignores)?;

    let (old_version, old_archive, report) = if prior_exists {
        let old_version = read_manifest_version(&manifest_path).unwrap_or(Version::V1);
        let old_archive = archive::read_archive(&archive_path)?;
        let structural = differ::diff_trees(&old_archive.tree, &new_tree);
        let report = differ::verify_and_finalize(structural, &old_archive.tree, &new_tree, &old_archive, root)?;
        (old_version, Some(old_archive), report)
    } else {
        (Version::V1, None, DiffReport::default())
    };

    let new_version = match (&old_archive, report.has_changes) {
        (None, _) => Version::V1,
        (Some(_), true) => old_version.increment(),
        (Some(_), false) => old_version,
    };

    let diff_path = artifact_path(&parent, &basename, &format!("llmcontext-{}-diff.txt", new_version));

    archive::write_archive(&mut new_tree, root, &archive_path)?;
    log::info!("{}: wrote archive at version {}", archive_path.display(), new_version);

    format::assign_ids(&mut new_tree);
    let new_archive = archive::read_archive(&archive_path)?;

    let mut diff_written = None;
    if old_archive.is_some() && report.has_changes {
        let text = format::render_diff(old_version, new_version, &report.entries, &new_tree, &new_archive)?;
        fs::write(&diff_path, text).map_err(|err| Error::io(&diff_path, err))?;
        diff_written = Some(diff_path.clone());
        log::info!("{}: wrote diff", diff_path.display());
    }

    let manifest_text = format::render_manifest(&new_tree, new_version, &new_archive)?;
    let manifest_written = match config.output_mode {
        OutputMode::BinaryOnly => {
            remove_if_present(&manifest_path);
            remove_if_present(&diff_path);
            diff_written = None;
            None
        }
        OutputMode::Both | OutputMode::TextOnly => {
            fs::write(&manifest_path, &manifest_text).map_err(|err| Error::io(&manifest_path, err))?;
            Some(manifest_path.clone())
        }
    };

    Ok(Outcome {
        archive_path,
        manifest_path: manifest_written,
        diff_path: diff_written,
        manifest_text,
        has_changes: report.has_changes,
    })
}

fn artifact_path(parent: &Path, basename: &str, suffix: &str) -> PathBuf {
    parent.join(format!("{}.{}", basename, suffix))
}

fn read_manifest_version(manifest_path: &Path) -> Option<Version> {
    let content = fs::read_to_string(manifest_path).ok()?;
    let first_line = content.lines().next()?;
    Version::from_manifest_prelude(first_line)
}

fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => log::warn!("{}: {}", path.display(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup(tmp: &Path) -> PathBuf {
        let root = tmp.join("proj");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.txt"), b"hi").unwrap();
        root
    }

    #[test]
    fn fresh_run_writes_archive_and_manifest_at_v1() {
        let tmp = tempfile::tempdir().unwrap();
        let root = setup(tmp.path());
        let config = Config::default();

        let outcome = run(&root, &config).unwrap();
        assert!(outcome.archive_path.exists());
        assert!(outcome.manifest_path.unwrap().exists());
        assert!(outcome.diff_path.is_none());
        assert!(outcome.manifest_text.starts_with("[DIRCONTXT_LLM_SNAPSHOT_V1]"));
    }

    #[test]
    fn unchanged_rerun_keeps_version_and_writes_no_diff() {
        let tmp = tempfile::tempdir().unwrap();
        let root = setup(tmp.path());
        let config = Config::default();

        run(&root, &config).unwrap();
        let outcome = run(&root, &config).unwrap();

        assert!(outcome.diff_path.is_none());
        assert!(outcome.manifest_text.starts_with("[DIRCONTXT_LLM_SNAPSHOT_V1]"));
        assert!(!outcome.has_changes);
    }

    #[test]
    fn content_change_advances_version_and_writes_diff() {
        let tmp = tempfile::tempdir().unwrap();
        let root = setup(tmp.path());
        let config = Config::default();

        run(&root, &config).unwrap();
        fs::write(root.join("a.txt"), b"hello there").unwrap();
        let outcome = run(&root, &config).unwrap();

        assert!(outcome.manifest_text.starts_with("[DIRCONTXT_LLM_SNAPSHOT_V1.1]"));
        let diff_path = outcome.diff_path.unwrap();
        let diff_text = fs::read_to_string(&diff_path).unwrap();
        assert!(diff_text.contains("[MODIFIED] a.txt"));
    }

    #[test]
    fn binary_only_mode_removes_stale_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let root = setup(tmp.path());
        run(&root, &Config::default()).unwrap();

        let binary_only = Config { output_mode: OutputMode::BinaryOnly };
        fs::write(root.join("a.txt"), b"changed!!").unwrap();
        let outcome = run(&root, &binary_only).unwrap();

        assert!(outcome.manifest_path.is_none());
        assert!(!outcome.archive_path.parent().unwrap().join(format!(
            "{}.llmcontext.txt",
            pathutil::basename(&root)
        )).exists());
    }
}
