//! Black-box fixture helper for the integration suite: a throwaway
//! directory plus a thin wrapper around invoking the compiled binary
//! against it.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

pub struct WorkDir {
    _tmp: tempfile::TempDir,
    pub root: PathBuf,
}

impl WorkDir {
    pub fn new(name: &str) -> WorkDir {
        let tmp = tempfile::Builder::new().prefix("dctx-test-").tempdir().expect("tempdir");
        let root = tmp.path().join(name);
        fs::create_dir_all(&root).expect("create root");
        WorkDir { _tmp: tmp, root }
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write fixture file");
    }

    pub fn write_bytes(&self, rel: &str, contents: &[u8]) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write fixture file");
    }

    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.root.join(rel)).expect("mkdir");
    }

    /// Runs `dctx <root>` with `$HOME` unset, so the global config/ignore
    /// files can never leak into the test.
    pub fn run(&self) -> Output {
        Command::new(env!("CARGO_BIN_EXE_dctx"))
            .arg(&self.root)
            .env_remove("HOME")
            .output()
            .expect("spawn dctx")
    }

    fn basename(&self) -> String {
        self.root.file_name().unwrap().to_string_lossy().into_owned()
    }

    pub fn archive_path(&self) -> PathBuf {
        self.root.parent().unwrap().join(format!("{}.dircontxt", self.basename()))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.parent().unwrap().join(format!("{}.llmcontext.txt", self.basename()))
    }

    pub fn diff_path(&self, version: &str) -> PathBuf {
        self.root.parent().unwrap().join(format!("{}.llmcontext-{}-diff.txt", self.basename(), version))
    }

    pub fn read_manifest(&self) -> String {
        fs::read_to_string(self.manifest_path()).expect("read manifest")
    }

    pub fn read_diff(&self, version: &str) -> String {
        fs::read_to_string(self.diff_path(version)).expect("read diff")
    }
}
