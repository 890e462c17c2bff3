//! The hierarchical ignore engine.
//!
//! Three tiers, loaded lowest-priority first: hardcoded defaults, the
//! global `$HOME/.config/dircontxt/ignore` file, then the project's
//! `.dircontxtignore`. Patterns from every tier end up in one ordered
//! rule list; matching is a single last-match-wins linear scan over that
//! list, remembering the last hit rather than building any precedence
//! structure.

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

const SEP: char = std::path::MAIN_SEPARATOR;

/// The shape of a single ignore pattern's classification
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Matches the file/directory's basename exactly.
    Basename,
    /// Matches the full relative path exactly.
    Path,
    /// Matches a relative-path prefix (the separator before a trailing
    /// `*` is kept as part of the pattern).
    Prefix,
    /// Matches a basename suffix.
    Suffix,
}

/// One ignore rule, already classified and stripped of its syntactic
/// markers (`!`, trailing `/`, trailing/leading `*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub kind: PatternKind,
    pub directory_only: bool,
    pub negation: bool,
}

impl Rule {
    /// Parses one line of an ignore file. Returns `None` for blank lines
    /// and comments, which aren't rules at all (not even a recognized-but-
    /// inert one).
    pub fn parse(line: &str) -> Option<Rule> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let mut rest = trimmed;
        let mut negation = false;
        if let Some(stripped) = rest.strip_prefix('!') {
            negation = true;
            rest = stripped;
        }

        let mut directory_only = false;
        if let Some(stripped) = rest.strip_suffix(SEP) {
            directory_only = true;
            rest = stripped;
        }

        let (pattern, kind) = if rest.contains(SEP) {
            if let Some(stripped) = rest.strip_suffix('*') {
                (stripped.to_string(), PatternKind::Prefix)
            } else {
                (rest.to_string(), PatternKind::Path)
            }
        } else if let Some(stripped) = rest.strip_prefix('*') {
            (stripped.to_string(), PatternKind::Suffix)
        } else {
            (rest.to_string(), PatternKind::Basename)
        };

        Some(Rule { pattern, kind, directory_only, negation })
    }

    fn matches(&self, relative_path: &str, basename: &str, is_dir: bool) -> bool {
        if self.directory_only && !is_dir {
            return false;
        }
        match self.kind {
            PatternKind::Basename => basename == self.pattern,
            // `relative_path` carries a trailing separator for directories
            // (see walk::walk_into) so PREFIX patterns like "build/*" see
            // "build/" and match the directory itself, not just its
            // children; an exact PATH pattern never stores that separator
            // (it's stripped during parsing, §4.1 step 2), so it's stripped
            // here too before comparing.
            PatternKind::Path => relative_path.trim_end_matches(SEP) == self.pattern,
            PatternKind::Prefix => relative_path.starts_with(&self.pattern),
            PatternKind::Suffix => basename.ends_with(&self.pattern),
        }
    }
}

/// The hardcoded tier-1 defaults, plus the snapshot's own output
/// filenames: a snapshot run must never archive its own prior artifacts.
/// These are exact-name rules on the literal artifact filenames, not a
/// prefix on the bare basename — `output_basename` alone would also
/// match an unrelated file that merely starts with the same characters
/// (e.g. snapshotting `proj/` would otherwise drop `project_notes.txt`).
fn hardcoded_defaults(output_basename: &str) -> Vec<Rule> {
    let mut rules = vec![
        Rule { pattern: ".git".into(), kind: PatternKind::Basename, directory_only: true, negation: false },
        Rule { pattern: ".DS_Store".into(), kind: PatternKind::Basename, directory_only: false, negation: false },
        Rule { pattern: "node_modules".into(), kind: PatternKind::Basename, directory_only: true, negation: false },
    ];
    rules.push(Rule {
        pattern: format!("{output_basename}.dircontxt"),
        kind: PatternKind::Basename,
        directory_only: false,
        negation: false,
    });
    rules.push(Rule {
        pattern: format!("{output_basename}.llmcontext.txt"),
        kind: PatternKind::Basename,
        directory_only: false,
        negation: false,
    });
    // The diff filename carries a version token ("<basename>.llmcontext-
    // <version>-diff.txt") that isn't known at ignore-load time, so it's
    // matched by the shared literal prefix instead of an exact name.
    rules.push(Rule {
        pattern: format!("{output_basename}.llmcontext-"),
        kind: PatternKind::Prefix,
        directory_only: false,
        negation: false,
    });
    rules
}

/// An ordered set of ignore rules accumulated from all three tiers.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    rules: Vec<Rule>,
}

impl IgnoreSet {
    pub fn new() -> IgnoreSet {
        IgnoreSet { rules: Vec::new() }
    }

    /// Loads the full three-tier rule set for a snapshot whose artifacts
    /// share basename `output_basename` (e.g. `"myproject"`, which also
    /// covers `myproject.dircontxt`, `myproject.llmcontext.txt`, ...).
    ///
    /// A missing global or project ignore file is not an error; any other
    /// I/O failure opening one is logged and the run continues with the
    /// rules loaded so far.
    pub fn load(root: &Path, home: Option<&Path>, output_basename: &str) -> IgnoreSet {
        let mut set = IgnoreSet { rules: hardcoded_defaults(output_basename) };

        if let Some(home) = home {
            let global = home.join(".config").join("dircontxt").join("ignore");
            set.load_file(&global);
        }

        let project = root.join(".dircontxtignore");
        set.load_file(&project);

        set
    }

    /// Appends every rule parsed from `path`'s lines, in file order. A
    /// missing file is silently skipped; any other open failure is logged
    /// and skipped too — the run continues with the rules loaded so far.
    fn load_file(&mut self, path: &Path) {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return,
            Err(err) => {
                log::warn!("{}: {}", path.display(), err);
                return;
            }
        };
        for (lineno, line) in io::BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::warn!("{}:{}: {}", path.display(), lineno + 1, err);
                    continue;
                }
            };
            if let Some(rule) = Rule::parse(&line) {
                self.rules.push(rule);
            }
        }
    }

    /// Appends rules parsed from an in-memory ignore-file body, used by
    /// tests and by any caller that already has the text in hand.
    pub fn add_str(&mut self, body: &str) {
        for line in body.lines() {
            if let Some(rule) = Rule::parse(line) {
                self.rules.push(rule);
            }
        }
    }

    /// Returns true if and only if the given item should be ignored:
    /// start from `false` and let every matching rule, in load order,
    /// overwrite the running result with `!rule.negation`.
    pub fn is_ignored(&self, relative_path: &Path, basename: &str, is_dir: bool) -> bool {
        let relative_path = normalized(relative_path);
        let mut ignored = false;
        for rule in &self.rules {
            if rule.matches(&relative_path, basename, is_dir) {
                ignored = !rule.negation;
            }
        }
        ignored
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// `PREFIX`/`PATH` matching is defined over the relative-path string
/// including its platform path separator; on Windows `Path`'s own
/// `Display` already uses `\`, so this is a no-op there, but it keeps
/// the matcher honest about what "the path separator" means on every
/// platform the crate targets.
fn normalized(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_from(body: &str) -> IgnoreSet {
        let mut set = IgnoreSet::new();
        set.add_str(body);
        set
    }

    #[test]
    fn basename_pattern_matches_by_name_only() {
        let set = set_from("Cargo.lock");
        assert!(set.is_ignored(Path::new("Cargo.lock"), "Cargo.lock", false));
        assert!(set.is_ignored(Path::new("sub/Cargo.lock"), "Cargo.lock", false));
        assert!(!set.is_ignored(Path::new("Cargo.lock.bak"), "Cargo.lock.bak", false));
    }

    #[test]
    fn path_pattern_requires_full_relative_match() {
        let set = set_from(&format!("src{SEP}main.rs"));
        let p = PathBuf::from(format!("src{SEP}main.rs"));
        assert!(set.is_ignored(&p, "main.rs", false));
        assert!(!set.is_ignored(Path::new("main.rs"), "main.rs", false));
    }

    #[test]
    fn suffix_pattern_matches_basename_tail() {
        let set = set_from("*.log");
        assert!(set.is_ignored(Path::new("debug.log"), "debug.log", false));
        assert!(!set.is_ignored(Path::new("logger.rs"), "logger.rs", false));
    }

    #[test]
    fn prefix_pattern_matches_relative_path_start() {
        let set = set_from(&format!("build{SEP}*"));
        let p = PathBuf::from(format!("build{SEP}output.bin"));
        assert!(set.is_ignored(&p, "output.bin", false));
    }

    #[test]
    fn directory_only_rule_skipped_for_files() {
        let set = set_from("vendor/");
        assert!(set.is_ignored(Path::new("vendor"), "vendor", true));
        assert!(!set.is_ignored(Path::new("vendor"), "vendor", false));
    }

    #[test]
    fn last_match_wins_negation_overrides_suffix_rule() {
        let set = set_from("*.log\n!ignored.log");
        assert!(!set.is_ignored(Path::new("ignored.log"), "ignored.log", false));
        assert!(set.is_ignored(Path::new("debug.log"), "debug.log", false));
    }

    #[test]
    fn later_rule_overrides_earlier_rule_regardless_of_kind() {
        // A later BASENAME re-ignore beats an earlier whitelist.
        let set = set_from("!keep.txt\nkeep.txt");
        assert!(set.is_ignored(Path::new("keep.txt"), "keep.txt", false));
    }

    #[test]
    fn comments_and_blank_lines_are_not_rules() {
        let set = set_from("# comment\n\n   \n*.log");
        assert_eq!(set.rules().len(), 1);
    }

    #[test]
    fn hardcoded_defaults_cover_git_and_node_modules_and_own_output() {
        let set = IgnoreSet { rules: hardcoded_defaults("myproj") };
        assert!(set.is_ignored(Path::new(".git"), ".git", true));
        assert!(!set.is_ignored(Path::new(".git"), ".git", false));
        assert!(set.is_ignored(Path::new("node_modules"), "node_modules", true));
        assert!(set.is_ignored(Path::new(".DS_Store"), ".DS_Store", false));
        assert!(set.is_ignored(Path::new("myproj.dircontxt"), "myproj.dircontxt", false));
        assert!(set.is_ignored(Path::new("myproj.llmcontext.txt"), "myproj.llmcontext.txt", false));
        assert!(set.is_ignored(Path::new("myproj.llmcontext-V1.1-diff.txt"), "myproj.llmcontext-V1.1-diff.txt", false));
    }

    #[test]
    fn own_output_rule_does_not_collaterally_match_an_unrelated_file_with_a_shared_prefix() {
        let set = IgnoreSet { rules: hardcoded_defaults("proj") };
        assert!(!set.is_ignored(Path::new("project_notes.txt"), "project_notes.txt", false));
    }

    #[test]
    fn load_ignores_missing_files_silently() {
        let tmp = tempfile::tempdir().unwrap();
        let set = IgnoreSet::load(tmp.path(), None, "proj");
        // Only the hardcoded defaults should be present.
        assert_eq!(set.rules().len(), hardcoded_defaults("proj").len());
    }

    #[test]
    fn load_reads_project_ignore_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(".dircontxtignore"), "*.tmp\n").unwrap();
        let set = IgnoreSet::load(tmp.path(), None, "proj");
        assert!(set.is_ignored(Path::new("scratch.tmp"), "scratch.tmp", false));
    }
}
