//! The global configuration file.
//!
//! Line-oriented `KEY=VALUE`, parsed the same way the ignore engine parses
//! patterns: skip blank/`#`-prefixed lines, trim whitespace, never abort
//! the whole load over one bad line.

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

/// Which artifacts a run should write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Both,
    TextOnly,
    BinaryOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub output_mode: OutputMode,
}

impl Config {
    /// Loads `$HOME/.config/dircontxt/config`. A missing file yields
    /// `Config::default()`; an unset `$HOME` is treated the same way and
    /// logged at `debug`, not `warn` (it's an expected shape for minimal
    /// environments, not a misconfiguration).
    pub fn load(home: Option<&Path>) -> Config {
        let home = match home {
            Some(home) => home,
            None => {
                log::debug!("HOME not set; using default configuration");
                return Config::default();
            }
        };
        let path = home.join(".config").join("dircontxt").join("config");
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Config::default(),
            Err(err) => {
                log::warn!("{}: {}", path.display(), err);
                return Config::default();
            }
        };

        let mut config = Config::default();
        for (lineno, line) in io::BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::warn!("{}:{}: {}", path.display(), lineno + 1, err);
                    continue;
                }
            };
            apply_line(&mut config, &line, &path, lineno + 1);
        }
        config
    }
}

fn apply_line(config: &mut Config, line: &str, path: &Path, lineno: usize) {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return;
    }
    let Some((key, value)) = trimmed.split_once('=') else {
        log::warn!("{}:{}: missing '=' in config line", path.display(), lineno);
        return;
    };
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        log::warn!("{}:{}: empty config key", path.display(), lineno);
        return;
    }

    match key {
        "OUTPUT_MODE" => match value.to_ascii_lowercase().as_str() {
            "both" => config.output_mode = OutputMode::Both,
            "text" | "text_only" => config.output_mode = OutputMode::TextOnly,
            "binary" | "binary_only" => config.output_mode = OutputMode::BinaryOnly,
            other => log::warn!("{}:{}: unrecognized OUTPUT_MODE '{}'", path.display(), lineno, other),
        },
        other => log::warn!("{}:{}: unrecognized config key '{}'", path.display(), lineno, other),
    }
}
