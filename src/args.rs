//! Command-line argument parsing.
//!
//! `Args::parse()` does double duty: it validates and normalizes the raw
//! command line into a small struct, and it initializes the global logger
//! from the verbosity flags, bootstrapping logging before any real work
//! starts.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "dctx", version, about = "Versioned, diff-aware directory snapshots for LLM consumption")]
struct Cli {
    /// Directory to snapshot.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Emit the manifest to the system clipboard and delete the archive
    /// after the run.
    #[arg(short, long)]
    clipboard: bool,

    /// Suppress non-error log output.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit debug-level log output; repeat for trace.
    #[arg(long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// The parsed, logging-initialized command line.
pub struct Args {
    pub path: PathBuf,
    pub clipboard: bool,
}

impl Args {
    /// Parses `std::env::args()`, initializes `env_logger` from the
    /// verbosity flags, and returns the remaining orchestrator-relevant
    /// options.
    pub fn parse() -> Args {
        let cli = Cli::parse();
        init_logger(&cli);
        Args { path: cli.path, clipboard: cli.clipboard }
    }
}

fn init_logger(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new().filter_level(level).init();
}
