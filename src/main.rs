//! Entry point: parse args, init logging, load config, run the pipeline,
//! translate the result into an exit code.

mod archive;
mod args;
mod clipboard;
mod config;
mod differ;
mod error;
mod format;
mod ignore;
mod orchestrator;
mod pathutil;
mod tree;
mod version;
mod walk;

use std::path::PathBuf;
use std::process::ExitCode;

use args::Args;
use config::Config;
use error::Error;

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> error::Result<()> {
    let home = std::env::var("HOME").ok().map(PathBuf::from);
    let config = Config::load(home.as_deref());

    let root = pathutil::resolve(&args.path)?;
    let outcome = orchestrator::run(&root, &config)?;

    if args.clipboard {
        clipboard::copy(outcome.manifest_text.as_bytes())?;
        std::fs::remove_file(&outcome.archive_path).map_err(|err| Error::io(&outcome.archive_path, err))?;
        log::info!("copied manifest to clipboard, removed {}", outcome.archive_path.display());
    }

    Ok(())
}
