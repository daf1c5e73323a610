//! `notekeep` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from `--config`, `--db` and defaults.
//! - Start logging, open the repository and run one command.

mod args;
mod commands;

use anyhow::{anyhow, Context, Result};
use args::CliArgs;
use clap::Parser;
use commands::Session;
use log::info;
use notekeep_core::{init_from_config, init_stderr_logging, MainLoop, NotesConfig, NotesRepository};

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = match args.config.as_ref() {
        Some(path) => NotesConfig::load(path)
            .with_context(|| format!("loading config `{}`", path.display()))?,
        None => NotesConfig::default(),
    };
    if let Some(db) = args.db {
        config.db_path = db;
    }

    start_logging(&config, args.verbose)?;
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        config.db_path.display()
    );

    let main_loop = MainLoop::new();
    let repo = NotesRepository::open(&config, main_loop.handle())
        .with_context(|| format!("opening `{}`", config.db_path.display()))?;
    Session::new(main_loop, repo, args.json).execute(args.command)
}

fn start_logging(config: &NotesConfig, verbose: bool) -> Result<()> {
    let outcome = if config.logging.dir.is_some() {
        init_from_config(&config.logging)
    } else if verbose {
        init_stderr_logging(&config.logging.level)
    } else {
        init_stderr_logging("warn")
    };
    outcome.map_err(|err| anyhow!(err))
}
