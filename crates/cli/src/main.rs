use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kotoba::{Configuration, SqliteStore};
use tracing::{dispatcher, Dispatch};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod init;
mod lessons;
mod nuke;
mod run;
mod transfer;

/// Vocabulary lessons and quizzes on the terminal.
#[derive(Parser)]
#[command(name = "kotoba", version)]
struct Cli {
    /// Print debug information into the standard error.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the configuration and the database for this application.
    Init,
    /// Remove all files from this application and its database.
    Nuke,
    /// Manage the lessons from the database.
    Lessons {
        #[command(subcommand)]
        command: lessons::Command,
    },
    /// Apply a JSON lesson package to the database.
    Import { file: PathBuf },
    /// Write every lesson as a JSON lesson package, into the standard output
    /// if no file is given.
    Export { file: Option<PathBuf> },
    /// Run a quiz. Default command if none was given.
    Quiz(run::Args),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Init) => init::run(),
        Some(Commands::Nuke) => nuke::run(),
        Some(Commands::Lessons { command }) => lessons::run(command),
        Some(Commands::Import { file }) => transfer::import(&file),
        Some(Commands::Export { file }) => transfer::export(file.as_deref()),
        Some(Commands::Quiz(args)) => run::run(args),
        None => run::run(run::Args::default()),
    }
}

/// Returns the logger installed by `main`, to be handed over to the library.
pub fn logger() -> Dispatch {
    dispatcher::get_default(Dispatch::clone)
}

/// Open the database set by the given configuration.
pub fn open_store(cfg: &Configuration) -> anyhow::Result<SqliteStore> {
    let path = cfg.database_path()?;
    SqliteStore::open(&path, logger())
        .with_context(|| format!("could not open the database at '{}'", path.display()))
}
