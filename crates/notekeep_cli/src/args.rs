use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notekeep", version, about = "Keep notes in folders, from the terminal")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "NOTEKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overrides `db_path` from the configuration
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log debug events to stderr when no log directory is configured
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Command {
    /// Lists notes, pinned first then most recently updated.
    List(ListArgs),
    /// Shows one note.
    Show { id: i64 },
    /// Creates a note.
    Add(AddArgs),
    /// Edits a note. Omitted fields keep their current value.
    Edit(EditArgs),
    /// Deletes a note.
    Rm { id: i64 },
    /// Marks or unmarks a note as favorite.
    Fav { id: i64, state: Toggle },
    /// Pins or unpins a note.
    Pin { id: i64, state: Toggle },
    /// Lists folders.
    Folders,
    /// Creates a folder.
    Mkdir { name: String },
    /// Deletes a folder. Its notes are kept and become unfiled.
    Rmdir { id: i64 },
    /// Prints the core library version.
    Version,
}

#[derive(Debug, Args, PartialEq, Default)]
pub struct ListArgs {
    /// Only favorite notes
    #[arg(long, conflicts_with = "folder")]
    pub favorites: bool,
    /// Only notes in this folder
    #[arg(long, value_name = "ID")]
    pub folder: Option<i64>,
    /// Case-insensitive substring matched against title and content
    #[arg(long, short, value_name = "TEXT")]
    pub query: Option<String>,
}

#[derive(Debug, Args, PartialEq)]
pub struct AddArgs {
    #[arg(long, short)]
    pub title: String,
    #[arg(long, short, default_value = "")]
    pub content: String,
    /// Folder to file the note under
    #[arg(long, value_name = "ID")]
    pub folder: Option<i64>,
    #[arg(long)]
    pub pin: bool,
    #[arg(long)]
    pub fav: bool,
}

#[derive(Debug, Args, PartialEq)]
pub struct EditArgs {
    pub id: i64,
    #[arg(long, short)]
    pub title: Option<String>,
    #[arg(long, short)]
    pub content: Option<String>,
    /// Move the note into this folder
    #[arg(long, value_name = "ID", conflicts_with = "unfile")]
    pub folder: Option<i64>,
    /// Remove the note from its folder
    #[arg(long)]
    pub unfile: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}
