pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "mangashelf")]
#[command(about = "A terminal manga reader with an offline library", long_about = None)]
pub struct Cli {
    /// Data directory (overrides `[storage] data_dir` in the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the TUI (default)
    Tui,
    /// List cached series
    List {
        /// Only series in the library
        #[arg(long, conflicts_with = "recent")]
        library: bool,
        /// Recently read series, most recent first
        #[arg(long)]
        recent: bool,
    },
    /// Show the chapters of a cached series with reading progress
    Chapters {
        /// Series id as printed by `list`
        series: Uuid,
    },
    /// Manage library membership
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
}

#[derive(Subcommand)]
pub enum LibraryAction {
    /// Add a cached series to the library
    Add { series: Uuid },
    /// Remove a series from the library
    Remove { series: Uuid },
}
