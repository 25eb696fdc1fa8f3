use std::fs::{self, OpenOptions};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mangashelf::app::{context::LOG_FILE, AppContext};
use mangashelf::cli::commands::{self, ListFilter};
use mangashelf::cli::{Cli, Commands, LibraryAction};
use mangashelf::config::Config;
use mangashelf::source::SourceRegistry;
use mangashelf::viewer::LogPresence;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let data_dir = config.data_dir(cli.data_dir.as_deref())?;
    let command = cli.command.unwrap_or(Commands::Tui);

    // The TUI owns the terminal, so it logs to a file instead of stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if matches!(command, Commands::Tui) {
        fs::create_dir_all(&data_dir)?;
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join(LOG_FILE))?;
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(log_file).with_ansi(false))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    // Site scrapers register here.
    let sources = SourceRegistry::new();
    let mut ctx = AppContext::open(&data_dir, config, sources, Box::new(LogPresence)).await?;

    match command {
        Commands::Tui => {
            mangashelf::tui::run(&mut ctx).await?;
        }
        Commands::List { library, recent } => {
            let filter = if library {
                ListFilter::Library
            } else if recent {
                ListFilter::Recent
            } else {
                ListFilter::All
            };
            commands::list_series(&ctx, filter)?;
        }
        Commands::Chapters { series } => {
            commands::list_chapters(&ctx, series)?;
        }
        Commands::Library { action } => match action {
            LibraryAction::Add { series } => commands::add_to_library(&mut ctx, series)?,
            LibraryAction::Remove { series } => commands::remove_from_library(&mut ctx, series)?,
        },
    }

    Ok(())
}
