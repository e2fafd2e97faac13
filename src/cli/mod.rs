pub mod entries;
pub mod rates;
pub mod stats;

use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use entries::{
    process_add_command, process_edit_command, process_log_command, process_remove_command,
    AddCommand, EditCommand,
};
use rates::{process_rates_command, RatesCommand};
use stats::process_stats_command;
use tracing::level_filters::LevelFilter;

use crate::{
    server::{start_server, AppState, DEFAULT_PORT},
    utils::{
        dir::resolve_data_dir,
        logging::{enable_logging, CLI_PREFIX, SERVER_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Timesheet", version, long_about = None)]
#[command(about = "Track work sessions, course rates and weekly earnings", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Data directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Run the http api in the current console")]
    Serve {
        #[arg(long, default_value = "127.0.0.1", help = "Address to listen on")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT, help = "Port to listen on")]
        port: u16,
    },
    #[command(flatten)]
    Storage(StorageCommands),
}

/// Commands that work directly on the data directory.
#[derive(Subcommand, Debug)]
enum StorageCommands {
    #[command(about = "Log a new work session")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
    #[command(about = "Change fields of a logged session")]
    Edit {
        #[command(flatten)]
        command: EditCommand,
    },
    #[command(about = "Delete a logged session")]
    Remove { id: String },
    #[command(about = "Display sessions grouped by week, newest first")]
    Log {},
    #[command(about = "Display total and weekly statistics")]
    Stats {
        #[arg(long, help = "Mask earnings in the output")]
        hide_earnings: bool,
    },
    #[command(about = "Manage hourly rates of courses")]
    Rates {
        #[command(subcommand)]
        command: RatesCommand,
    },
}

/// Style of dates used when parsing natural language dates.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let data_dir = resolve_data_dir(args.dir)?;

    match args.commands {
        Commands::Serve { host, port } => {
            enable_logging(SERVER_PREFIX, &data_dir, logging_level, true)?;
            start_server(&data_dir, &host, port).await
        }
        Commands::Storage(command) => {
            enable_logging(CLI_PREFIX, &data_dir, logging_level, args.log)?;
            let state = AppState::from_data_dir(&data_dir).await?;
            process_storage_command(command, &state).await
        }
    }
}

async fn process_storage_command(command: StorageCommands, state: &AppState) -> Result<()> {
    let clock = &*state.clock;
    match command {
        StorageCommands::Add { command } => {
            process_add_command(command, &*state.entries, clock).await
        }
        StorageCommands::Edit { command } => {
            process_edit_command(command, &*state.entries, clock).await
        }
        StorageCommands::Remove { id } => process_remove_command(&id, &*state.entries).await,
        StorageCommands::Log {} => process_log_command(&*state.entries).await,
        StorageCommands::Stats { hide_earnings } => {
            process_stats_command(&*state.entries, &*state.rates, hide_earnings).await
        }
        StorageCommands::Rates { command } => {
            process_rates_command(command, &*state.entries, &*state.rates).await
        }
    }
}

pub(crate) fn validation_error(message: impl Display) -> anyhow::Error {
    use clap::CommandFactory;
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .into()
}
