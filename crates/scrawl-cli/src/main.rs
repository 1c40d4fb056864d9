//! Scrawl sync CLI - drive the note sync engine from the terminal.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands, ConfigCommands, QueueCommands};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scrawl=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = commands::resolve_config_path(cli.config);

    match cli.command {
        Commands::Sync { all, resolve, json } => {
            commands::run_sync(&config_path, all, resolve, json).await?;
        }
        Commands::SyncNote { id } => commands::run_sync_note(&config_path, &id).await?,
        Commands::Queue { command } => match command {
            QueueCommands::List { json } => commands::run_queue_list(&config_path, json)?,
            QueueCommands::Cancel { id } => commands::run_queue_cancel(&config_path, &id)?,
        },
        Commands::Status { json } => commands::run_status(&config_path, json)?,
        Commands::Config { command } => match command {
            ConfigCommands::Init => commands::run_config_init(&config_path)?,
            ConfigCommands::Show => commands::run_config_show(&config_path)?,
        },
    }

    Ok(())
}
