use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use scrawl_core::ConflictResolution;

#[derive(Parser)]
#[command(name = "scrawl-sync")]
#[command(about = "Synchronize Scrawl notes with a cloud provider")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the sync configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one sync pass over all pending changes
    Sync {
        /// Queue every stored note first (useful for a first full sync)
        #[arg(long)]
        all: bool,
        /// Resolve conflicts with this strategy instead of leaving them pending
        #[arg(long, value_enum)]
        resolve: Option<ResolvePolicy>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sync a single note now
    SyncNote {
        /// Note ID
        id: String,
    },
    /// Inspect or edit the pending queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
    /// Show provider and queue status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the sync configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// List pending changes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Cancel the pending change for a note
    Cancel {
        /// Note ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a configuration template to the config path
    Init,
    /// Print the active configuration
    Show,
}

/// Non-interactive conflict resolution strategy.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ResolvePolicy {
    /// The local version wins
    KeepLocal,
    /// The remote version wins
    KeepRemote,
    /// Combine both bodies with markers
    Merge,
}

impl From<ResolvePolicy> for ConflictResolution {
    fn from(policy: ResolvePolicy) -> Self {
        match policy {
            ResolvePolicy::KeepLocal => Self::KeepLocal,
            ResolvePolicy::KeepRemote => Self::KeepRemote,
            ResolvePolicy::Merge => Self::Merge,
        }
    }
}
