use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "feedhook")]
#[command(about = "Watches freelance job feeds and posts new listings to a chat webhook")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "FEEDHOOK_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check feeds continuously on the configured interval (default)
    Run,

    /// Run a single check and exit
    Once {
        /// Dry run - don't send notifications, just show what would be sent
        #[arg(long)]
        dry_run: bool,
    },

    /// Send a test message to the webhook and exit
    Test,

    /// Print statistics about notified listings
    Stats,

    /// Forget every notified listing
    Reset,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}
