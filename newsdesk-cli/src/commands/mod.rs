//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod fetch;
mod sources;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Data source management
    Sources {
        #[command(subcommand)]
        command: sources::SourceCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Sources { command } => sources::handle_source_command(command, config).await,
    }
}
