//! Newsdesk CLI
//!
//! Command-line interface for managing the data sources of the news
//! ingestion backend and following their fetch jobs.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "News ingestion data source CLI", long_about = None)]
struct Cli {
    /// Backend API URL
    #[arg(
        long,
        env = "NEWSDESK_API_URL",
        default_value = "http://localhost:5000/api"
    )]
    api_url: String,

    /// Bearer token for the backend
    #[arg(long, env = "NEWSDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsdesk=warn,newsdesk_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        token: cli.token,
    };

    handle_command(cli.command, &config).await
}
