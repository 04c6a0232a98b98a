//! Data source command handlers
//!
//! Handles listing, inspecting, creating, updating and deleting data
//! sources, and routes `fetch` to the tracking handler.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use newsdesk_client::NewsdeskClient;
use newsdesk_core::domain::source::{DataSource, SourceId, SourceType};
use newsdesk_core::dto::source::{CreateSource, UpdateSource};
use std::collections::HashMap;

use super::fetch::{self, FetchOptions};
use crate::config::Config;

/// Data source subcommands
#[derive(Subcommand)]
pub enum SourceCommands {
    /// List all data sources
    List,
    /// Get data source details
    Get {
        /// Data source ID
        id: SourceId,
    },
    /// Create a data source
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Source type: rss, web or api
        #[arg(long = "type")]
        source_type: SourceType,

        /// URL to scrape
        #[arg(long)]
        url: String,

        #[arg(long)]
        description: Option<String>,

        /// Scheduled fetch interval in seconds
        #[arg(long)]
        interval: Option<u64>,

        /// Scraper configuration as a JSON object
        #[arg(long)]
        config: Option<String>,
    },
    /// Update a data source
    Update {
        /// Data source ID
        id: SourceId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Scheduled fetch interval in seconds
        #[arg(long)]
        interval: Option<u64>,

        /// Scraper configuration as a JSON object
        #[arg(long)]
        config: Option<String>,
    },
    /// Activate a data source
    Enable {
        /// Data source ID
        id: SourceId,
    },
    /// Deactivate a data source
    Disable {
        /// Data source ID
        id: SourceId,
    },
    /// Delete a data source
    Delete {
        /// Data source ID
        id: SourceId,
    },
    /// Show aggregate statistics
    Stats,
    /// Trigger fetch jobs and wait for them to finish
    Fetch {
        /// Data source IDs
        #[arg(required = true)]
        ids: Vec<SourceId>,

        /// Only queue the jobs, do not wait for completion
        #[arg(long)]
        detach: bool,

        /// Seconds between two completion checks
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Completion checks before giving up
        #[arg(long)]
        max_ticks: Option<u32>,
    },
}

/// Handle data source commands
///
/// # Arguments
/// * `command` - The data source command to execute
/// * `config` - The CLI configuration
pub async fn handle_source_command(command: SourceCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        SourceCommands::List => list_sources(&client).await,
        SourceCommands::Get { id } => get_source(&client, id).await,
        SourceCommands::Create {
            name,
            source_type,
            url,
            description,
            interval,
            config,
        } => {
            let req = CreateSource {
                name,
                source_type,
                url,
                description,
                fetch_interval: interval,
                config: config.as_deref().map(parse_config).transpose()?,
            };
            create_source(&client, req).await
        }
        SourceCommands::Update {
            id,
            name,
            description,
            interval,
            config,
        } => {
            let req = UpdateSource {
                name,
                description,
                fetch_interval: interval,
                is_active: None,
                config: config.as_deref().map(parse_config).transpose()?,
            };
            update_source(&client, id, req).await
        }
        SourceCommands::Enable { id } => set_active(&client, id, true).await,
        SourceCommands::Disable { id } => set_active(&client, id, false).await,
        SourceCommands::Delete { id } => delete_source(&client, id).await,
        SourceCommands::Stats => show_stats(&client).await,
        SourceCommands::Fetch {
            ids,
            detach,
            poll_interval,
            max_ticks,
        } => {
            let options = FetchOptions {
                detach,
                poll_interval,
                max_ticks,
            };
            fetch::fetch_sources(client, ids, options).await
        }
    }
}

/// List all data sources
async fn list_sources(client: &NewsdeskClient) -> Result<()> {
    let sources = client.list_sources().await?;

    if sources.is_empty() {
        println!("{}", "No data sources found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} data source(s):", sources.len()).bold()
        );
        println!();
        for source in sources {
            print_source_summary(&source);
        }
    }

    Ok(())
}

/// Get and display a single data source
async fn get_source(client: &NewsdeskClient, id: SourceId) -> Result<()> {
    let source = client.get_source(id).await?;
    print_source_details(&source);
    Ok(())
}

async fn create_source(client: &NewsdeskClient, req: CreateSource) -> Result<()> {
    let source = client.create_source(req).await?;

    println!("{} Data source created", "✓".green());
    print_source_details(&source);
    Ok(())
}

async fn update_source(client: &NewsdeskClient, id: SourceId, req: UpdateSource) -> Result<()> {
    if req.is_empty() {
        println!("{}", "Nothing to update.".yellow());
        return Ok(());
    }

    let source = client.update_source(id, &req).await?;

    println!("{} Data source {} updated", "✓".green(), id);
    print_source_details(&source);
    Ok(())
}

async fn set_active(client: &NewsdeskClient, id: SourceId, is_active: bool) -> Result<()> {
    let source = client.set_source_active(id, is_active).await?;

    println!(
        "{} {} is now {}",
        "✓".green(),
        source.name.bold(),
        colorize_active(source.is_active)
    );
    Ok(())
}

async fn delete_source(client: &NewsdeskClient, id: SourceId) -> Result<()> {
    client.delete_source(id).await?;
    println!("{} Data source {} deleted", "✓".green(), id);
    Ok(())
}

async fn show_stats(client: &NewsdeskClient) -> Result<()> {
    let stats = client.source_stats().await?;

    println!("{}", "Data source statistics:".bold());
    let mut keys: Vec<_> = stats.keys().collect();
    keys.sort();
    for key in keys {
        println!("  {:<16} {}", key.cyan(), stats[key]);
    }
    Ok(())
}

/// Parses a `--config` argument into a JSON object
fn parse_config(raw: &str) -> Result<HashMap<String, serde_json::Value>> {
    serde_json::from_str(raw).context("--config must be a JSON object")
}

/// Print a data source summary
pub(crate) fn print_source_summary(source: &DataSource) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        source.name.bold(),
        format!("#{}", source.id).dimmed()
    );
    println!(
        "    Type:     {}  Status: {}",
        source.source_type.to_string().to_uppercase(),
        colorize_active(source.is_active)
    );
    println!("    URL:      {}", source.url.dimmed());
    println!(
        "    Fetches:  {} ({})",
        source.fetch_count,
        format_success_rate(source)
    );
    println!("    Last:     {}", format_last_fetch(source).dimmed());
    println!();
}

/// Print detailed data source information
fn print_source_details(source: &DataSource) {
    println!("{}", "Data Source Details:".bold());
    println!("  ID:           {}", source.id.to_string().cyan());
    println!("  Name:         {}", source.name);
    println!("  Type:         {}", source.source_type);
    println!("  URL:          {}", source.url);
    println!("  Status:       {}", colorize_active(source.is_active));
    println!("  Interval:     {}s", source.fetch_interval);
    println!("  Fetches:      {}", source.fetch_count);
    println!("  Succeeded:    {}", source.success_count.to_string().green());
    println!("  Failed:       {}", source.error_count.to_string().red());
    println!("  Success rate: {}", format_success_rate(source));
    println!("  Last fetch:   {}", format_last_fetch(source));

    if let Some(last_success) = source.last_success {
        println!(
            "  Last success: {}",
            last_success.format("%Y-%m-%d %H:%M:%S")
        );
    }

    if let Some(description) = source.description.as_deref().filter(|d| !d.is_empty()) {
        println!("\n{}", "Description:".bold());
        println!("  {}", description);
    }

    if let Some(config) = source.config.as_ref().filter(|c| !c.is_empty()) {
        println!("\n{}", "Config:".bold());
        for (key, value) in config {
            println!("  {} = {}", key.cyan(), value);
        }
    }
}

fn format_success_rate(source: &DataSource) -> String {
    match source.success_rate() {
        Some(rate) => format!("{:.1}% success", rate),
        None => "-".to_string(),
    }
}

pub(crate) fn format_last_fetch(source: &DataSource) -> String {
    source
        .last_fetch
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Colorize the activation flag for display
fn colorize_active(is_active: bool) -> colored::ColoredString {
    if is_active {
        "Active".green()
    } else {
        "Inactive".dimmed()
    }
}
