use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sift::{LoggingConfig, SearchClient, SiftConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::aggregate::AggregateCommand;
use commands::search::SearchCommand;

#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(about = "sift - query and aggregate an Elasticsearch-compatible index")]
#[command(version)]
struct Cli {
    /// Config file (TOML); defaults apply when it does not exist
    #[arg(long, env = "SIFT_CONFIG", default_value = "sift.toml", global = true)]
    config: PathBuf,

    /// Search service URL, overrides the config file
    #[arg(long, env = "SIFT_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Target index, overrides the config file
    #[arg(long, env = "SIFT_INDEX", global = true)]
    index: Option<String>,

    /// Print raw JSON instead of a listing
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a search and print the matching titles
    Search {
        #[command(subcommand)]
        command: SearchCommand,
    },

    /// Run an aggregation and print its result
    Aggregate {
        #[command(subcommand)]
        command: AggregateCommand,
    },

    /// List indices in the cluster
    Indices,

    /// Bulk-index documents from a JSON array file
    IndexData {
        /// JSON file holding an array of documents
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the field mappings of the index
    Mapping,

    /// Delete the index
    DeleteIndex,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    // stdout carries command output, logs go to stderr
    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = SiftConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(index) = cli.index {
        config.index = index;
    }

    init_tracing(&config.logging);
    tracing::debug!(endpoint = %config.endpoint, index = %config.index, "Configuration loaded");

    let client = SearchClient::new(config)?;

    match cli.command {
        Commands::Search { command } => commands::search::run(&client, command, cli.json).await?,
        Commands::Aggregate { command } => {
            commands::aggregate::run(&client, command, cli.json).await?
        }
        Commands::Indices => commands::admin::run_indices(&client, cli.json).await?,
        Commands::IndexData { file } => commands::admin::run_index_data(&client, &file).await?,
        Commands::Mapping => commands::admin::run_mapping(&client).await?,
        Commands::DeleteIndex => commands::admin::run_delete_index(&client).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sift",
            "search",
            "term",
            "sodium",
            "0",
            "--index",
            "meals",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.index.as_deref(), Some("meals"));
        assert!(cli.json);
    }
}
