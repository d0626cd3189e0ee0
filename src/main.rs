//! Command-line interface for storage-writer
//!
//! # Usage Examples
//!
//! ```bash
//! # Run the action named in /data/config.json ("run" when absent)
//! storage-writer --data-dir /data
//!
//! # Synchronize tables regardless of the configured action
//! storage-writer --data-dir /data run
//!
//! # Report the target bucket and project
//! KBC_DATADIR=/data storage-writer info
//! ```
//!
//! Exit codes: `0` on success, `1` on user errors (configuration, token
//! scope, primary key mismatch, storage rejections), `2` on internal errors.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use storage_client::StorageClient;
use storage_writer::{execute, ActionOutput, Config, WriterError};

#[derive(Parser)]
#[command(name = "storage-writer")]
#[command(about = "Write local tables into a single bucket of the storage service")]
#[command(long_about = None)]
struct Cli {
    /// Data directory holding config.json and in/tables
    #[arg(long, env = "KBC_DATADIR", default_value = "/data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize the input tables into the authorized bucket
    Run,
    /// Print the authorized bucket and project as JSON
    Info,
}

impl Commands {
    fn action(&self) -> &'static str {
        match self {
            Commands::Run => "run",
            Commands::Info => "info",
        }
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so that `info` output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        let code = match e.downcast_ref::<WriterError>() {
            Some(err) if err.is_user_error() => 1,
            _ => 2,
        };
        std::process::exit(code);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.data_dir)?;
    if let Some(command) = &cli.command {
        config.action = command.action().to_string();
    }
    tracing::debug!("Loaded configuration: {config:?}");

    let storage = StorageClient::new(&config.storage_opts()).map_err(WriterError::from)?;

    match execute(&config, &storage).await? {
        ActionOutput::Run(reports) => {
            tracing::debug!("Synchronized {} tables", reports.len());
        }
        ActionOutput::Info(result) => {
            let json = serde_json::to_string(&result).context("Failed to serialize info result")?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("Failed to write info result")?;
        }
    }

    Ok(())
}
