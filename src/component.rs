//! Writer component
//!
//! Dispatches the configured action. `run` authorizes the token, resolves the
//! input tables and synchronizes them one by one; the first failing table
//! stops the run. `info` only authorizes and reports the target.

use crate::auth::{authorize, Authorization};
use crate::config::Config;
use crate::error::{Result, WriterError};
use crate::sync::{synchronize, SyncOutcome};
use crate::tables::resolve_tables;
use serde::Serialize;
use std::str::FromStr;
use storage_sink::StorageBackend;
use tracing::{info, warn};

/// Action requested by the configuration or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Synchronize the input tables
    Run,
    /// Report the authorized bucket and project
    Info,
}

impl FromStr for Action {
    type Err = WriterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "run" => Ok(Action::Run),
            "info" => Ok(Action::Info),
            other => Err(WriterError::UnknownAction(other.to_string())),
        }
    }
}

/// Target of the writer, as reported by the `info` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResult {
    pub bucket: String,
    pub project_id: i64,
    pub project_name: String,
}

impl From<Authorization> for InfoResult {
    fn from(authorization: Authorization) -> Self {
        Self {
            bucket: authorization.authorized_bucket,
            project_id: authorization.project_id,
            project_name: authorization.project_name,
        }
    }
}

/// Result of one synchronized table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub destination: String,
    pub outcome: SyncOutcome,
}

/// Output of an executed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutput {
    Run(Vec<TableReport>),
    Info(InfoResult),
}

/// Execute the action named in `config`.
pub async fn execute<S: StorageBackend>(config: &Config, storage: &S) -> Result<ActionOutput> {
    match config.action.parse::<Action>()? {
        Action::Run => run(config, storage).await.map(ActionOutput::Run),
        Action::Info => info(storage).await.map(ActionOutput::Info),
    }
}

/// Synchronize all input tables into the authorized bucket.
pub async fn run<S: StorageBackend>(config: &Config, storage: &S) -> Result<Vec<TableReport>> {
    let authorization = authorize(storage).await?;

    if let Some(bucket) = &config.legacy_bucket {
        if bucket != &authorization.authorized_bucket {
            warn!(
                "Ignoring the \"bucket\" parameter \"{bucket}\", writing into the authorized bucket \"{}\"",
                authorization.authorized_bucket
            );
        }
    }

    let tables = resolve_tables(&config.input_tables, &config.tables_dir()).await?;
    info!(
        "Synchronizing {} tables in {} mode",
        tables.len(),
        config.mode
    );

    let mut reports = Vec::with_capacity(tables.len());
    for table in &tables {
        info!("Processing table {}", table.destination_name);
        let outcome = synchronize(storage, &authorization, table, config.mode).await?;
        info!("Table {} {outcome}", table.destination_name);
        reports.push(TableReport {
            destination: table.destination_name.clone(),
            outcome,
        });
    }

    info!("All done.");
    Ok(reports)
}

/// Report the bucket and project the token is authorized for.
pub async fn info<S: StorageBackend>(storage: &S) -> Result<InfoResult> {
    Ok(authorize(storage).await?.into())
}
