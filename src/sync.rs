//! Table synchronization engine
//!
//! Decides, for one source table, how the destination table in the authorized
//! bucket is brought up to date:
//!
//! - `recreate`: drop the destination (a missing table is fine), then create
//!   it from the source.
//! - `replace` / `update`: create the destination when it does not exist.
//!   Otherwise verify that its primary key equals the declared one and load
//!   the data, replacing all rows (`replace`) or upserting by primary key
//!   (`update`).
//!
//! Per table the engine issues either a drop (`recreate`) or a single probe,
//! followed by one create or write. It never retries and performs no column
//! validation: a schema mismatch surfaces as
//! the storage service's own rejection.

use crate::auth::Authorization;
use crate::error::{Result, WriterError};
use crate::tables::TableDescriptor;
use std::fmt;
use std::str::FromStr;
use storage_sink::{CreateTableOptions, StorageBackend, WriteTableOptions};
use tracing::{debug, warn};

/// How destination tables are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Upsert rows into the existing table by primary key
    Update,
    /// Replace all rows of the existing table
    #[default]
    Replace,
    /// Drop and create the table from scratch
    Recreate,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Update => "update",
            SyncMode::Replace => "replace",
            SyncMode::Recreate => "recreate",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "update" => Ok(SyncMode::Update),
            "replace" => Ok(SyncMode::Replace),
            "recreate" => Ok(SyncMode::Recreate),
            other => Err(format!("Invalid mode: '{other}'")),
        }
    }
}

/// What happened to a destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The table did not exist and was created
    Created,
    /// The table was dropped (if present) and created again
    Recreated,
    /// All rows of the existing table were replaced
    Replaced,
    /// Rows were upserted into the existing table
    Updated,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncOutcome::Created => "created",
            SyncOutcome::Recreated => "recreated",
            SyncOutcome::Replaced => "replaced",
            SyncOutcome::Updated => "updated",
        };
        f.write_str(s)
    }
}

/// Destination table as seen by the storage service right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteTableState {
    pub exists: bool,
    pub primary_key: Vec<String>,
    pub columns: Vec<String>,
}

/// Probe the destination table.
pub async fn remote_state<S: StorageBackend>(
    storage: &S,
    table_id: &str,
) -> Result<RemoteTableState> {
    match storage.describe_table(table_id).await {
        Ok(detail) => Ok(RemoteTableState {
            exists: true,
            primary_key: detail.primary_key,
            columns: detail.columns,
        }),
        Err(e) if e.is_not_found() => Ok(RemoteTableState::default()),
        Err(e) => Err(e.into()),
    }
}

/// Synchronize one source table into the authorized bucket.
pub async fn synchronize<S: StorageBackend>(
    storage: &S,
    authorization: &Authorization,
    table: &TableDescriptor,
    mode: SyncMode,
) -> Result<SyncOutcome> {
    let table_id = authorization.table_id(&table.destination_name);

    if mode == SyncMode::Recreate {
        match storage.drop_table(&table_id).await {
            Ok(()) => debug!("Dropped table {table_id}"),
            Err(e) if e.is_not_found() => {
                warn!("Table {table_id} does not exist, nothing to drop");
            }
            Err(e) => return Err(e.into()),
        }
        create(storage, authorization, table).await?;
        return Ok(SyncOutcome::Recreated);
    }

    let remote = remote_state(storage, &table_id).await?;
    if !remote.exists {
        create(storage, authorization, table).await?;
        return Ok(SyncOutcome::Created);
    }

    if remote.primary_key != table.primary_key {
        return Err(WriterError::PrimaryKeyMismatch {
            table: table.destination_name.clone(),
            remote: remote.primary_key,
            local: table.primary_key.clone(),
        });
    }

    let incremental = mode == SyncMode::Update;
    debug!(
        "Writing into existing table {table_id} (columns: {:?}, incremental: {incremental})",
        remote.columns
    );
    storage
        .write_table(
            &table_id,
            &table.source_path,
            &WriteTableOptions { incremental },
        )
        .await?;

    Ok(if incremental {
        SyncOutcome::Updated
    } else {
        SyncOutcome::Replaced
    })
}

async fn create<S: StorageBackend>(
    storage: &S,
    authorization: &Authorization,
    table: &TableDescriptor,
) -> Result<()> {
    let created = storage
        .create_table(
            &authorization.authorized_bucket,
            &table.destination_name,
            &table.source_path,
            &CreateTableOptions {
                primary_key: table.primary_key.clone(),
            },
        )
        .await?;
    debug!("Created table {created}");
    Ok(())
}
