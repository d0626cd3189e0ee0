//! In-memory storage backend for tests
//!
//! `RecordingStorage` keeps tables in a map, records every call in order and
//! can be told to fail the next call of a given operation.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;
use storage_sink::{
    CreateTableOptions, Owner, Result, StorageBackend, StorageError, TableDetail, TokenInfo,
    WriteTableOptions,
};

/// A call received by [`RecordingStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    VerifyToken,
    Describe {
        table_id: String,
    },
    Drop {
        table_id: String,
    },
    Create {
        bucket: String,
        name: String,
        primary_key: Vec<String>,
    },
    Write {
        table_id: String,
        incremental: bool,
    },
}

impl Call {
    /// Name of the backend operation.
    pub fn operation(&self) -> &'static str {
        match self {
            Call::VerifyToken => "verify_token",
            Call::Describe { .. } => "describe_table",
            Call::Drop { .. } => "drop_table",
            Call::Create { .. } => "create_table",
            Call::Write { .. } => "write_table",
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Call::Drop { .. } | Call::Create { .. } | Call::Write { .. })
    }
}

#[derive(Default)]
struct State {
    tables: BTreeMap<String, TableDetail>,
    calls: Vec<Call>,
    failures: HashMap<&'static str, StorageError>,
}

/// Storage backend fake that records calls.
pub struct RecordingStorage {
    token: std::result::Result<TokenInfo, String>,
    state: Mutex<State>,
}

impl RecordingStorage {
    pub fn new(token_info: TokenInfo) -> Self {
        Self {
            token: Ok(token_info),
            state: Mutex::new(State::default()),
        }
    }

    /// Token with `write` access to `bucket`, owned by project 7 "acme".
    pub fn with_bucket(bucket: &str) -> Self {
        Self::new(TokenInfo {
            bucket_permissions: [(bucket.to_string(), "write".to_string())]
                .into_iter()
                .collect(),
            owner: Owner {
                id: 7,
                name: "acme".to_string(),
            },
        })
    }

    /// Backend whose token verification is rejected with `message`.
    pub fn rejecting_token(message: &str) -> Self {
        Self {
            token: Err(message.to_string()),
            state: Mutex::new(State::default()),
        }
    }

    /// Register an existing table.
    pub fn add_table(&self, table_id: &str, primary_key: &[&str], columns: &[&str]) {
        let name = table_id.rsplit('.').next().unwrap_or(table_id).to_string();
        self.state().tables.insert(
            table_id.to_string(),
            TableDetail {
                id: table_id.to_string(),
                name,
                primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
            },
        );
    }

    /// Current state of a table, if it exists.
    pub fn table(&self, table_id: &str) -> Option<TableDetail> {
        self.state().tables.get(table_id).cloned()
    }

    /// Fail the next call of `operation` (e.g. `"drop_table"`) with `error`.
    pub fn fail_next(&self, operation: &'static str, error: StorageError) {
        self.state().failures.insert(operation, error);
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Drop, create and write calls received so far, in order.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    /// Number of calls of `operation` received so far.
    pub fn count(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: Call) -> Result<()> {
        let mut state = self.state();
        let operation = call.operation();
        state.calls.push(call);
        match state.failures.remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn not_found(table_id: &str) -> StorageError {
    StorageError::NotFound(format!("The table \"{table_id}\" was not found"))
}

#[async_trait::async_trait]
impl StorageBackend for RecordingStorage {
    async fn verify_token(&self) -> Result<TokenInfo> {
        self.record(Call::VerifyToken)?;
        self.token
            .clone()
            .map_err(StorageError::Unauthorized)
    }

    async fn describe_table(&self, table_id: &str) -> Result<TableDetail> {
        self.record(Call::Describe {
            table_id: table_id.to_string(),
        })?;
        self.table(table_id).ok_or_else(|| not_found(table_id))
    }

    async fn drop_table(&self, table_id: &str) -> Result<()> {
        self.record(Call::Drop {
            table_id: table_id.to_string(),
        })?;
        self.state()
            .tables
            .remove(table_id)
            .map(|_| ())
            .ok_or_else(|| not_found(table_id))
    }

    async fn create_table(
        &self,
        bucket_id: &str,
        name: &str,
        _data: &Path,
        options: &CreateTableOptions,
    ) -> Result<String> {
        self.record(Call::Create {
            bucket: bucket_id.to_string(),
            name: name.to_string(),
            primary_key: options.primary_key.clone(),
        })?;

        let table_id = format!("{bucket_id}.{name}");
        let mut state = self.state();
        if state.tables.contains_key(&table_id) {
            return Err(StorageError::Api {
                status: 400,
                code: Some("storage.buckets.tableAlreadyExists".to_string()),
                message: format!("The table \"{name}\" already exists."),
            });
        }
        state.tables.insert(
            table_id.clone(),
            TableDetail {
                id: table_id.clone(),
                name: name.to_string(),
                primary_key: options.primary_key.clone(),
                columns: Vec::new(),
            },
        );
        Ok(table_id)
    }

    async fn write_table(
        &self,
        table_id: &str,
        _data: &Path,
        options: &WriteTableOptions,
    ) -> Result<()> {
        self.record(Call::Write {
            table_id: table_id.to_string(),
            incremental: options.incremental,
        })?;
        if self.state().tables.contains_key(table_id) {
            Ok(())
        } else {
            Err(not_found(table_id))
        }
    }
}
