//! StorageBackend trait definition.
//!
//! This trait is the whole surface the table writer needs from the remote
//! storage service: token introspection plus create, drop, describe and load
//! operations on tables inside a bucket.

use crate::error::Result;
use crate::types::{CreateTableOptions, TableDetail, TokenInfo, WriteTableOptions};
use std::path::Path;

/// Trait for talking to the remote tabular storage service.
///
/// # Usage Pattern
///
/// The writer is generic over the backend so that the HTTP client and test
/// fakes are statically dispatched:
///
/// ```ignore
/// pub async fn synchronize<S: StorageBackend>(storage: &S, ...) -> Result<SyncOutcome> {
///     storage.write_table(&table_id, &path, &WriteTableOptions { incremental }).await?;
/// }
/// ```
///
/// Every call completes (success or failure) before the next one is issued;
/// implementations are not expected to retry.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Return the permissions and owning project of the configured token.
    async fn verify_token(&self) -> Result<TokenInfo>;

    /// Describe an existing table.
    ///
    /// Fails with `StorageError::NotFound` when the table does not exist.
    async fn describe_table(&self, table_id: &str) -> Result<TableDetail>;

    /// Drop a table.
    ///
    /// Fails with `StorageError::NotFound` when the table does not exist.
    async fn drop_table(&self, table_id: &str) -> Result<()>;

    /// Create `name` inside `bucket_id` from the CSV file at `data`.
    ///
    /// Returns the id of the created table.
    async fn create_table(
        &self,
        bucket_id: &str,
        name: &str,
        data: &Path,
        options: &CreateTableOptions,
    ) -> Result<String>;

    /// Load the CSV file at `data` into an existing table.
    async fn write_table(
        &self,
        table_id: &str,
        data: &Path,
        options: &WriteTableOptions,
    ) -> Result<()>;

    /// Check whether a table exists.
    async fn table_exists(&self, table_id: &str) -> Result<bool> {
        match self.describe_table(table_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::types::Owner;

    /// Backend that only knows about a single table.
    struct SingleTable;

    #[async_trait::async_trait]
    impl StorageBackend for SingleTable {
        async fn verify_token(&self) -> Result<TokenInfo> {
            Ok(TokenInfo {
                bucket_permissions: Default::default(),
                owner: Owner {
                    id: 1,
                    name: "test".to_string(),
                },
            })
        }

        async fn describe_table(&self, table_id: &str) -> Result<TableDetail> {
            match table_id {
                "in.c-main.orders" => Ok(TableDetail {
                    id: table_id.to_string(),
                    name: "orders".to_string(),
                    ..Default::default()
                }),
                "in.c-main.broken" => Err(StorageError::Transport("connection reset".to_string())),
                _ => Err(StorageError::NotFound(format!(
                    "The table \"{table_id}\" was not found"
                ))),
            }
        }

        async fn drop_table(&self, _table_id: &str) -> Result<()> {
            Ok(())
        }

        async fn create_table(
            &self,
            bucket_id: &str,
            name: &str,
            _data: &Path,
            _options: &CreateTableOptions,
        ) -> Result<String> {
            Ok(format!("{bucket_id}.{name}"))
        }

        async fn write_table(
            &self,
            _table_id: &str,
            _data: &Path,
            _options: &WriteTableOptions,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_table_exists_default() {
        let backend = SingleTable;
        assert!(backend.table_exists("in.c-main.orders").await.unwrap());
        assert!(!backend.table_exists("in.c-main.missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_table_exists_propagates_other_failures() {
        let backend = SingleTable;
        let err = backend.table_exists("in.c-main.broken").await.unwrap_err();
        assert!(matches!(err, StorageError::Transport(_)));
    }
}
