//! Error types for the storage writer.

use std::path::PathBuf;
use storage_sink::StorageError;
use thiserror::Error;

/// Failures of a writer run.
///
/// Every variant except a local I/O failure is user-actionable; see
/// [`WriterError::is_user_error`].
#[derive(Error, Debug)]
pub enum WriterError {
    /// The token is scoped to the wrong buckets or permission level.
    #[error("{0}")]
    Authorization(String),

    /// An existing destination table has a different primary key.
    #[error(
        "Primary key in the destination table \"{table}\" - {} does not match the primary key in the source table - {}.",
        render_key(.remote),
        render_key(.local)
    )]
    PrimaryKeyMismatch {
        table: String,
        remote: Vec<String>,
        local: Vec<String>,
    },

    /// Rejection or failure reported by the storage service.
    #[error(transparent)]
    Remote(#[from] StorageError),

    #[error("{0}")]
    Configuration(String),

    #[error("Unknown action \"{0}\".")]
    UnknownAction(String),

    #[error("Invalid manifest \"{}\": {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WriterError {
    /// Whether the failure is caused by configuration or remote state rather
    /// than by the writer itself.
    pub fn is_user_error(&self) -> bool {
        // The client reads table files itself, so its I/O errors are local too
        !matches!(
            self,
            WriterError::Io(_) | WriterError::Remote(StorageError::Io(_))
        )
    }
}

/// Render a key as a compact JSON array, e.g. `["name","id"]`.
fn render_key(key: &[String]) -> String {
    serde_json::to_string(key).unwrap_or_else(|_| format!("{key:?}"))
}

pub type Result<T> = std::result::Result<T, WriterError>;
