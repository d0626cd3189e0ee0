use thiserror::Error;

/// Failure reported by a storage backend.
///
/// `NotFound` is kept apart from every other kind so that callers can
/// tolerate a missing table without inspecting status codes.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The addressed table (or bucket) does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The token was rejected by the service.
    #[error("{0}")]
    Unauthorized(String),

    /// Any other rejection returned by the service, message kept verbatim.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Storage request failed: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_is_verbatim() {
        let err = StorageError::Api {
            status: 400,
            code: Some("csvImport.columnsNotMatch".to_string()),
            message: "Some columns are missing in the csv file. Missing columns: boo.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Some columns are missing in the csv file. Missing columns: boo."
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_kind() {
        let err = StorageError::NotFound("The table \"in.c-main.x\" was not found".to_string());
        assert!(err.is_not_found());
        assert!(!StorageError::Unauthorized("Invalid access token".to_string()).is_not_found());
    }
}
