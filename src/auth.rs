//! Token authorization gate
//!
//! The writer only accepts tokens that can write into exactly one bucket and
//! nothing else. The bucket the token is scoped to becomes the destination of
//! every table.

use crate::error::{Result, WriterError};
use storage_sink::{StorageBackend, TokenInfo};
use tracing::info;

/// The only permission level accepted on the authorized bucket.
pub const WRITE_PERMISSION: &str = "write";

/// Bucket and project the token is authorized for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub authorized_bucket: String,
    pub project_id: i64,
    pub project_name: String,
}

impl Authorization {
    /// Fully qualified id of a table inside the authorized bucket.
    pub fn table_id(&self, table_name: &str) -> String {
        format!("{}.{table_name}", self.authorized_bucket)
    }
}

/// Verify the token and derive the authorized bucket.
pub async fn authorize<S: StorageBackend>(storage: &S) -> Result<Authorization> {
    let token_info = storage.verify_token().await?;
    let authorization = authorization_from_token(token_info)?;

    info!(
        "Authorized for project \"{}\" ({}), bucket \"{}\"",
        authorization.project_name, authorization.project_id, authorization.authorized_bucket
    );

    Ok(authorization)
}

/// Validate the permission set of a verified token.
///
/// Exactly one bucket must be granted, with exactly `write` access.
pub fn authorization_from_token(token_info: TokenInfo) -> Result<Authorization> {
    let mut permissions = token_info.bucket_permissions.into_iter();
    let (bucket, permission) = match (permissions.next(), permissions.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(WriterError::Authorization(
                "The token must have write permissions to a single bucket only.".to_string(),
            ))
        }
    };

    if permission != WRITE_PERMISSION {
        return Err(WriterError::Authorization(format!(
            "The token must have only write permissions to the bucket \"{bucket}\"."
        )));
    }

    Ok(Authorization {
        authorized_bucket: bucket,
        project_id: token_info.owner.id,
        project_name: token_info.owner.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingStorage};
    use storage_sink::Owner;

    fn token(permissions: &[(&str, &str)]) -> TokenInfo {
        TokenInfo {
            bucket_permissions: permissions
                .iter()
                .map(|(b, p)| (b.to_string(), p.to_string()))
                .collect(),
            owner: Owner {
                id: 7,
                name: "acme".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_token() {
        let auth = authorization_from_token(token(&[("in.c-main", "write")])).unwrap();
        assert_eq!(auth.authorized_bucket, "in.c-main");
        assert_eq!(auth.project_id, 7);
        assert_eq!(auth.project_name, "acme");
        assert_eq!(auth.table_id("orders"), "in.c-main.orders");
    }

    #[test]
    fn test_invalid_tokens() {
        let cases: Vec<(Vec<(&str, &str)>, &str)> = vec![
            (
                vec![("in.some-bucket", "manage")],
                "The token must have only write permissions to the bucket \"in.some-bucket\".",
            ),
            (
                vec![("in.some-bucket", "read")],
                "The token must have only write permissions to the bucket \"in.some-bucket\".",
            ),
            (
                vec![("in.some-bucket", "write"), ("out.another-bucket", "read")],
                "The token must have write permissions to a single bucket only.",
            ),
            (
                vec![("in.a", "write"), ("in.b", "write")],
                "The token must have write permissions to a single bucket only.",
            ),
            (
                vec![],
                "The token must have write permissions to a single bucket only.",
            ),
        ];

        for (permissions, message) in cases {
            let err = authorization_from_token(token(&permissions)).unwrap_err();
            assert!(matches!(err, WriterError::Authorization(_)));
            assert_eq!(err.to_string(), message);
        }
    }

    #[tokio::test]
    async fn test_authorize_propagates_remote_failure() {
        let storage = RecordingStorage::rejecting_token("Invalid access token");
        let err = authorize(&storage).await.unwrap_err();
        assert!(matches!(err, WriterError::Remote(_)));
        assert_eq!(err.to_string(), "Invalid access token");
    }

    #[tokio::test]
    async fn test_authorize_uses_storage() {
        let storage = RecordingStorage::new(token(&[("in.c-main", "write")]));
        let auth = authorize(&storage).await.unwrap();
        assert_eq!(auth.authorized_bucket, "in.c-main");
        assert_eq!(storage.calls(), vec![Call::VerifyToken]);
    }
}
