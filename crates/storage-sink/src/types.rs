//! Value types exchanged with a storage backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project that owns a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: i64,
    pub name: String,
}

/// Result of verifying a token against the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    /// Bucket id to permission level (`read`, `write`, `manage`, ...).
    ///
    /// The service sends `[]` instead of `{}` when the token has no bucket
    /// grants, so both shapes deserialize to an empty map.
    #[serde(default, deserialize_with = "permissions_or_empty_list")]
    pub bucket_permissions: BTreeMap<String, String>,
    pub owner: Owner,
}

/// Remote description of an existing table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDetail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Ordered; compared positionally.
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Options for creating a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTableOptions {
    pub primary_key: Vec<String>,
}

/// Options for loading data into an existing table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteTableOptions {
    /// Upsert by primary key instead of replacing all rows.
    pub incremental: bool,
}

fn permissions_or_empty_list<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Permissions {
        Map(BTreeMap<String, String>),
        List(Vec<serde::de::IgnoredAny>),
    }

    match Permissions::deserialize(deserializer)? {
        Permissions::Map(map) => Ok(map),
        Permissions::List(list) if list.is_empty() => Ok(BTreeMap::new()),
        Permissions::List(_) => Err(serde::de::Error::custom(
            "bucketPermissions must be an object",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_info_from_json() {
        let info: TokenInfo = serde_json::from_str(
            r#"{
                "id": "123",
                "bucketPermissions": {"in.c-main": "write"},
                "owner": {"id": 7, "name": "acme", "region": "us-east-1"}
            }"#,
        )
        .unwrap();
        assert_eq!(info.bucket_permissions.len(), 1);
        assert_eq!(info.bucket_permissions["in.c-main"], "write");
        assert_eq!(info.owner.id, 7);
        assert_eq!(info.owner.name, "acme");
    }

    #[test]
    fn test_token_info_empty_permissions_list() {
        let info: TokenInfo = serde_json::from_str(
            r#"{"bucketPermissions": [], "owner": {"id": 1, "name": "p"}}"#,
        )
        .unwrap();
        assert!(info.bucket_permissions.is_empty());
    }

    #[test]
    fn test_table_detail_keeps_key_order() {
        let detail: TableDetail = serde_json::from_str(
            r#"{"id": "in.c-main.orders", "name": "orders",
                "primaryKey": ["name", "id"], "columns": ["id", "name"]}"#,
        )
        .unwrap();
        assert_eq!(detail.primary_key, vec!["name", "id"]);
        assert_eq!(detail.columns, vec!["id", "name"]);
    }
}
