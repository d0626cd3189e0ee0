//! Table manifest sidecars
//!
//! Every table file `in/tables/<name>` may be accompanied by
//! `in/tables/<name>.manifest`, a JSON document declaring the table's primary
//! key. A missing or empty manifest declares no key.

use crate::error::{Result, WriterError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Extension of manifest sidecar files.
pub const MANIFEST_EXTENSION: &str = "manifest";

/// Metadata declared for a source table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TableManifest {
    /// Ordered primary key column names
    #[serde(default, deserialize_with = "null_as_empty")]
    pub primary_key: Vec<String>,
}

/// Path of the manifest belonging to `table_path`.
pub fn manifest_path(table_path: &Path) -> PathBuf {
    let mut path = table_path.as_os_str().to_owned();
    path.push(".");
    path.push(MANIFEST_EXTENSION);
    PathBuf::from(path)
}

/// Whether `path` names a manifest sidecar rather than table data.
pub fn is_manifest(path: &Path) -> bool {
    // `Path::extension` is `None` for a bare `.manifest` file name
    path.file_name()
        .map(|name| {
            name.to_string_lossy()
                .ends_with(&format!(".{MANIFEST_EXTENSION}"))
        })
        .unwrap_or(false)
}

/// Read the manifest of the table stored at `table_path`.
pub async fn read_manifest(table_path: &Path) -> Result<TableManifest> {
    let path = manifest_path(table_path);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No manifest at {}", path.display());
            return Ok(TableManifest::default());
        }
        Err(e) => return Err(e.into()),
    };

    parse_manifest(&content).map_err(|message| WriterError::Manifest { path, message })
}

fn parse_manifest(content: &str) -> std::result::Result<TableManifest, String> {
    if content.trim().is_empty() {
        return Ok(TableManifest::default());
    }
    let manifest: Option<TableManifest> =
        serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(manifest.unwrap_or_default())
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_path() {
        assert_eq!(
            manifest_path(Path::new("/data/in/tables/orders")),
            PathBuf::from("/data/in/tables/orders.manifest")
        );
        assert_eq!(
            manifest_path(Path::new("/data/in/tables/orders.csv")),
            PathBuf::from("/data/in/tables/orders.csv.manifest")
        );
    }

    #[test]
    fn test_is_manifest() {
        assert!(is_manifest(Path::new("orders.manifest")));
        assert!(is_manifest(Path::new("orders.csv.manifest")));
        assert!(is_manifest(Path::new(".manifest")));
        assert!(is_manifest(Path::new("in/tables/.manifest")));
        assert!(!is_manifest(Path::new("orders")));
        assert!(!is_manifest(Path::new("orders.csv")));
        assert!(!is_manifest(Path::new("manifest")));
    }

    #[test]
    fn test_parse_manifest_variants() {
        assert_eq!(
            parse_manifest(r#"{"primary_key": ["id", "region"]}"#).unwrap().primary_key,
            vec!["id", "region"]
        );
        assert!(parse_manifest("").unwrap().primary_key.is_empty());
        assert!(parse_manifest("  \n").unwrap().primary_key.is_empty());
        assert!(parse_manifest("{}").unwrap().primary_key.is_empty());
        assert!(parse_manifest("null").unwrap().primary_key.is_empty());
        assert!(parse_manifest(r#"{"primary_key": null}"#).unwrap().primary_key.is_empty());
        assert!(
            parse_manifest(r#"{"primary_key": [], "incremental": true, "columns": ["id"]}"#)
                .unwrap()
                .primary_key
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_read_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = read_manifest(&dir.path().join("orders")).await.unwrap();
        assert!(manifest.primary_key.is_empty());
    }

    #[tokio::test]
    async fn test_read_malformed_manifest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("orders.manifest"), "{not json").unwrap();
        let err = read_manifest(&dir.path().join("orders")).await.unwrap_err();
        assert!(matches!(err, WriterError::Manifest { .. }));
        assert!(err.to_string().contains("orders.manifest"));
    }
}
