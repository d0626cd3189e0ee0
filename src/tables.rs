//! Table descriptor resolution
//!
//! Turns the configured input tables (or, when none are configured, the files
//! found in `in/tables`) into the ordered list of tables to synchronize.

use crate::config::InputTable;
use crate::error::{Result, WriterError};
use crate::manifest::{is_manifest, read_manifest};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A source table ready to be synchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Name of the destination table inside the authorized bucket
    pub destination_name: String,

    /// Declared primary key, possibly empty
    pub primary_key: Vec<String>,

    /// CSV file holding the table data
    pub source_path: PathBuf,

    /// Columns of the CSV header
    pub columns: Vec<String>,
}

/// Resolve the tables to synchronize, in synchronization order.
///
/// Declared tables keep their declaration order. Without declarations every
/// regular non-manifest file directly under `tables_dir` is a table, sorted
/// by file name.
pub async fn resolve_tables(
    input_tables: &[InputTable],
    tables_dir: &Path,
) -> Result<Vec<TableDescriptor>> {
    let names = if input_tables.is_empty() {
        discover_tables(tables_dir).await?
    } else {
        input_tables
            .iter()
            .map(|t| t.destination.clone())
            .collect()
    };

    let mut descriptors = Vec::with_capacity(names.len());
    for name in names {
        let descriptor = describe_source(tables_dir, &name).await?;
        debug!(
            "Resolved table {} (primary key: {:?}, columns: {:?})",
            descriptor.destination_name, descriptor.primary_key, descriptor.columns
        );
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}

/// List table files under `tables_dir`, sorted by name.
pub async fn discover_tables(tables_dir: &Path) -> Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(tables_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Input tables directory {} does not exist", tables_dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() || is_manifest(&path) {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }

    // Directory listing order is platform dependent
    names.sort();

    debug!(
        "Discovered {} tables in {}",
        names.len(),
        tables_dir.display()
    );

    Ok(names)
}

/// Build the descriptor of the table stored as `tables_dir/name`.
pub async fn describe_source(tables_dir: &Path, name: &str) -> Result<TableDescriptor> {
    let source_path = tables_dir.join(name);
    if !tokio::fs::try_exists(&source_path).await? {
        return Err(WriterError::Configuration(format!(
            "Source file for table \"{name}\" not found at \"{}\".",
            source_path.display()
        )));
    }

    let manifest = read_manifest(&source_path).await?;
    let columns = read_header(&source_path);

    Ok(TableDescriptor {
        destination_name: name.to_string(),
        primary_key: manifest.primary_key,
        source_path,
        columns,
    })
}

/// Read the header row of a CSV file.
///
/// Columns are informational only, so an unreadable header yields no columns
/// and leaves the file to the storage service.
fn read_header(path: &Path) -> Vec<String> {
    let mut reader = match csv::ReaderBuilder::new().has_headers(true).from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            warn!("Failed to open {} to read its header: {e}", path.display());
            return Vec::new();
        }
    };

    match reader.byte_headers() {
        Ok(headers) => headers
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect(),
        Err(e) => {
            warn!("Failed to read CSV header of {}: {e}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_table(dir: &Path, name: &str, manifest: Option<&str>) {
        std::fs::write(dir.join(name), "\"id\",\"name\"\n\"1\",\"Bar\"\n").unwrap();
        if let Some(manifest) = manifest {
            std::fs::write(dir.join(format!("{name}.manifest")), manifest).unwrap();
        }
    }

    #[tokio::test]
    async fn test_declared_tables_keep_order() {
        let dir = TempDir::new().unwrap();
        write_table(dir.path(), "zeta", Some(r#"{"primary_key": ["id"]}"#));
        write_table(dir.path(), "alpha", None);

        let declared = vec![
            InputTable {
                source: Some("in.c-main.zeta".to_string()),
                destination: "zeta".to_string(),
            },
            InputTable {
                source: None,
                destination: "alpha".to_string(),
            },
        ];
        let tables = resolve_tables(&declared, dir.path()).await.unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].destination_name, "zeta");
        assert_eq!(tables[0].primary_key, vec!["id"]);
        assert_eq!(tables[0].columns, vec!["id", "name"]);
        assert_eq!(tables[0].source_path, dir.path().join("zeta"));
        assert_eq!(tables[1].destination_name, "alpha");
        assert!(tables[1].primary_key.is_empty());
    }

    #[tokio::test]
    async fn test_discovery_skips_manifests_and_directories() {
        let dir = TempDir::new().unwrap();
        write_table(dir.path(), "orders", Some(r#"{"primary_key": ["id"]}"#));
        write_table(dir.path(), "customers", Some(""));
        write_table(dir.path(), "b-items", None);
        std::fs::create_dir(dir.path().join("sliced")).unwrap();

        let tables = resolve_tables(&[], dir.path()).await.unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.destination_name.as_str()).collect();

        assert_eq!(names, vec!["b-items", "customers", "orders"]);
        assert!(tables[1].primary_key.is_empty());
        assert_eq!(tables[2].primary_key, vec!["id"]);
    }

    #[tokio::test]
    async fn test_discovery_skips_bare_manifest_file() {
        let dir = TempDir::new().unwrap();
        write_table(dir.path(), "orders", None);
        std::fs::write(dir.path().join(".manifest"), "{}").unwrap();

        let names = discover_tables(dir.path()).await.unwrap();
        assert_eq!(names, vec!["orders"]);
    }

    #[tokio::test]
    async fn test_latin1_header_does_not_fail_resolution() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("orders"), b"\"id\",\"n\xe9m\"\n\"1\",\"x\"\n").unwrap();

        let tables = resolve_tables(&[], dir.path()).await.unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].destination_name, "orders");
        assert_eq!(tables[0].columns, vec!["id", "n\u{FFFD}m"]);
    }

    #[tokio::test]
    async fn test_discovery_without_directory() {
        let dir = TempDir::new().unwrap();
        let tables = resolve_tables(&[], &dir.path().join("missing")).await.unwrap();
        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_declared_table_without_file() {
        let dir = TempDir::new().unwrap();
        let declared = vec![InputTable {
            source: None,
            destination: "ghost".to_string(),
        }];
        let err = resolve_tables(&declared, dir.path()).await.unwrap_err();
        assert!(matches!(err, WriterError::Configuration(_)));
        assert!(err.to_string().contains("\"ghost\""));
    }
}
