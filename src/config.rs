//! Writer configuration
//!
//! The writer reads `config.json` from its data directory:
//!
//! ```json
//! {
//!   "action": "run",
//!   "parameters": {"#token": "...", "url": "https://connection.keboola.com", "mode": "replace"},
//!   "image_parameters": {"url": "..."},
//!   "storage": {"input": {"tables": [{"source": "in.c-main.orders", "destination": "orders"}]}}
//! }
//! ```
//!
//! All option handling, including the legacy `incremental` flag, is resolved
//! here once; the rest of the crate only sees [`Config`].

use crate::error::{Result, WriterError};
use crate::sync::SyncMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use storage_client::StorageClientOpts;

/// File name of the configuration document inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Action executed when the configuration does not name one.
pub const DEFAULT_ACTION: &str = "run";

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    parameters: RawParameters,
    #[serde(default)]
    image_parameters: RawImageParameters,
    #[serde(default)]
    storage: RawStorage,
}

#[derive(Debug, Default, Deserialize)]
struct RawParameters {
    #[serde(rename = "#token", default)]
    token: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    incremental: Option<bool>,
    #[serde(default)]
    bucket: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawImageParameters {
    #[serde(rename = "#token", default)]
    token: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStorage {
    #[serde(default)]
    input: RawInput,
}

#[derive(Debug, Default, Deserialize)]
struct RawInput {
    #[serde(default)]
    tables: Vec<InputTable>,
}

/// Input table declared in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputTable {
    /// Table the platform exported the file from (informational)
    #[serde(default)]
    pub source: Option<String>,

    /// File name under `in/tables` and name of the destination table
    pub destination: String,
}

/// Resolved writer configuration.
#[derive(Clone)]
pub struct Config {
    /// Action name, resolved to [`crate::Action`] at dispatch
    pub action: String,

    /// Storage API token
    pub token: String,

    /// Storage API URL
    pub url: String,

    /// Effective synchronization mode
    pub mode: SyncMode,

    /// Legacy `bucket` parameter; the authorized bucket is always used instead
    pub legacy_bucket: Option<String>,

    /// Explicitly declared input tables, in declaration order
    pub input_tables: Vec<InputTable>,

    /// Data directory holding `config.json` and `in/tables`
    pub data_dir: PathBuf,
}

impl Config {
    /// Load `config.json` from `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            WriterError::Configuration(format!(
                "Failed to read configuration file \"{}\": {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content, data_dir)
    }

    /// Parse a configuration document.
    pub fn from_json(json: &str, data_dir: &Path) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)
            .map_err(|e| WriterError::Configuration(format!("Invalid configuration: {e}")))?;

        let token = required(
            non_empty(raw.image_parameters.token).or(raw.parameters.token),
            "parameters.#token",
        )?;
        let url = required(
            non_empty(raw.image_parameters.url).or(raw.parameters.url),
            "parameters.url",
        )?;
        let mode = resolve_mode(raw.parameters.incremental, raw.parameters.mode.as_deref())?;

        Ok(Self {
            action: raw.action.unwrap_or_else(|| DEFAULT_ACTION.to_string()),
            token,
            url,
            mode,
            legacy_bucket: raw.parameters.bucket.filter(|b| !b.is_empty()),
            input_tables: raw.storage.input.tables,
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Directory holding the input table files and their manifests.
    pub fn tables_dir(&self) -> PathBuf {
        self.data_dir.join("in").join("tables")
    }

    /// Connection options for the storage client.
    pub fn storage_opts(&self) -> StorageClientOpts {
        StorageClientOpts {
            url: self.url.clone(),
            token: self.token.clone(),
            ..Default::default()
        }
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("action", &self.action)
            .field("token", &"***")
            .field("url", &self.url)
            .field("mode", &self.mode)
            .field("legacy_bucket", &self.legacy_bucket)
            .field("input_tables", &self.input_tables)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required(value: Option<String>, path: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| {
        WriterError::Configuration(format!("Missing \"{path}\" in configuration."))
    })
}

/// Resolve the effective mode from the legacy `incremental` flag and `mode`.
///
/// A present `incremental` flag wins: `true` is `update`, `false` is
/// `replace`, and `mode` is not consulted. Without the flag, `mode` decides,
/// defaulting to `replace`.
pub fn resolve_mode(incremental: Option<bool>, mode: Option<&str>) -> Result<SyncMode> {
    match (incremental, mode) {
        (Some(true), _) => Ok(SyncMode::Update),
        (Some(false), _) => Ok(SyncMode::Replace),
        (None, None) => Ok(SyncMode::default()),
        (None, Some(mode)) => mode.parse::<SyncMode>().map_err(|_| {
            WriterError::Configuration(
                "Invalid configuration for path \"root.parameters.mode\": \
                 Mode must be one of \"recreate, replace, update\""
                    .to_string(),
            )
        }),
    }
}
