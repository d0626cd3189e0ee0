//! Connection options for the storage service.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Credential and endpoint of the storage service.
#[derive(Clone)]
pub struct StorageClientOpts {
    /// Service base URL, e.g. `https://connection.keboola.com`
    pub url: String,

    /// Storage API token
    pub token: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for StorageClientOpts {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for StorageClientOpts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClientOpts")
            .field("url", &self.url)
            .field("token", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}
