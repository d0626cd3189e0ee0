//! HTTP client for the tabular storage service.
//!
//! `StorageClient` implements [`storage_sink::StorageBackend`] on top of the
//! service's REST API. Tokens are sent in the `X-StorageApi-Token` header and
//! CSV data is uploaded as a multipart `data` part.
//!
//! # Example
//!
//! ```ignore
//! use storage_client::{StorageClient, StorageClientOpts};
//! use storage_sink::StorageBackend;
//!
//! let client = StorageClient::new(&StorageClientOpts {
//!     url: "https://connection.keboola.com".to_string(),
//!     token: token.to_string(),
//!     ..Default::default()
//! })?;
//! let info = client.verify_token().await?;
//! ```

mod client;
mod opts;

pub use client::StorageClient;
pub use opts::StorageClientOpts;
