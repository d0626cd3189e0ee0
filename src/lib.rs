//! Storage Writer Library
//!
//! Writes local CSV tables into a single bucket of a multi-tenant tabular
//! storage service.
//!
//! # Features
//!
//! - Single-bucket tokens: the token must grant `write` on exactly one bucket,
//!   which becomes the destination of every table
//! - Three modes: `replace` (default) overwrites rows, `update` upserts by
//!   primary key, `recreate` drops and creates the table
//! - Primary key guard: an existing table is only written when its primary
//!   key equals the one declared in the table's manifest
//! - Fail fast: tables are processed in order and the first failure stops the run
//!
//! # CLI Usage
//!
//! ```bash
//! # Synchronize the tables declared in /data/config.json
//! storage-writer --data-dir /data run
//!
//! # Print the authorized bucket and project as JSON
//! storage-writer --data-dir /data info
//! ```

pub mod auth;
pub mod component;
pub mod config;
pub mod error;
pub mod manifest;
pub mod sync;
pub mod tables;
pub mod testing;

pub use auth::{authorize, Authorization};
pub use component::{execute, Action, ActionOutput, InfoResult, TableReport};
pub use config::{Config, InputTable};
pub use error::{Result, WriterError};
pub use sync::{synchronize, SyncMode, SyncOutcome};
pub use tables::{resolve_tables, TableDescriptor};
