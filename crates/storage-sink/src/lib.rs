//! Storage service sink trait abstraction.
//!
//! This crate defines the `StorageBackend` trait that the table writer drives.
//! The HTTP implementation lives in `storage-client`; tests use in-memory
//! fakes. The trait only speaks in plain value types so that the writer never
//! couples to a particular transport.

mod error;
mod traits;
mod types;

pub use error::{Result, StorageError};
pub use traits::StorageBackend;
pub use types::{CreateTableOptions, Owner, TableDetail, TokenInfo, WriteTableOptions};
