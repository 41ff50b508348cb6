//! objdal-core: Core library for the objdal object-storage data-access layer
//!
//! This crate provides:
//! - Connection configuration and the connection registry
//! - Key normalization and request-option merging
//! - The `Connection` and `Table` object operations
//! - Traits for the storage client and host data-access surface
//!
//! It does not depend on any storage SDK; `objdal-s3` supplies the
//! `StorageClient` implementation.

pub mod config;
pub mod connection;
pub mod error;
pub mod key;
pub mod options;
pub mod registry;
pub mod request;
pub mod table;
pub mod traits;
pub mod value;

pub use config::{RegistryConfig, StorageConfig};
pub use connection::Connection;
pub use error::{BoxError, Error, Result};
pub use key::normalize_key;
pub use options::{ApiOutput, DEFAULT_ACL, RequestOptions, names};
pub use registry::ConnectionRegistry;
pub use table::{Table, TableDefinition};
pub use traits::{ClientFactory, ConnectionResolver, Datasource, StorageClient};
pub use value::Value;
