//! Collaborator traits
//!
//! `StorageClient` is the seam to the cloud SDK, `ClientFactory` builds one
//! from configuration, and `ConnectionResolver` turns a configuration name into
//! a live connection. All three can be mocked for testing.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StorageConfig;
use crate::connection::Connection;
use crate::error::Result;
use crate::options::{ApiOutput, RequestOptions};

/// Primitive object operations offered by the underlying storage SDK
///
/// Every method issues a single request. Implementations report failures as
/// [`Error::Upstream`](crate::Error::Upstream) and must not retry on their own
/// behalf beyond what the SDK already does.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Check if a bucket exists
    async fn does_bucket_exist(&self, bucket: &str) -> Result<bool>;

    async fn copy_object(&self, params: RequestOptions) -> Result<ApiOutput>;

    async fn delete_object(&self, params: RequestOptions) -> Result<ApiOutput>;

    async fn delete_objects(&self, params: RequestOptions) -> Result<ApiOutput>;

    /// Check if an object exists; bucket and key are positional
    async fn does_object_exist(
        &self,
        bucket: &str,
        key: &str,
        options: RequestOptions,
    ) -> Result<bool>;

    async fn get_object(&self, params: RequestOptions) -> Result<ApiOutput>;

    async fn head_object(&self, params: RequestOptions) -> Result<ApiOutput>;

    async fn put_object(&self, params: RequestOptions) -> Result<ApiOutput>;
}

/// Builds storage clients from validated configuration
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(&self, config: &StorageConfig) -> Result<Arc<dyn StorageClient>>;
}

/// Resolves a configuration name into a connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Arc<Connection>>;
}

/// Data-access surface expected by host frameworks
///
/// Relational resources give `transactional`, `disable_constraints`,
/// `log_queries` and `logger` real meaning. Implementors that are not
/// relational still have to spell out what each one does for them.
pub trait Datasource {
    /// Name this resource was configured under
    fn config_name(&self) -> &str;

    fn config(&self) -> &StorageConfig;

    /// Run `transaction` inside a transaction
    fn transactional(&self, transaction: &mut dyn FnMut() -> Result<()>) -> Result<()>;

    /// Run `operation` with referential constraints disabled
    fn disable_constraints(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()>;

    /// Enable or disable query logging, returning the current setting
    fn log_queries(&self, enable: Option<bool>) -> bool;

    /// Dispatcher used for query logging
    fn logger(&self) -> Option<tracing::Dispatch>;
}
