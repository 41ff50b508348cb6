//! Table facade
//!
//! A `Table` is what application code holds. It resolves its connection by
//! configuration name the first time one is needed, keeps it for the rest of
//! its life, and forwards every object operation to it unchanged. On top of
//! that it offers two compositions: fetching an object's content and moving
//! an object.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::options::{ApiOutput, RequestOptions};
use crate::traits::{ConnectionResolver, Datasource as _};

/// Binds a table type to the configuration name it reads from
///
/// ```ignore
/// struct Avatars;
///
/// impl TableDefinition for Avatars {
///     const CONNECTION_NAME: &'static str = "avatars";
/// }
///
/// let table = Table::for_definition::<Avatars>(registry);
/// ```
pub trait TableDefinition {
    const CONNECTION_NAME: &'static str;
}

/// Object-storage accessor bound to one named connection
pub struct Table {
    connection_name: String,
    resolver: Option<Arc<dyn ConnectionResolver>>,
    connection: OnceCell<Arc<Connection>>,
}

impl Table {
    /// Create a table that resolves `connection_name` through `resolver` on first use
    pub fn new(resolver: Arc<dyn ConnectionResolver>, connection_name: impl Into<String>) -> Self {
        Self {
            connection_name: connection_name.into(),
            resolver: Some(resolver),
            connection: OnceCell::new(),
        }
    }

    /// Create a table for the connection name declared by `T`
    pub fn for_definition<T: TableDefinition>(resolver: Arc<dyn ConnectionResolver>) -> Self {
        Self::new(resolver, T::CONNECTION_NAME)
    }

    /// Create a table around an already resolved connection
    pub fn with_connection(connection: Arc<Connection>) -> Self {
        Self {
            connection_name: connection.config_name().to_string(),
            resolver: None,
            connection: OnceCell::new_with(Some(connection)),
        }
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    /// Get the connection, resolving it on the first call only
    pub async fn connection(&self) -> Result<&Arc<Connection>> {
        self.connection
            .get_or_try_init(|| async {
                let resolver = self
                    .resolver
                    .as_ref()
                    .ok_or_else(|| Error::ConnectionNotFound(self.connection_name.clone()))?;
                resolver.resolve(&self.connection_name).await
            })
            .await
    }

    pub async fn copy_object(
        &self,
        src_key: &str,
        dest_key: &str,
        options: RequestOptions,
    ) -> Result<ApiOutput> {
        self.connection()
            .await?
            .copy_object(src_key, dest_key, options)
            .await
    }

    pub async fn delete_object(&self, key: &str, options: RequestOptions) -> Result<ApiOutput> {
        self.connection().await?.delete_object(key, options).await
    }

    pub async fn delete_objects<S: AsRef<str> + Sync>(
        &self,
        keys: &[S],
        options: RequestOptions,
    ) -> Result<ApiOutput> {
        self.connection().await?.delete_objects(keys, options).await
    }

    pub async fn does_object_exist(&self, key: &str, options: RequestOptions) -> Result<bool> {
        self.connection()
            .await?
            .does_object_exist(key, options)
            .await
    }

    pub async fn get_object(&self, key: &str, options: RequestOptions) -> Result<ApiOutput> {
        self.connection().await?.get_object(key, options).await
    }

    pub async fn head_object(&self, key: &str, options: RequestOptions) -> Result<ApiOutput> {
        self.connection().await?.head_object(key, options).await
    }

    pub async fn put_object(
        &self,
        key: &str,
        content: impl Into<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<ApiOutput> {
        self.connection()
            .await?
            .put_object(key, content, options)
            .await
    }

    /// Fetch an object and return its payload
    ///
    /// Fails with [`Error::MissingField`] when the result carries no body.
    pub async fn get_object_content(&self, key: &str, options: RequestOptions) -> Result<Vec<u8>> {
        self.get_object(key, options).await?.into_body()
    }

    /// Copy `src_key` to `dest_key`, then delete `src_key`
    ///
    /// Returns the copy result. The two steps are not atomic: when the delete
    /// fails the copy stays in place, the object exists under both keys, and
    /// the delete error is returned. `options` apply to the copy only.
    pub async fn move_object(
        &self,
        src_key: &str,
        dest_key: &str,
        options: RequestOptions,
    ) -> Result<ApiOutput> {
        let result = self.copy_object(src_key, dest_key, options).await?;

        if let Err(e) = self.delete_object(src_key, RequestOptions::new()).await {
            tracing::warn!(
                src_key,
                dest_key,
                error = %e,
                "Copied but failed to delete source"
            );
            return Err(e);
        }

        Ok(result)
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("connection_name", &self.connection_name)
            .field("resolved", &self.connection.initialized())
            .finish_non_exhaustive()
    }
}
