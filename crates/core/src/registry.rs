//! Connection registry
//!
//! Maps configuration names to connections. A connection is built the first
//! time its name is requested and reused afterwards. The registry is an
//! ordinary value handed to whoever needs it, not process-wide state.
//!
//! The map lock is only held to look an entry up. Each entry owns a cell
//! that serializes construction for that one name.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};

use crate::config::{RegistryConfig, StorageConfig};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::traits::{ClientFactory, ConnectionResolver, Datasource as _};

type ConnectionCell = Arc<OnceCell<Arc<Connection>>>;

struct Entry {
    config: StorageConfig,
    connection: ConnectionCell,
}

impl Entry {
    fn new(config: StorageConfig) -> Self {
        Self {
            config,
            connection: Arc::new(OnceCell::new()),
        }
    }
}

/// Named connection configurations plus the connections built from them
pub struct ConnectionRegistry {
    factory: Arc<dyn ClientFactory>,
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self::from_config(factory, RegistryConfig::default())
    }

    /// Create a registry preloaded with every configuration in `config`
    pub fn from_config(factory: Arc<dyn ClientFactory>, config: RegistryConfig) -> Self {
        let entries = config
            .connections
            .into_iter()
            .map(|(name, config)| (name, Entry::new(config)))
            .collect();

        Self {
            factory,
            entries: Mutex::new(entries),
        }
    }

    /// Register or replace a configuration
    ///
    /// A connection already built for `name` is dropped and rebuilt on the
    /// next lookup. A build still in flight for the old configuration
    /// completes for its own callers only.
    pub async fn set_config(&self, name: impl Into<String>, config: StorageConfig) {
        self.entries
            .lock()
            .await
            .insert(name.into(), Entry::new(config));
    }

    /// Register a connection that was built elsewhere
    pub async fn insert(&self, name: impl Into<String>, connection: Arc<Connection>) {
        let entry = Entry {
            config: connection.config().clone(),
            connection: Arc::new(OnceCell::new_with(Some(connection))),
        };
        self.entries.lock().await.insert(name.into(), entry);
    }

    /// Forget a configuration and its connection
    pub async fn remove(&self, name: &str) -> bool {
        self.entries.lock().await.remove(name).is_some()
    }

    /// Names of all registered configurations
    pub async fn configured(&self) -> Vec<String> {
        self.entries.lock().await.keys().cloned().collect()
    }

    /// Get the configuration registered under `name`
    pub async fn config(&self, name: &str) -> Option<StorageConfig> {
        let entries = self.entries.lock().await;
        entries.get(name).map(|entry| entry.config.clone())
    }

    /// Get the connection for `name`, building it on first use
    ///
    /// Concurrent callers asking for the same name share one build. A failed
    /// build is not cached.
    pub async fn get(&self, name: &str) -> Result<Arc<Connection>> {
        let (mut config, cell) = {
            let entries = self.entries.lock().await;
            let entry = entries
                .get(name)
                .ok_or_else(|| Error::ConnectionNotFound(name.to_string()))?;
            (entry.config.clone(), Arc::clone(&entry.connection))
        };

        if config.display_name.is_none() {
            config.display_name = Some(name.to_string());
        }

        let connection = cell
            .get_or_try_init(|| async move {
                tracing::debug!(name, "Building connection");
                Connection::connect(config, self.factory.as_ref())
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(connection))
    }
}

#[async_trait]
impl ConnectionResolver for ConnectionRegistry {
    async fn resolve(&self, name: &str) -> Result<Arc<Connection>> {
        self.get(name).await
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry").finish_non_exhaustive()
    }
}
