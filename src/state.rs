//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Process-wide configuration state.
//
// | Component      | Description                                                      |
// |----------------|------------------------------------------------------------------|
// | ConfigState    | Immutable snapshot: connection/queue/exchange + open connection  |
// | ConfigManager  | Owns the current snapshot; `current()` clones an Arc, `apply()`  |
// |                | builds a snapshot off to the side and swaps it in on success     |
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::CelAmqpConfig;
use crate::connection::{BrokerConnection, ConnectionManager};
use crate::error::{ConfigError, ConfigResult, ConnError};

/// One fully initialized configuration snapshot
///
/// A snapshot always carries an open connection; there is no way to build one
/// without it. Retired snapshots stay alive for as long as an in-flight publish
/// holds them.
pub struct ConfigState {
    connection_name: String,
    queue: String,
    exchange: String,
    connection: Arc<dyn BrokerConnection>,
}

impl ConfigState {
    pub fn new(config: &CelAmqpConfig, connection: Arc<dyn BrokerConnection>) -> Self {
        Self {
            connection_name: config.connection.clone(),
            queue: config.queue.clone(),
            exchange: config.exchange.clone(),
            connection,
        }
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn connection(&self) -> &Arc<dyn BrokerConnection> {
        &self.connection
    }
}

impl std::fmt::Debug for ConfigState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigState")
            .field("connection_name", &self.connection_name)
            .field("queue", &self.queue)
            .field("exchange", &self.exchange)
            .finish_non_exhaustive()
    }
}

/// Owner of the current [`ConfigState`]
///
/// Readers hold the lock only long enough to clone the `Arc`; nothing is ever
/// built or awaited while it is held. Writers are serialized among themselves so
/// that two overlapping reloads install in call order.
#[derive(Debug)]
pub struct ConfigManager {
    current: RwLock<Option<Arc<ConfigState>>>,
    connections: ConnectionManager,
    apply_lock: Mutex<()>,
}

impl ConfigManager {
    pub fn new(connections: ConnectionManager) -> Self {
        Self {
            current: RwLock::new(None),
            connections,
            apply_lock: Mutex::new(()),
        }
    }

    /// Returns the installed snapshot, if any. The caller owns a reference for as long as it keeps the `Arc`.
    pub fn current(&self) -> Option<Arc<ConfigState>> {
        self.current.read().clone()
    }

    /// Builds a snapshot from `config`, opens its connection and installs it.
    ///
    /// Used for both the initial load and every reload. On error the
    /// previously installed snapshot is left untouched.
    pub async fn apply(&self, config: CelAmqpConfig) -> ConfigResult<Arc<ConfigState>> {
        let _guard = self.apply_lock.lock().await;

        if config.connection.trim().is_empty() {
            error!("Invalid cel_amqp configuration: no connection configured");
            return Err(ConfigError::UnresolvableConnection(config.connection));
        }

        let connection = match self.connections.refresh(&config.connection).await {
            Ok(connection) => connection,
            Err(ConnError::UnknownConnection(name)) => {
                return Err(ConfigError::UnresolvableConnection(name));
            }
            Err(source) => {
                return Err(ConfigError::Connection {
                    name: config.connection.clone(),
                    source,
                });
            }
        };

        let state = Arc::new(ConfigState::new(&config, connection));
        let previous = self.current.write().replace(state.clone());

        info!(
            "Installed CEL AMQP configuration: connection={} queue={} exchange={:?}{}",
            state.connection_name(),
            state.queue(),
            state.exchange(),
            if previous.is_some() { " (replaced previous)" } else { "" }
        );

        // `previous` is released here; in-flight holders keep it alive until they finish.
        Ok(state)
    }

    /// Uninstalls the current snapshot and returns it
    pub fn release(&self) -> Option<Arc<ConfigState>> {
        self.current.write().take()
    }

    /// Uninstalls the current snapshot and closes its connection.
    ///
    /// Returns once every delivery the connection accepted has been handed to the
    /// broker. Holders of the released snapshot can no longer publish through it.
    pub async fn shutdown(&self) -> Result<Option<Arc<ConfigState>>, ConnError> {
        let _guard = self.apply_lock.lock().await;

        let Some(state) = self.release() else {
            return Ok(None);
        };
        state.connection().close().await?;
        info!("Closed CEL AMQP connection {}", state.connection_name());
        Ok(Some(state))
    }
}
