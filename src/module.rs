//! Load, reload and unload of the CEL AMQP backend.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::CelAmqpConfig;
use crate::connection::ConnectionManager;
use crate::error::{ConfigResult, ConnError, ModuleError};
use crate::handler::CelEventHandler;
use crate::state::{ConfigManager, ConfigState};

pub const BACKEND_NAME: &str = "AMQP";

/// A loaded backend: configuration state plus the handler given to the event source
#[derive(Debug)]
pub struct CelAmqpModule {
    manager: Arc<ConfigManager>,
    handler: CelEventHandler,
}

impl CelAmqpModule {
    /// Applies the initial configuration. The module is not created if that fails.
    pub async fn load(
        connections: ConnectionManager,
        config: CelAmqpConfig,
    ) -> Result<Self, ModuleError> {
        let manager = Arc::new(ConfigManager::new(connections));

        if let Err(err) = manager.apply(config).await {
            warn!("Configuration failed to load: {}", err);
            return Err(ModuleError::Declined(err));
        }

        info!("CEL {} logging enabled", BACKEND_NAME);
        Ok(Self {
            handler: CelEventHandler::new(manager.clone()),
            manager,
        })
    }

    /// Applies a new configuration through the same path as [`load`](Self::load).
    pub async fn reload(&self, config: CelAmqpConfig) -> ConfigResult<Arc<ConfigState>> {
        self.manager.apply(config).await
    }

    /// The callback to register with the event source
    pub fn handler(&self) -> CelEventHandler {
        self.handler.clone()
    }

    pub fn current(&self) -> Option<Arc<ConfigState>> {
        self.manager.current()
    }

    /// Uninstalls the configuration and closes its connection after the queued
    /// deliveries are published.
    ///
    /// Snapshots held by in-flight events stay readable; publishing through them
    /// fails from then on and is reported like any other publish failure.
    pub async fn unload(&self) -> Result<(), ConnError> {
        if self.manager.shutdown().await?.is_some() {
            info!("CEL {} logging disabled", BACKEND_NAME);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{BrokerConnection, Connector, MockBroker};
    use crate::error::{ConfigError, ConnError};
    use async_trait::async_trait;

    struct OnlyC1;

    #[async_trait]
    impl Connector for OnlyC1 {
        async fn get_connection(
            &self,
            name: &str,
        ) -> Result<Arc<dyn BrokerConnection>, ConnError> {
            if name == "c1" {
                let mut broker = MockBroker::new();
                broker.expect_close().returning(|| Ok(()));
                Ok(Arc::new(broker))
            } else {
                Err(ConnError::UnknownConnection(name.to_owned()))
            }
        }
    }

    fn connections() -> ConnectionManager {
        ConnectionManager::new(Arc::new(OnlyC1))
    }

    #[tokio::test]
    async fn load_is_declined_when_connection_does_not_resolve() {
        let err = CelAmqpModule::load(connections(), CelAmqpConfig::new("c2", "cel", ""))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Declined(ConfigError::UnresolvableConnection(ref name)) if name == "c2"
        ));
    }

    #[tokio::test]
    async fn load_is_declined_without_connection_name() {
        let err = CelAmqpModule::load(connections(), CelAmqpConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Declined(ConfigError::UnresolvableConnection(_))
        ));
    }

    #[tokio::test]
    async fn reload_goes_through_apply() {
        let module = CelAmqpModule::load(connections(), CelAmqpConfig::new("c1", "cel", ""))
            .await
            .unwrap();
        let before = module.current().unwrap();

        let after = module
            .reload(CelAmqpConfig::new("c1", "cel2", "x"))
            .await
            .unwrap();
        assert_eq!(after.queue(), "cel2");
        assert!(!Arc::ptr_eq(&before, &module.current().unwrap()));

        assert!(module.reload(CelAmqpConfig::new("c2", "cel3", "")).await.is_err());
        assert_eq!(module.current().unwrap().queue(), "cel2");
    }

    #[tokio::test]
    async fn unload_releases_configuration_but_not_held_snapshots() {
        let module = CelAmqpModule::load(connections(), CelAmqpConfig::new("c1", "cel", ""))
            .await
            .unwrap();
        let held = module.current().unwrap();
        let handler = module.handler();

        module.unload().await.unwrap();

        assert!(module.current().is_none());
        assert_eq!(held.queue(), "cel");
        drop(handler);
    }
}
