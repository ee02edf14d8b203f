//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Narrow seams between the CEL core and the broker client.
//
// | Component          | Description                                                   |
// |--------------------|---------------------------------------------------------------|
// | BrokerConnection   | An open connection: synchronous publish, awaitable close      |
// | Connector          | Opens a connection for a profile name                         |
// | ConnectionManager  | Validates the name and always asks the connector for a fresh  |
// |                    | handle                                                        |
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;

use async_trait::async_trait;
use rabbitmq::{AmqpConnection, Delivery, RabbitMQConnector, RabbitMQError};
use tracing::{debug, error};

use crate::error::ConnError;

/// An open broker connection, shared by every snapshot and in-flight publish that holds it
#[async_trait]
pub trait BrokerConnection: Send + Sync + 'static {
    /// Publishes one delivery. Bounded and synchronous from the caller's point of view.
    fn basic_publish(&self, delivery: Delivery) -> Result<(), RabbitMQError>;

    /// Flushes every accepted delivery and closes the connection.
    /// Later publishes fail.
    async fn close(&self) -> Result<(), RabbitMQError>;
}

/// Opens broker connections by profile name
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn get_connection(&self, name: &str) -> Result<Arc<dyn BrokerConnection>, ConnError>;
}

#[async_trait]
impl BrokerConnection for AmqpConnection {
    fn basic_publish(&self, delivery: Delivery) -> Result<(), RabbitMQError> {
        AmqpConnection::basic_publish(self, delivery)
    }

    async fn close(&self) -> Result<(), RabbitMQError> {
        AmqpConnection::close(self).await
    }
}

#[async_trait]
impl Connector for RabbitMQConnector {
    async fn get_connection(&self, name: &str) -> Result<Arc<dyn BrokerConnection>, ConnError> {
        let conn = RabbitMQConnector::get_connection(self, name).await?;
        Ok(Arc::new(conn))
    }
}

/// Facade over the broker client used by configuration loading
#[derive(Clone)]
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Obtains a new connection handle for `name`.
    ///
    /// No caching and no retry: a failure is returned as is.
    pub async fn refresh(&self, name: &str) -> Result<Arc<dyn BrokerConnection>, ConnError> {
        if name.trim().is_empty() {
            return Err(ConnError::UnknownConnection(name.to_owned()));
        }

        debug!("refreshing AMQP connection {}", name);
        match self.connector.get_connection(name).await {
            Ok(conn) => Ok(conn),
            Err(err) => {
                error!("Could not get AMQP connection {}: {}", name, err);
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
use mockall::*;

#[cfg(test)]
mock! {
    pub Broker {}

    #[async_trait]
    impl BrokerConnection for Broker {
        fn basic_publish(&self, delivery: Delivery) -> Result<(), RabbitMQError>;
        async fn close(&self) -> Result<(), RabbitMQError>;
    }
}
