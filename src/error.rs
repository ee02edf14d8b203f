//--------------------------------------------------------------------------------------------------
// ENUMS
//--------------------------------------------------------------------------------------------------
// | Name            | Description                                             |
// |-----------------|---------------------------------------------------------|
// | ConfigError     | Load/reload declined; previous snapshot stays current   |
// | ConnError       | Broker connection could not be (re)established          |
// | PublishError    | A single event was dropped (encode or broker failure)   |
// | ModuleError     | Module load outcome when configuration is declined      |
//--------------------------------------------------------------------------------------------------

use rabbitmq::RabbitMQError;
use thiserror::Error;

/// Configuration could not be applied. Structural: affects every later event until fixed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The connection name is missing or does not resolve to a broker profile
    #[error("unresolvable connection: {0:?}")]
    UnresolvableConnection(String),

    /// A configuration value is unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The profile exists but its broker could not be reached
    #[error("could not get AMQP connection {name}: {source}")]
    Connection {
        name: String,
        #[source]
        source: ConnError,
    },
}

/// Obtaining a broker connection failed. Never retried by this crate.
#[derive(Error, Debug)]
pub enum ConnError {
    #[error("no connection profile named {0:?}")]
    UnknownConnection(String),

    #[error("broker unavailable: {0}")]
    Broker(#[source] RabbitMQError),
}

impl From<RabbitMQError> for ConnError {
    fn from(err: RabbitMQError) -> Self {
        match err {
            RabbitMQError::UnknownConnection(name) => Self::UnknownConnection(name),
            other => Self::Broker(other),
        }
    }
}

/// A single event could not be delivered. The event is dropped.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The canonical message could not be serialized to JSON text
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The broker client rejected the publish
    #[error("broker publish failed: {0}")]
    Broker(#[from] RabbitMQError),

    /// An event arrived while no configuration snapshot is installed
    #[error("no configuration installed")]
    NotConfigured,
}

/// Module load outcome when the initial configuration cannot be applied
#[derive(Error, Debug)]
pub enum ModuleError {
    /// Configuration failed; the module stays unloaded
    #[error("module load declined: {0}")]
    Declined(#[from] ConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type PublishResult<T> = Result<T, PublishError>;
