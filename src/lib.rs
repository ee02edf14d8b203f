//! Publishes channel event logging (CEL) records to an AMQP broker.
//!
//! Records are turned into a fixed JSON document and published, one by one, through
//! the connection of the currently installed configuration snapshot. Reloading the
//! configuration opens a fresh connection and swaps the snapshot atomically; events
//! already in flight finish on the snapshot they started with.

pub mod cel;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod module;
pub mod publisher;
pub mod source;
pub mod state;

// Re-export key types for easier usage
pub use cel::{AmaFlags, CallerId, CanonicalMessage, CelEventType, EventRecord, transform};
pub use config::{CelAmqpConfig, Settings, SettingsLoader};
pub use connection::{BrokerConnection, ConnectionManager, Connector};
pub use error::{ConfigError, ConnError, ModuleError, PublishError};
pub use handler::CelEventHandler;
pub use module::CelAmqpModule;
pub use state::{ConfigManager, ConfigState};
