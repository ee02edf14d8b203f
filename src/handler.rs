//! Per-event entry point invoked by the event source.

use std::sync::Arc;

use tracing::error;

use crate::cel::{EventRecord, transform};
use crate::error::{PublishError, PublishResult};
use crate::publisher;
use crate::state::ConfigManager;

/// The registered CEL backend callback
///
/// Cheap to clone; every clone reads the same [`ConfigManager`]. Safe to call
/// from any number of threads at once. Each call transforms and publishes one
/// event synchronously, without buffering.
#[derive(Clone, Debug)]
pub struct CelEventHandler {
    manager: Arc<ConfigManager>,
}

impl CelEventHandler {
    pub fn new(manager: Arc<ConfigManager>) -> Self {
        Self { manager }
    }

    /// Handles one event. Failures are logged and the event is dropped.
    pub fn handle(&self, record: &EventRecord) {
        match self.publish_event(record) {
            Ok(()) => {}
            Err(PublishError::Encode(err)) => {
                error!("Failed to build string from JSON: {}", err);
            }
            Err(PublishError::NotConfigured) => {
                error!("CEL AMQP backend invoked without configuration, event dropped");
            }
            Err(err) => {
                error!("Error publishing CEL to AMQP: {}", err);
            }
        }
    }

    /// Transforms and publishes one event, returning the outcome.
    ///
    /// Calling this while the backend is registered but no snapshot is installed
    /// is a programming error: it asserts in debug builds and returns
    /// `PublishError::NotConfigured` otherwise.
    pub fn publish_event(&self, record: &EventRecord) -> PublishResult<()> {
        let Some(snapshot) = self.manager.current() else {
            debug_assert!(false, "CEL AMQP backend active without a configuration snapshot");
            return Err(PublishError::NotConfigured);
        };

        let message = transform(record);
        publisher::publish(&message, &snapshot)
    }
}
