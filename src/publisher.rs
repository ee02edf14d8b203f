//! Serializes canonical messages and hands them to the broker connection of a snapshot.

use rabbitmq::{Delivery, DeliveryMode, DeliveryProperties};
use serde::Serialize;

use crate::error::PublishResult;
use crate::state::ConfigState;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Properties of every CEL delivery: persistent, JSON.
pub fn message_properties() -> DeliveryProperties {
    DeliveryProperties {
        delivery_mode: DeliveryMode::Persistent,
        content_type: Some(CONTENT_TYPE_JSON.to_owned()),
        message_id: None,
    }
}

/// Publishes `message` to the exchange and queue of `snapshot`.
///
/// Not mandatory and not immediate: the broker may queue the message without a
/// bound consumer, and unroutable messages are dropped by the broker instead of
/// being returned. Nothing is retried here.
pub fn publish<M: Serialize>(message: &M, snapshot: &ConfigState) -> PublishResult<()> {
    let body = serde_json::to_vec(message)?;

    let mut delivery = Delivery::new(snapshot.exchange(), snapshot.queue(), body)
        .with_properties(message_properties());
    delivery.mandatory = false;
    delivery.immediate = false;

    snapshot.connection().basic_publish(delivery)?;
    Ok(())
}
