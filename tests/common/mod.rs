#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use cel_amqp::{BrokerConnection, ConnError, Connector};
use parking_lot::Mutex;
use rabbitmq::{Delivery, RabbitMQError};

/// Broker connection that records every delivery it accepts
pub struct RecordingBroker {
    pub id: usize,
    pub deliveries: Mutex<Vec<Delivery>>,
    fail_next: AtomicBool,
    closed: AtomicBool,
}

impl RecordingBroker {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            deliveries: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Makes the next publish fail
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn taken(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }
}

#[async_trait]
impl BrokerConnection for RecordingBroker {
    fn basic_publish(&self, delivery: Delivery) -> Result<(), RabbitMQError> {
        if self.is_closed() || self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(RabbitMQError::PublishError);
        }
        self.deliveries.lock().push(delivery);
        Ok(())
    }

    async fn close(&self) -> Result<(), RabbitMQError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector over a fixed set of profile names; every call yields a new broker
pub struct FakeConnector {
    known: Mutex<HashSet<String>>,
    opened: AtomicUsize,
    pub brokers: Mutex<Vec<Arc<RecordingBroker>>>,
}

impl FakeConnector {
    pub fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            known: Mutex::new(names.iter().map(|n| n.to_string()).collect()),
            opened: AtomicUsize::new(0),
            brokers: Mutex::new(Vec::new()),
        })
    }

    pub fn forget(&self, name: &str) {
        self.known.lock().remove(name);
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn broker(&self, index: usize) -> Arc<RecordingBroker> {
        self.brokers.lock()[index].clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn get_connection(&self, name: &str) -> Result<Arc<dyn BrokerConnection>, ConnError> {
        if !self.known.lock().contains(name) {
            return Err(ConnError::UnknownConnection(name.to_owned()));
        }
        let id = self.opened.fetch_add(1, Ordering::SeqCst);
        let broker = Arc::new(RecordingBroker::new(id));
        self.brokers.lock().push(broker.clone());
        Ok(broker)
    }
}
