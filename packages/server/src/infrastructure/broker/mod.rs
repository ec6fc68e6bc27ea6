//! Message broker port and its adapters.
//!
//! The port is deliberately small: `publish` is at-least-once and never
//! retried here, `subscribe` hands back a lazy unbounded [`Subscription`]
//! that suspends the caller until a payload arrives. One active subscription
//! per broker instance; subscribing again replaces the previous one.

pub mod memory;
pub mod nats;
mod topic;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

pub use memory::{InMemoryMessageBroker, PublishedRecord};
pub use nats::NatsMessageBroker;
pub use topic::{BrokerTopics, TopicTemplate, topic_matches};

/// Buffer between the broker-side reader task and the subscription handle.
pub const SUBSCRIPTION_BUFFER: usize = 1024;

/// Broker errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// Could not establish the broker connection (fatal at startup)
    #[error("Failed to connect to message broker: {0}")]
    Connect(String),

    /// Transient failure; the caller decides whether to retry
    #[error("Message broker unavailable: {0}")]
    Unavailable(String),
}

/// Handle over an active subscription.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: mpsc::Receiver<Bytes>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, receiver: mpsc::Receiver<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    /// Create a subscription together with the sender feeding it.
    pub fn channel(topic: impl Into<String>) -> (mpsc::Sender<Bytes>, Self) {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        (tx, Self::new(topic, rx))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next payload.
    ///
    /// Returns `None` once the subscription was cancelled (`unsubscribe` or
    /// `close`) or the broker connection went away.
    pub async fn next(&mut self) -> Option<Bytes> {
        self.receiver.recv().await
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Connect. A failure here is fatal to process startup.
    async fn start(&self) -> Result<(), BrokerError>;

    /// Release every resource. Safe to call when `start` failed or never ran.
    async fn close(&self) -> Result<(), BrokerError>;

    async fn publish(&self, topic: &str, key: &[u8], payload: Bytes) -> Result<(), BrokerError>;

    /// Subscribe to a topic or wildcard pattern.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError>;

    /// Cancel the active subscription, if any.
    async fn unsubscribe(&self) -> Result<(), BrokerError>;
}
