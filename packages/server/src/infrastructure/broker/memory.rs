//! In-process message broker.
//!
//! Backed by a `tokio::sync::broadcast` feed. The most recent publishes are
//! also kept in a bounded inspection log so tests can assert exactly what
//! reached the broker.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{sync::broadcast, task::JoinHandle};

use super::{BrokerError, MessageBroker, Subscription, topic_matches};

/// Capacity of the internal feed; lagging subscriptions skip messages.
const FEED_CAPACITY: usize = 4096;

/// Default number of records kept in the inspection log.
pub const DEFAULT_LOG_CAPACITY: usize = 1024;

/// A message accepted by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    pub topic: String,
    pub key: Vec<u8>,
    pub payload: Bytes,
}

impl PublishedRecord {
    pub fn key_str(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}

#[derive(Default)]
struct State {
    started: bool,
    available: bool,
    subscription_task: Option<JoinHandle<()>>,
}

/// 単一プロセス構成とテストで使うインメモリブローカー
pub struct InMemoryMessageBroker {
    feed: broadcast::Sender<PublishedRecord>,
    state: Mutex<State>,
    published: Mutex<VecDeque<PublishedRecord>>,
    log_capacity: usize,
}

impl InMemoryMessageBroker {
    pub fn new() -> Self {
        Self::with_log_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Keep at most `log_capacity` records in the inspection log. The oldest
    /// record is evicted first; `0` disables the log.
    pub fn with_log_capacity(log_capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            feed,
            state: Mutex::new(State {
                available: true,
                ..State::default()
            }),
            published: Mutex::new(VecDeque::with_capacity(log_capacity.min(DEFAULT_LOG_CAPACITY))),
            log_capacity,
        }
    }

    /// Simulate an outage: while unavailable every publish and subscribe fails.
    pub fn set_available(&self, available: bool) {
        self.state().available = available;
    }

    /// The most recent published records, oldest first.
    pub fn published(&self) -> Vec<PublishedRecord> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Records published to a specific topic.
    pub fn published_to(&self, topic: &str) -> Vec<PublishedRecord> {
        self.published()
            .into_iter()
            .filter(|r| r.topic == topic)
            .collect()
    }

    pub fn has_active_subscription(&self) -> bool {
        self.state()
            .subscription_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_ready(&self) -> Result<(), BrokerError> {
        let state = self.state();
        if !state.started {
            return Err(BrokerError::Unavailable("broker is not started".to_string()));
        }
        if !state.available {
            return Err(BrokerError::Unavailable("broker is unreachable".to_string()));
        }
        Ok(())
    }

    fn cancel_subscription(&self) -> bool {
        match self.state().subscription_task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl Default for InMemoryMessageBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBroker for InMemoryMessageBroker {
    async fn start(&self) -> Result<(), BrokerError> {
        let mut state = self.state();
        if !state.available {
            return Err(BrokerError::Connect("broker is unreachable".to_string()));
        }
        state.started = true;
        tracing::info!("In-memory message broker started");
        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.cancel_subscription();
        let mut state = self.state();
        if state.started {
            state.started = false;
            tracing::info!("In-memory message broker closed");
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, key: &[u8], payload: Bytes) -> Result<(), BrokerError> {
        self.ensure_ready()?;

        let record = PublishedRecord {
            topic: topic.to_string(),
            key: key.to_vec(),
            payload,
        };
        if self.log_capacity > 0 {
            let mut log = self.published.lock().unwrap_or_else(|e| e.into_inner());
            if log.len() == self.log_capacity {
                log.pop_front();
            }
            log.push_back(record.clone());
        }

        // No receivers just means nobody is subscribed yet
        let _ = self.feed.send(record);
        tracing::debug!(topic, "Published message to in-memory broker");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError> {
        self.ensure_ready()?;
        if self.cancel_subscription() {
            tracing::warn!(topic, "Replacing the active subscription");
        }

        // Register on the feed before returning so nothing published after
        // this call can be missed.
        let mut feed = self.feed.subscribe();
        let (tx, subscription) = Subscription::channel(topic);
        let pattern = topic.to_string();

        let task = tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(record) => {
                        if !topic_matches(&pattern, &record.topic) {
                            continue;
                        }
                        if tx.send(record.payload).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(pattern = %pattern, skipped, "Subscription lagged behind the feed");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.state().subscription_task = Some(task);

        tracing::info!(topic, "Subscribed to in-memory broker");
        Ok(subscription)
    }

    async fn unsubscribe(&self) -> Result<(), BrokerError> {
        if self.cancel_subscription() {
            tracing::info!("Unsubscribed from in-memory broker");
        }
        Ok(())
    }
}
