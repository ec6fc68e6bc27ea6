//! NATS adapter for the message broker port.
//!
//! The partition key has no native NATS equivalent, so it travels in the
//! [`KEY_HEADER`] header. NATS subjects understand `*` and `>` wildcards, so
//! chat-scoped subscription patterns are passed through unchanged.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
};

use super::{BrokerError, MessageBroker, Subscription};

/// Header carrying the message key.
pub const KEY_HEADER: &str = "Hibiki-Key";

pub struct NatsMessageBroker {
    url: String,
    client: RwLock<Option<async_nats::Client>>,
    subscription_task: Mutex<Option<JoinHandle<()>>>,
}

impl NatsMessageBroker {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: RwLock::new(None),
            subscription_task: Mutex::new(None),
        }
    }

    async fn client(&self) -> Result<async_nats::Client, BrokerError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| BrokerError::Unavailable("NATS client is not connected".to_string()))
    }

    async fn cancel_subscription(&self) -> bool {
        match self.subscription_task.lock().await.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl MessageBroker for NatsMessageBroker {
    async fn start(&self) -> Result<(), BrokerError> {
        let client = async_nats::connect(self.url.as_str())
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))?;
        *self.client.write().await = Some(client);
        tracing::info!(url = %self.url, "Connected to NATS");
        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.cancel_subscription().await;
        let Some(client) = self.client.write().await.take() else {
            return Ok(());
        };
        client
            .flush()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        tracing::info!(url = %self.url, "NATS connection closed");
        Ok(())
    }

    async fn publish(&self, topic: &str, key: &[u8], payload: Bytes) -> Result<(), BrokerError> {
        let client = self.client().await?;
        let mut headers = async_nats::HeaderMap::new();
        let key = String::from_utf8_lossy(key).into_owned();
        headers.insert(KEY_HEADER, key.as_str());

        client
            .publish_with_headers(topic.to_string(), headers, payload)
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        tracing::debug!(topic, "Published message to NATS");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError> {
        let client = self.client().await?;
        if self.cancel_subscription().await {
            tracing::warn!(topic, "Replacing the active NATS subscription");
        }

        let mut subscriber = client
            .subscribe(topic.to_string())
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        let (tx, subscription) = Subscription::channel(topic);

        // Dropping the subscriber (on abort or when the receiver is gone)
        // unsubscribes on the server side.
        let task = tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                if tx.send(message.payload).await.is_err() {
                    break;
                }
            }
        });
        *self.subscription_task.lock().await = Some(task);

        tracing::info!(topic, "Subscribed to NATS subject");
        Ok(subscription)
    }

    async fn unsubscribe(&self) -> Result<(), BrokerError> {
        if self.cancel_subscription().await {
            tracing::info!("Unsubscribed from NATS subject");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_connection_fails() {
        // テスト項目: 接続前の publish は Unavailable エラーになる
        // given (前提条件):
        let broker = NatsMessageBroker::new("nats://127.0.0.1:4222");

        // when (操作):
        let result = broker.publish("chat.created", b"k", Bytes::new()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(BrokerError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_close_without_start_is_safe() {
        // テスト項目: 接続していなくても close は成功する
        // given (前提条件):
        let broker = NatsMessageBroker::new("nats://127.0.0.1:4222");

        // then (期待する結果):
        assert!(broker.close().await.is_ok());
        assert!(broker.unsubscribe().await.is_ok());
    }
}
