//! UseCase: ブローカーの受信トピックを Mediator へ流し込むバックグラウンドループ

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use super::{
    error::ApplicationResult,
    integration_event::IntegrationEvent,
    mediator::{EventMediator, PublishReport},
};
use crate::infrastructure::{broker::MessageBroker, dto::broker::BrokerEventDto};

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

pub struct BrokerConsumer {
    broker: Arc<dyn MessageBroker>,
    events: Arc<EventMediator>,
    topic: String,
}

impl BrokerConsumer {
    /// `topic` may be a wildcard pattern such as `chat.*.messages`.
    pub fn new(broker: Arc<dyn MessageBroker>, events: Arc<EventMediator>, topic: impl Into<String>) -> Self {
        Self {
            broker,
            events,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Consume until `cancel` fires, then unsubscribe and close the broker.
    ///
    /// Subscribe failures and dropped subscriptions are retried with
    /// exponential backoff. Payloads that cannot be decoded or handled are
    /// logged and skipped.
    pub async fn run(&self, cancel: CancellationToken) -> ApplicationResult<()> {
        tracing::info!(topic = %self.topic, "Broker consumer starting");
        let mut backoff = INITIAL_BACKOFF;

        'outer: loop {
            let subscribed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'outer,
                result = self.broker.subscribe(&self.topic) => result,
            };

            match subscribed {
                Ok(mut subscription) => {
                    backoff = INITIAL_BACKOFF;
                    loop {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break 'outer,
                            payload = subscription.next() => match payload {
                                Some(payload) => {
                                    if let Err(e) = self.handle_payload(&payload).await {
                                        tracing::warn!(topic = %self.topic, "Skipping broker message: {}", e);
                                    }
                                }
                                None => {
                                    tracing::warn!(topic = %self.topic, "Subscription ended, resubscribing");
                                    break;
                                }
                            },
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        topic = %self.topic,
                        retry_in_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "Failed to subscribe: {}",
                        e
                    );
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'outer,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }

        self.shutdown().await
    }

    /// Decode one broker payload and dispatch it as an integration event.
    pub async fn handle_payload(&self, payload: &[u8]) -> ApplicationResult<PublishReport> {
        let dto = BrokerEventDto::decode(payload)?;
        let event = IntegrationEvent::try_from(dto)?;
        tracing::debug!(
            event_id = %event.event_id(),
            chat_oid = %event.chat_oid(),
            "Received message from broker"
        );
        self.events.publish([event]).await
    }

    async fn shutdown(&self) -> ApplicationResult<()> {
        tracing::info!(topic = %self.topic, "Broker consumer stopping");
        self.broker.unsubscribe().await?;
        self.broker.close().await?;
        Ok(())
    }
}
