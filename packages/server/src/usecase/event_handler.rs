//! UseCase: イベントハンドラ
//!
//! Mediator からブローカー、および接続中の購読者へイベントを橋渡しします。

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    error::ApplicationResult,
    integration_event::IntegrationEvent,
    mediator::{Event, EventHandler, HandlerOutcome},
};
use crate::{
    domain::DomainEvent,
    infrastructure::{
        broker::{MessageBroker, TopicTemplate},
        connection::ConnectionRegistry,
        dto::{
            broker::BrokerEventDto,
            websocket::{ChatDeletedMessage, MessageType, NewMessageMessage},
        },
    },
};

/// ドメインイベントをブローカーへ publish するハンドラ
///
/// トピックはイベントのチャット ID で展開し、キーにはイベント ID を使います。
pub struct PublishToBrokerHandler {
    broker: Arc<dyn MessageBroker>,
    topic: TopicTemplate,
}

impl PublishToBrokerHandler {
    pub fn new(broker: Arc<dyn MessageBroker>, topic: TopicTemplate) -> Self {
        Self { broker, topic }
    }
}

#[async_trait]
impl EventHandler for PublishToBrokerHandler {
    async fn handle(&self, event: &Event) -> ApplicationResult<HandlerOutcome> {
        let Event::Domain(domain_event) = event else {
            return Ok(HandlerOutcome::Skipped);
        };

        let payload = BrokerEventDto::from(domain_event).encode()?;
        let topic = self.topic.render(domain_event.chat_oid());
        let key = domain_event.event_id().to_string();

        self.broker.publish(&topic, key.as_bytes(), payload).await?;
        tracing::info!(
            event = domain_event.name(),
            topic = %topic,
            key = %key,
            "Published event to broker"
        );
        Ok(HandlerOutcome::Published { topic, key })
    }

    fn name(&self) -> &'static str {
        "PublishToBrokerHandler"
    }
}

/// イベントを該当チャットの WebSocket 購読者へ配信するハンドラ
///
/// ブローカー経由のメッセージは `new-message` として配信します。
/// チャット削除時は `chat-deleted` を通知してから全接続を閉じます。
pub struct BroadcastToSubscribersHandler {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastToSubscribersHandler {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl EventHandler for BroadcastToSubscribersHandler {
    async fn handle(&self, event: &Event) -> ApplicationResult<HandlerOutcome> {
        match event {
            Event::Integration(IntegrationEvent::NewMessageReceivedFromBroker(message)) => {
                let payload = serde_json::to_string(&NewMessageMessage {
                    r#type: MessageType::NewMessage,
                    chat_oid: message.chat_oid.to_string(),
                    message_oid: message.message_oid.to_string(),
                    message_text: message.message_text.clone(),
                    source: message.source.clone(),
                    created_at: message.created_at.value(),
                })?;
                let delivered = self.registry.broadcast(&message.chat_oid, &payload).await;
                tracing::debug!(chat_oid = %message.chat_oid, delivered, "Broadcast new message");
                Ok(HandlerOutcome::Broadcast {
                    chat_oid: message.chat_oid.clone(),
                    delivered,
                })
            }
            Event::Domain(DomainEvent::ChatDeleted(deleted)) => {
                let payload = serde_json::to_string(&ChatDeletedMessage {
                    r#type: MessageType::ChatDeleted,
                    chat_oid: deleted.chat_oid.to_string(),
                    deleted_at: deleted.created_at.value(),
                })?;
                let notified = self.registry.broadcast(&deleted.chat_oid, &payload).await;
                let closed = self.registry.disconnect_all(&deleted.chat_oid).await;
                Ok(HandlerOutcome::Disconnected {
                    chat_oid: deleted.chat_oid.clone(),
                    notified,
                    closed,
                })
            }
            _ => Ok(HandlerOutcome::Skipped),
        }
    }

    fn name(&self) -> &'static str {
        "BroadcastToSubscribersHandler"
    }
}
