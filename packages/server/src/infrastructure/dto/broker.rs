//! Wire format of events exchanged through the message broker.
//!
//! JSON objects internally tagged by `"type"`. Missing `event_id` and
//! `created_at` are filled in on decode so producers outside this service
//! only need to send the payload fields.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainEvent;

/// Source recorded for messages that arrive without one.
pub const BROKER_MESSAGE_SOURCE: &str = "broker";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BrokerEventDto {
    NewChatCreated(NewChatCreatedDto),
    #[serde(alias = "NewMessageReceivedFromBroker")]
    NewMessageReceived(NewMessageReceivedDto),
    ChatDeleted(ChatDeletedDto),
    ListenerAdded(ListenerAddedDto),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChatCreatedDto {
    #[serde(default = "Uuid::new_v4")]
    pub event_id: Uuid,
    /// Unix timestamp (milliseconds since epoch)
    #[serde(default = "now_millis")]
    pub created_at: i64,
    pub chat_oid: String,
    pub chat_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessageReceivedDto {
    #[serde(default = "Uuid::new_v4")]
    pub event_id: Uuid,
    #[serde(default = "now_millis")]
    pub created_at: i64,
    pub chat_oid: String,
    pub message_oid: String,
    pub message_text: String,
    #[serde(default = "default_source")]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatDeletedDto {
    #[serde(default = "Uuid::new_v4")]
    pub event_id: Uuid,
    #[serde(default = "now_millis")]
    pub created_at: i64,
    pub chat_oid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerAddedDto {
    #[serde(default = "Uuid::new_v4")]
    pub event_id: Uuid,
    #[serde(default = "now_millis")]
    pub created_at: i64,
    pub chat_oid: String,
    pub listener_id: String,
}

fn now_millis() -> i64 {
    hibiki_shared::time::get_jst_timestamp()
}

fn default_source() -> String {
    BROKER_MESSAGE_SOURCE.to_string()
}

impl BrokerEventDto {
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    /// Value of the `"type"` discriminator.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NewChatCreated(_) => "NewChatCreated",
            Self::NewMessageReceived(_) => "NewMessageReceived",
            Self::ChatDeleted(_) => "ChatDeleted",
            Self::ListenerAdded(_) => "ListenerAdded",
        }
    }
}

impl From<&DomainEvent> for BrokerEventDto {
    fn from(event: &DomainEvent) -> Self {
        match event {
            DomainEvent::NewChatCreated(e) => Self::NewChatCreated(NewChatCreatedDto {
                event_id: e.event_id.as_uuid(),
                created_at: e.created_at.value(),
                chat_oid: e.chat_oid.to_string(),
                chat_title: e.chat_title.clone(),
            }),
            DomainEvent::NewMessageReceived(e) => Self::NewMessageReceived(NewMessageReceivedDto {
                event_id: e.event_id.as_uuid(),
                created_at: e.created_at.value(),
                chat_oid: e.chat_oid.to_string(),
                message_oid: e.message_oid.to_string(),
                message_text: e.message_text.clone(),
                source: e.source.clone(),
            }),
            DomainEvent::ChatDeleted(e) => Self::ChatDeleted(ChatDeletedDto {
                event_id: e.event_id.as_uuid(),
                created_at: e.created_at.value(),
                chat_oid: e.chat_oid.to_string(),
            }),
            DomainEvent::ListenerAdded(e) => Self::ListenerAdded(ListenerAddedDto {
                event_id: e.event_id.as_uuid(),
                created_at: e.created_at.value(),
                chat_oid: e.chat_oid.to_string(),
                listener_id: e.listener_id.to_string(),
            }),
        }
    }
}
