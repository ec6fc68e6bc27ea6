//! Integration events: facts that arrive from outside the process.
//!
//! They are decoded from the broker wire format and never carry references
//! to local aggregates or handler state.

use super::error::ApplicationError;
use crate::{
    domain::{ChatId, EventId, MessageId, Timestamp},
    infrastructure::dto::broker::{BrokerEventDto, NewMessageReceivedDto},
};

/// A chat message delivered by the broker, possibly produced by another node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageReceivedFromBroker {
    pub event_id: EventId,
    pub created_at: Timestamp,
    pub chat_oid: ChatId,
    pub message_oid: MessageId,
    pub message_text: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationEvent {
    NewMessageReceivedFromBroker(NewMessageReceivedFromBroker),
}

impl IntegrationEvent {
    pub fn event_id(&self) -> EventId {
        match self {
            Self::NewMessageReceivedFromBroker(e) => e.event_id,
        }
    }

    pub fn chat_oid(&self) -> &ChatId {
        match self {
            Self::NewMessageReceivedFromBroker(e) => &e.chat_oid,
        }
    }
}

impl TryFrom<NewMessageReceivedDto> for NewMessageReceivedFromBroker {
    type Error = ApplicationError;

    fn try_from(dto: NewMessageReceivedDto) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: EventId::from_uuid(dto.event_id),
            created_at: Timestamp::new(dto.created_at),
            chat_oid: ChatId::new(dto.chat_oid)?,
            message_oid: MessageId::new(dto.message_oid)?,
            message_text: dto.message_text,
            source: dto.source,
        })
    }
}

/// Only chat messages are consumed from the broker; every other type is
/// rejected with `UnsupportedEvent`.
impl TryFrom<BrokerEventDto> for IntegrationEvent {
    type Error = ApplicationError;

    fn try_from(dto: BrokerEventDto) -> Result<Self, Self::Error> {
        match dto {
            BrokerEventDto::NewMessageReceived(message) => {
                Ok(Self::NewMessageReceivedFromBroker(message.try_into()?))
            }
            other => Err(ApplicationError::UnsupportedEvent(other.type_name().to_string())),
        }
    }
}

impl From<NewMessageReceivedFromBroker> for IntegrationEvent {
    fn from(event: NewMessageReceivedFromBroker) -> Self {
        Self::NewMessageReceivedFromBroker(event)
    }
}
