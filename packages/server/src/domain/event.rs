//! Domain events recorded by aggregates.
//!
//! A domain event is an immutable fact produced by a business operation. Each
//! event carries its own identifier and creation timestamp next to the
//! type-specific payload.

use super::value_object::{ChatId, EventId, ListenerId, MessageId, Timestamp};

/// A new chat was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatCreated {
    pub event_id: EventId,
    pub created_at: Timestamp,
    pub chat_oid: ChatId,
    pub chat_title: String,
}

impl NewChatCreated {
    pub fn new(chat_oid: ChatId, chat_title: String) -> Self {
        Self {
            event_id: EventId::generate(),
            created_at: Timestamp::now(),
            chat_oid,
            chat_title,
        }
    }
}

/// A message was posted to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageReceived {
    pub event_id: EventId,
    pub created_at: Timestamp,
    pub chat_oid: ChatId,
    pub message_oid: MessageId,
    pub message_text: String,
    pub source: String,
}

impl NewMessageReceived {
    pub fn new(chat_oid: ChatId, message_oid: MessageId, message_text: String, source: String) -> Self {
        Self {
            event_id: EventId::generate(),
            created_at: Timestamp::now(),
            chat_oid,
            message_oid,
            message_text,
            source,
        }
    }
}

/// A chat was deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatDeleted {
    pub event_id: EventId,
    pub created_at: Timestamp,
    pub chat_oid: ChatId,
}

impl ChatDeleted {
    pub fn new(chat_oid: ChatId) -> Self {
        Self {
            event_id: EventId::generate(),
            created_at: Timestamp::now(),
            chat_oid,
        }
    }
}

/// An external listener was attached to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerAdded {
    pub event_id: EventId,
    pub created_at: Timestamp,
    pub chat_oid: ChatId,
    pub listener_id: ListenerId,
}

impl ListenerAdded {
    pub fn new(chat_oid: ChatId, listener_id: ListenerId) -> Self {
        Self {
            event_id: EventId::generate(),
            created_at: Timestamp::now(),
            chat_oid,
            listener_id,
        }
    }
}

/// Every fact the Chat aggregate can record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    NewChatCreated(NewChatCreated),
    NewMessageReceived(NewMessageReceived),
    ChatDeleted(ChatDeleted),
    ListenerAdded(ListenerAdded),
}

impl DomainEvent {
    pub fn event_id(&self) -> EventId {
        match self {
            Self::NewChatCreated(e) => e.event_id,
            Self::NewMessageReceived(e) => e.event_id,
            Self::ChatDeleted(e) => e.event_id,
            Self::ListenerAdded(e) => e.event_id,
        }
    }

    pub fn created_at(&self) -> Timestamp {
        match self {
            Self::NewChatCreated(e) => e.created_at,
            Self::NewMessageReceived(e) => e.created_at,
            Self::ChatDeleted(e) => e.created_at,
            Self::ListenerAdded(e) => e.created_at,
        }
    }

    /// The chat this event belongs to.
    pub fn chat_oid(&self) -> &ChatId {
        match self {
            Self::NewChatCreated(e) => &e.chat_oid,
            Self::NewMessageReceived(e) => &e.chat_oid,
            Self::ChatDeleted(e) => &e.chat_oid,
            Self::ListenerAdded(e) => &e.chat_oid,
        }
    }

    /// Wire discriminator of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewChatCreated(_) => "NewChatCreated",
            Self::NewMessageReceived(_) => "NewMessageReceived",
            Self::ChatDeleted(_) => "ChatDeleted",
            Self::ListenerAdded(_) => "ListenerAdded",
        }
    }
}

impl From<NewChatCreated> for DomainEvent {
    fn from(event: NewChatCreated) -> Self {
        Self::NewChatCreated(event)
    }
}

impl From<NewMessageReceived> for DomainEvent {
    fn from(event: NewMessageReceived) -> Self {
        Self::NewMessageReceived(event)
    }
}

impl From<ChatDeleted> for DomainEvent {
    fn from(event: ChatDeleted) -> Self {
        Self::ChatDeleted(event)
    }
}

impl From<ListenerAdded> for DomainEvent {
    fn from(event: ListenerAdded) -> Self {
        Self::ListenerAdded(event)
    }
}
