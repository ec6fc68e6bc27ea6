//! Domain layer for the chat application.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{Chat, ChatListener, DEFAULT_MESSAGE_SOURCE, Message};
pub use error::{ChatError, ValueObjectError};
pub use event::{ChatDeleted, DomainEvent, ListenerAdded, NewChatCreated, NewMessageReceived};
pub use factory::{ChatIdFactory, MessageIdFactory};
pub use repository::{ChatRepository, ListFilters, MessageRepository, RepositoryError};
pub use value_object::{ChatId, EventId, ListenerId, MessageId, Text, Timestamp, Title};
