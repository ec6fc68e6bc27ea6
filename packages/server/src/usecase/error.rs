//! UseCase 層のエラー定義

use thiserror::Error;

use crate::{
    domain::{ChatError, RepositoryError, ValueObjectError},
    infrastructure::broker::BrokerError,
};

#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Nothing is registered for a command, query or event kind (wiring bug)
    #[error("No handler registered for {name}")]
    HandlerNotRegistered { name: &'static str },

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    ValueObject(#[from] ValueObjectError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Chat with oid {0} not found")]
    ChatNotFound(String),

    #[error("Chat with title '{0}' already exists")]
    ChatTitleAlreadyExists(String),

    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A broker message whose type this service does not consume
    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
