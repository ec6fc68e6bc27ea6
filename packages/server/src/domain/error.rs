//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("ChatId cannot be empty")]
    ChatIdEmpty,

    #[error("ChatId cannot exceed {max} characters (got {actual})")]
    ChatIdTooLong { max: usize, actual: usize },

    #[error("MessageId cannot be empty")]
    MessageIdEmpty,

    #[error("MessageId cannot exceed {max} characters (got {actual})")]
    MessageIdTooLong { max: usize, actual: usize },

    #[error("ListenerId cannot be empty")]
    ListenerIdEmpty,

    #[error("ListenerId cannot exceed {max} characters (got {actual})")]
    ListenerIdTooLong { max: usize, actual: usize },

    /// Title validation error
    #[error("Title cannot be empty")]
    TitleEmpty,

    #[error("Title cannot exceed {max} characters (got {actual})")]
    TitleTooLong { max: usize, actual: usize },

    /// Message text validation error
    #[error("Text cannot be empty")]
    TextEmpty,

    #[error("Text cannot exceed {max} characters (got {actual})")]
    TextTooLong { max: usize, actual: usize },
}

/// Errors related to Chat domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Listener '{0}' already exists")]
    ListenerAlreadyExists(String),

    #[error("Chat '{0}' is deleted")]
    ChatDeleted(String),
}
