//! Repository ports.
//!
//! The domain layer defines what it needs from storage; the infrastructure
//! layer provides the implementations (dependency inversion).

use async_trait::async_trait;
use thiserror::Error;

use super::{
    entity::{Chat, ChatListener, Message},
    value_object::ChatId,
};

/// Default page size for list operations.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Repository errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    #[error("Chat already exists: {0}")]
    ChatAlreadyExists(String),

    #[error("Chat title already taken: {0}")]
    TitleAlreadyExists(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Pagination filters shared by list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFilters {
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn get_by_oid(&self, oid: &ChatId) -> Result<Option<Chat>, RepositoryError>;

    async fn exists_by_title(&self, title: &str) -> Result<bool, RepositoryError>;

    /// Store a new chat. Fails with `TitleAlreadyExists` when another chat
    /// already uses the title, checked atomically with the insert.
    async fn add(&self, chat: Chat) -> Result<(), RepositoryError>;

    async fn delete(&self, oid: &ChatId) -> Result<(), RepositoryError>;

    /// Returns the requested page and the total number of chats.
    async fn list(&self, filters: ListFilters) -> Result<(Vec<Chat>, usize), RepositoryError>;

    async fn add_listener(&self, oid: &ChatId, listener: ChatListener) -> Result<(), RepositoryError>;

    async fn get_listeners(&self, oid: &ChatId) -> Result<Vec<ChatListener>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn add(&self, message: Message) -> Result<(), RepositoryError>;

    /// Returns the requested page of a chat's messages and their total count.
    async fn list(
        &self,
        chat_oid: &ChatId,
        filters: ListFilters,
    ) -> Result<(Vec<Message>, usize), RepositoryError>;

    /// Remove every message of a chat. Returns how many were removed.
    async fn delete_by_chat(&self, chat_oid: &ChatId) -> Result<usize, RepositoryError>;
}
