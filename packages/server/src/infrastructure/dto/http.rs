//! HTTP API request/response DTOs for the chat application.

use hibiki_shared::time::timestamp_to_jst_rfc3339;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Chat, ChatListener, DEFAULT_MESSAGE_SOURCE, ListFilters, Message, repository::DEFAULT_LIST_LIMIT,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

/// `?limit=&offset=` on list endpoints
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<PaginationQuery> for ListFilters {
    fn from(query: PaginationQuery) -> Self {
        Self {
            limit: query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            offset: query.offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub title: String,
}

/// Chat summary used by create, detail and list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDto {
    pub oid: String,
    pub title: String,
    pub created_at: String, // ISO 8601
}

impl From<&Chat> for ChatDto {
    fn from(chat: &Chat) -> Self {
        Self {
            oid: chat.oid.to_string(),
            title: chat.title.to_string(),
            created_at: timestamp_to_jst_rfc3339(chat.created_at.value()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub text: String,
    /// Defaults to "api"
    #[serde(default)]
    pub source: Option<String>,
}

impl CreateMessageRequest {
    pub fn source(&self) -> String {
        self.source
            .clone()
            .unwrap_or_else(|| DEFAULT_MESSAGE_SOURCE.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub oid: String,
    pub chat_oid: String,
    pub text: String,
    pub source: String,
    pub created_at: String, // ISO 8601
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            oid: message.oid.to_string(),
            chat_oid: message.chat_oid.to_string(),
            text: message.text.to_string(),
            source: message.source.clone(),
            created_at: timestamp_to_jst_rfc3339(message.created_at.value()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTelegramListenerRequest {
    pub telegram_chat_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerDto {
    pub listener_id: String,
    pub created_at: String, // ISO 8601
}

impl From<&ChatListener> for ListenerDto {
    fn from(listener: &ChatListener) -> Self {
        Self {
            listener_id: listener.oid.to_string(),
            created_at: timestamp_to_jst_rfc3339(listener.created_at.value()),
        }
    }
}

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub count: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> PageDto<T> {
    pub fn new(items: Vec<T>, count: usize, filters: ListFilters) -> Self {
        Self {
            items,
            count,
            limit: filters.limit,
            offset: filters.offset,
        }
    }
}
