//! WebSocket message DTOs pushed to chat subscribers.

use serde::{Deserialize, Serialize};

/// Message type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Connected,
    NewMessage,
    ChatDeleted,
    Error,
}

/// Sent once after the subscription is accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedMessage {
    pub r#type: MessageType,
    pub chat_oid: String,
    /// Unix timestamp (milliseconds since epoch) in JST
    pub connected_at: i64,
}

/// A message posted to the chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessageMessage {
    pub r#type: MessageType,
    pub chat_oid: String,
    pub message_oid: String,
    pub message_text: String,
    pub source: String,
    pub created_at: i64,
}

/// The chat was deleted; the server closes the socket right after
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDeletedMessage {
    pub r#type: MessageType,
    pub chat_oid: String,
    pub deleted_at: i64,
}

/// Subscription rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub error: String,
}
