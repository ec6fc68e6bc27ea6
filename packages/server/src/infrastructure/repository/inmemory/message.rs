//! InMemory Message Repository 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::paginate;
use crate::domain::{ChatId, ListFilters, Message, MessageRepository, RepositoryError};

/// インメモリ Message Repository 実装
///
/// チャットごとに投稿順でメッセージを保持します。
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<HashMap<ChatId, Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn add(&self, message: Message) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().await;
        messages
            .entry(message.chat_oid.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn list(
        &self,
        chat_oid: &ChatId,
        filters: ListFilters,
    ) -> Result<(Vec<Message>, usize), RepositoryError> {
        let messages = self.messages.lock().await;
        match messages.get(chat_oid) {
            Some(chat_messages) => Ok((paginate(chat_messages, filters), chat_messages.len())),
            None => Ok((Vec::new(), 0)),
        }
    }

    async fn delete_by_chat(&self, chat_oid: &ChatId) -> Result<usize, RepositoryError> {
        let mut messages = self.messages.lock().await;
        Ok(messages.remove(chat_oid).map_or(0, |removed| removed.len()))
    }
}
