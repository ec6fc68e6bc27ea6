//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ChatRepository trait の具体的な実装。
//! 作成順を保つため Vec をインメモリ DB として使用します。

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::paginate;
use crate::domain::{Chat, ChatId, ChatListener, ChatRepository, ListFilters, RepositoryError};

/// インメモリ Chat Repository 実装
#[derive(Default)]
pub struct InMemoryChatRepository {
    chats: Mutex<Vec<Chat>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn get_by_oid(&self, oid: &ChatId) -> Result<Option<Chat>, RepositoryError> {
        let chats = self.chats.lock().await;
        Ok(chats.iter().find(|chat| &chat.oid == oid).cloned())
    }

    async fn exists_by_title(&self, title: &str) -> Result<bool, RepositoryError> {
        let chats = self.chats.lock().await;
        Ok(chats.iter().any(|chat| chat.title.as_str() == title))
    }

    async fn add(&self, chat: Chat) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().await;
        if chats.iter().any(|c| c.oid == chat.oid) {
            return Err(RepositoryError::ChatAlreadyExists(chat.oid.into_string()));
        }
        // タイトルの重複チェックは追加と同じロック内で行う
        if chats.iter().any(|c| c.title == chat.title) {
            return Err(RepositoryError::TitleAlreadyExists(chat.title.to_string()));
        }
        chats.push(chat);
        Ok(())
    }

    async fn delete(&self, oid: &ChatId) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().await;
        let before = chats.len();
        chats.retain(|chat| &chat.oid != oid);
        if chats.len() == before {
            return Err(RepositoryError::ChatNotFound(oid.to_string()));
        }
        Ok(())
    }

    async fn list(&self, filters: ListFilters) -> Result<(Vec<Chat>, usize), RepositoryError> {
        let chats = self.chats.lock().await;
        Ok((paginate(&chats, filters), chats.len()))
    }

    async fn add_listener(&self, oid: &ChatId, listener: ChatListener) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().await;
        let chat = chats
            .iter_mut()
            .find(|chat| &chat.oid == oid)
            .ok_or_else(|| RepositoryError::ChatNotFound(oid.to_string()))?;
        // 同じリスナーは 1 件のみ保持する
        if !chat.listeners.iter().any(|l| l.oid == listener.oid) {
            chat.listeners.push(listener);
        }
        Ok(())
    }

    async fn get_listeners(&self, oid: &ChatId) -> Result<Vec<ChatListener>, RepositoryError> {
        let chats = self.chats.lock().await;
        chats
            .iter()
            .find(|chat| &chat.oid == oid)
            .map(|chat| chat.listeners.clone())
            .ok_or_else(|| RepositoryError::ChatNotFound(oid.to_string()))
    }
}
