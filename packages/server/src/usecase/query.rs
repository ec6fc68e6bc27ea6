//! UseCase: 読み取り専用のクエリとクエリハンドラ

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    error::{ApplicationError, ApplicationResult},
    mediator::{Query, QueryHandler},
};
use crate::domain::{Chat, ChatId, ChatListener, ChatRepository, ListFilters, Message, MessageRepository};

async fn ensure_chat(chat_repository: &dyn ChatRepository, chat_oid: &str) -> ApplicationResult<Chat> {
    let chat_oid = ChatId::new(chat_oid.to_string())?;
    chat_repository
        .get_by_oid(&chat_oid)
        .await?
        .ok_or_else(|| ApplicationError::ChatNotFound(chat_oid.into_string()))
}

#[derive(Debug, Clone)]
pub struct GetChatDetailQuery {
    pub chat_oid: String,
}

impl Query for GetChatDetailQuery {
    type Output = Chat;
}

pub struct GetChatDetailQueryHandler {
    chat_repository: Arc<dyn ChatRepository>,
}

impl GetChatDetailQueryHandler {
    pub fn new(chat_repository: Arc<dyn ChatRepository>) -> Self {
        Self { chat_repository }
    }
}

#[async_trait]
impl QueryHandler<GetChatDetailQuery> for GetChatDetailQueryHandler {
    async fn handle(&self, query: &GetChatDetailQuery) -> ApplicationResult<Chat> {
        ensure_chat(self.chat_repository.as_ref(), &query.chat_oid).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetAllChatsQuery {
    pub filters: ListFilters,
}

impl Query for GetAllChatsQuery {
    /// One page of chats and the total number of chats
    type Output = (Vec<Chat>, usize);
}

pub struct GetAllChatsQueryHandler {
    chat_repository: Arc<dyn ChatRepository>,
}

impl GetAllChatsQueryHandler {
    pub fn new(chat_repository: Arc<dyn ChatRepository>) -> Self {
        Self { chat_repository }
    }
}

#[async_trait]
impl QueryHandler<GetAllChatsQuery> for GetAllChatsQueryHandler {
    async fn handle(&self, query: &GetAllChatsQuery) -> ApplicationResult<(Vec<Chat>, usize)> {
        Ok(self.chat_repository.list(query.filters).await?)
    }
}

#[derive(Debug, Clone)]
pub struct GetMessagesQuery {
    pub chat_oid: String,
    pub filters: ListFilters,
}

impl Query for GetMessagesQuery {
    type Output = (Vec<Message>, usize);
}

pub struct GetMessagesQueryHandler {
    chat_repository: Arc<dyn ChatRepository>,
    message_repository: Arc<dyn MessageRepository>,
}

impl GetMessagesQueryHandler {
    pub fn new(chat_repository: Arc<dyn ChatRepository>, message_repository: Arc<dyn MessageRepository>) -> Self {
        Self {
            chat_repository,
            message_repository,
        }
    }
}

#[async_trait]
impl QueryHandler<GetMessagesQuery> for GetMessagesQueryHandler {
    async fn handle(&self, query: &GetMessagesQuery) -> ApplicationResult<(Vec<Message>, usize)> {
        let chat = ensure_chat(self.chat_repository.as_ref(), &query.chat_oid).await?;
        Ok(self.message_repository.list(&chat.oid, query.filters).await?)
    }
}

#[derive(Debug, Clone)]
pub struct GetAllChatsListenersQuery {
    pub chat_oid: String,
}

impl Query for GetAllChatsListenersQuery {
    type Output = Vec<ChatListener>;
}

pub struct GetAllChatsListenersQueryHandler {
    chat_repository: Arc<dyn ChatRepository>,
}

impl GetAllChatsListenersQueryHandler {
    pub fn new(chat_repository: Arc<dyn ChatRepository>) -> Self {
        Self { chat_repository }
    }
}

#[async_trait]
impl QueryHandler<GetAllChatsListenersQuery> for GetAllChatsListenersQueryHandler {
    async fn handle(&self, query: &GetAllChatsListenersQuery) -> ApplicationResult<Vec<ChatListener>> {
        let chat = ensure_chat(self.chat_repository.as_ref(), &query.chat_oid).await?;
        Ok(self.chat_repository.get_listeners(&chat.oid).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ListenerId, Text, Title},
        infrastructure::repository::{InMemoryChatRepository, InMemoryMessageRepository},
    };

    async fn seeded() -> (Arc<InMemoryChatRepository>, Arc<InMemoryMessageRepository>, Chat) {
        let chats = Arc::new(InMemoryChatRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let mut chat = Chat::create(Title::new("Team Standup".to_string()).unwrap()).unwrap();
        chat.pull_events();
        chats.add(chat.clone()).await.unwrap();
        for text in ["one", "two", "three"] {
            let message = Message::new(chat.oid.clone(), Text::new(text.to_string()).unwrap(), "api").unwrap();
            messages.add(message).await.unwrap();
        }
        (chats, messages, chat)
    }

    #[tokio::test]
    async fn test_get_chat_detail() {
        // テスト項目: 存在するチャットの詳細を取得できる
        // given (前提条件):
        let (chats, _, chat) = seeded().await;
        let handler = GetChatDetailQueryHandler::new(chats);

        // when (操作):
        let found = handler
            .handle(&GetChatDetailQuery {
                chat_oid: chat.oid.to_string(),
            })
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(found.oid, chat.oid);
        assert_eq!(found.title.as_str(), "Team Standup");
    }

    #[tokio::test]
    async fn test_get_unknown_chat_detail_fails() {
        // テスト項目: 存在しないチャットは ChatNotFound になる
        // given (前提条件):
        let (chats, _, _) = seeded().await;
        let handler = GetChatDetailQueryHandler::new(chats);

        // when (操作):
        let result = handler
            .handle(&GetChatDetailQuery {
                chat_oid: "missing".to_string(),
            })
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(ApplicationError::ChatNotFound(oid)) if oid == "missing"));
    }

    #[tokio::test]
    async fn test_get_messages_paginates() {
        // テスト項目: メッセージ一覧は limit / offset と総件数を返す
        // given (前提条件):
        let (chats, messages, chat) = seeded().await;
        let handler = GetMessagesQueryHandler::new(chats, messages);

        // when (操作):
        let (page, total) = handler
            .handle(&GetMessagesQuery {
                chat_oid: chat.oid.to_string(),
                filters: ListFilters { limit: 1, offset: 2 },
            })
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].text.as_str(), "three");
    }

    #[tokio::test]
    async fn test_get_all_chats() {
        // テスト項目: チャット一覧が総件数付きで返される
        // given (前提条件):
        let (chats, _, chat) = seeded().await;
        let handler = GetAllChatsQueryHandler::new(chats);

        // when (操作):
        let (page, total) = handler.handle(&GetAllChatsQuery::default()).await.unwrap();

        // then (期待する結果):
        assert_eq!(total, 1);
        assert_eq!(page[0].oid, chat.oid);
    }

    #[tokio::test]
    async fn test_get_listeners() {
        // テスト項目: チャットのリスナー一覧を取得できる
        // given (前提条件):
        let (chats, _, chat) = seeded().await;
        chats
            .add_listener(&chat.oid, ChatListener::new(ListenerId::new("tg-1".to_string()).unwrap()))
            .await
            .unwrap();
        let handler = GetAllChatsListenersQueryHandler::new(chats);

        // when (操作):
        let listeners = handler
            .handle(&GetAllChatsListenersQuery {
                chat_oid: chat.oid.to_string(),
            })
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(listeners.len(), 1);
        assert_eq!(listeners[0].oid.as_str(), "tg-1");
    }
}
