//! UseCase: コマンドとコマンドハンドラ
//!
//! どのハンドラも同じ流れで処理します。
//! 集約を取得（または作成）して変更を適用し、記録されたイベントを取り出して永続化した後、
//! イベントを publish します。publish の最初の失敗は呼び出し元へ返します。

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    error::{ApplicationError, ApplicationResult},
    mediator::{Command, CommandHandler, EventMediator},
};
use crate::domain::{
    Chat, ChatId, ChatListener, ChatRepository, DomainEvent, ListenerId, Message, MessageRepository,
    RepositoryError, Text, Title,
};

async fn load_chat(chat_repository: &dyn ChatRepository, chat_oid: &ChatId) -> ApplicationResult<Chat> {
    chat_repository
        .get_by_oid(chat_oid)
        .await?
        .ok_or_else(|| ApplicationError::ChatNotFound(chat_oid.to_string()))
}

async fn publish_events(events: &EventMediator, pulled: Vec<DomainEvent>) -> ApplicationResult<()> {
    events.publish(pulled).await?.into_result()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CreateChat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateChatCommand {
    pub title: String,
}

impl Command for CreateChatCommand {
    type Output = Chat;
}

pub struct CreateChatCommandHandler {
    chat_repository: Arc<dyn ChatRepository>,
    events: Arc<EventMediator>,
}

impl CreateChatCommandHandler {
    pub fn new(chat_repository: Arc<dyn ChatRepository>, events: Arc<EventMediator>) -> Self {
        Self {
            chat_repository,
            events,
        }
    }
}

#[async_trait]
impl CommandHandler<CreateChatCommand> for CreateChatCommandHandler {
    async fn handle(&self, command: &CreateChatCommand) -> ApplicationResult<Chat> {
        let title = Title::new(command.title.clone())?;
        if self.chat_repository.exists_by_title(title.as_str()).await? {
            return Err(ApplicationError::ChatTitleAlreadyExists(title.to_string()));
        }

        let mut chat = Chat::create(title)?;
        let events = chat.pull_events();
        self.chat_repository.add(chat.clone()).await.map_err(|e| match e {
            RepositoryError::TitleAlreadyExists(title) => ApplicationError::ChatTitleAlreadyExists(title),
            other => other.into(),
        })?;
        tracing::info!(chat_oid = %chat.oid, title = %chat.title, "Chat created");

        publish_events(&self.events, events).await?;
        Ok(chat)
    }
}

// ---------------------------------------------------------------------------
// CreateMessage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateMessageCommand {
    pub chat_oid: String,
    pub text: String,
    pub source: String,
}

impl Command for CreateMessageCommand {
    type Output = Message;
}

pub struct CreateMessageCommandHandler {
    chat_repository: Arc<dyn ChatRepository>,
    message_repository: Arc<dyn MessageRepository>,
    events: Arc<EventMediator>,
}

impl CreateMessageCommandHandler {
    pub fn new(
        chat_repository: Arc<dyn ChatRepository>,
        message_repository: Arc<dyn MessageRepository>,
        events: Arc<EventMediator>,
    ) -> Self {
        Self {
            chat_repository,
            message_repository,
            events,
        }
    }
}

#[async_trait]
impl CommandHandler<CreateMessageCommand> for CreateMessageCommandHandler {
    async fn handle(&self, command: &CreateMessageCommand) -> ApplicationResult<Message> {
        let chat_oid = ChatId::new(command.chat_oid.clone())?;
        let text = Text::new(command.text.clone())?;
        let mut chat = load_chat(self.chat_repository.as_ref(), &chat_oid).await?;

        let message = Message::new(chat_oid, text, command.source.clone())?;
        chat.add_message(&message)?;
        let events = chat.pull_events();
        self.message_repository.add(message.clone()).await?;
        tracing::info!(chat_oid = %message.chat_oid, message_oid = %message.oid, "Message created");

        publish_events(&self.events, events).await?;
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// DeleteChat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DeleteChatCommand {
    pub chat_oid: String,
}

impl Command for DeleteChatCommand {
    type Output = ();
}

pub struct DeleteChatCommandHandler {
    chat_repository: Arc<dyn ChatRepository>,
    message_repository: Arc<dyn MessageRepository>,
    events: Arc<EventMediator>,
}

impl DeleteChatCommandHandler {
    pub fn new(
        chat_repository: Arc<dyn ChatRepository>,
        message_repository: Arc<dyn MessageRepository>,
        events: Arc<EventMediator>,
    ) -> Self {
        Self {
            chat_repository,
            message_repository,
            events,
        }
    }
}

#[async_trait]
impl CommandHandler<DeleteChatCommand> for DeleteChatCommandHandler {
    async fn handle(&self, command: &DeleteChatCommand) -> ApplicationResult<()> {
        let chat_oid = ChatId::new(command.chat_oid.clone())?;
        let mut chat = load_chat(self.chat_repository.as_ref(), &chat_oid).await?;

        chat.delete();
        let events = chat.pull_events();
        self.chat_repository.delete(&chat_oid).await?;
        let removed = self.message_repository.delete_by_chat(&chat_oid).await?;
        tracing::info!(chat_oid = %chat_oid, removed_messages = removed, "Chat deleted");

        publish_events(&self.events, events).await
    }
}

// ---------------------------------------------------------------------------
// AddTelegramListener
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AddTelegramListenerCommand {
    pub chat_oid: String,
    pub telegram_chat_id: String,
}

impl Command for AddTelegramListenerCommand {
    type Output = ChatListener;
}

pub struct AddTelegramListenerCommandHandler {
    chat_repository: Arc<dyn ChatRepository>,
    events: Arc<EventMediator>,
}

impl AddTelegramListenerCommandHandler {
    pub fn new(chat_repository: Arc<dyn ChatRepository>, events: Arc<EventMediator>) -> Self {
        Self {
            chat_repository,
            events,
        }
    }
}

#[async_trait]
impl CommandHandler<AddTelegramListenerCommand> for AddTelegramListenerCommandHandler {
    async fn handle(&self, command: &AddTelegramListenerCommand) -> ApplicationResult<ChatListener> {
        let chat_oid = ChatId::new(command.chat_oid.clone())?;
        let listener = ChatListener::new(ListenerId::new(command.telegram_chat_id.clone())?);
        let mut chat = load_chat(self.chat_repository.as_ref(), &chat_oid).await?;

        chat.add_listener(listener.clone())?;
        let events = chat.pull_events();
        self.chat_repository
            .add_listener(&chat_oid, listener.clone())
            .await?;
        tracing::info!(chat_oid = %chat_oid, listener_id = %listener.oid, "Listener added");

        publish_events(&self.events, events).await?;
        Ok(listener)
    }
}
