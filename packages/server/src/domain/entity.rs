//! Core domain models for the chat application.

use super::{
    error::{ChatError, ValueObjectError},
    event::{ChatDeleted, DomainEvent, ListenerAdded, NewChatCreated, NewMessageReceived},
    factory::{ChatIdFactory, MessageIdFactory},
    value_object::{ChatId, ListenerId, MessageId, Text, Timestamp, Title},
};

/// Default message source for messages posted through the HTTP API.
pub const DEFAULT_MESSAGE_SOURCE: &str = "api";

/// Chat aggregate.
///
/// Every mutating operation records a domain event in the pending list. The
/// command handler drains that list with [`Chat::pull_events`] exactly once
/// per command.
#[derive(Debug, Clone)]
pub struct Chat {
    pub oid: ChatId,
    pub title: Title,
    pub created_at: Timestamp,
    pub listeners: Vec<ChatListener>,
    pub is_deleted: bool,
    events: Vec<DomainEvent>,
}

impl Chat {
    /// Create a brand-new chat and record `NewChatCreated`.
    pub fn create(title: Title) -> Result<Self, ValueObjectError> {
        let mut chat = Self {
            oid: ChatIdFactory::generate()?,
            title,
            created_at: Timestamp::now(),
            listeners: Vec::new(),
            is_deleted: false,
            events: Vec::new(),
        };
        chat.register_event(NewChatCreated::new(chat.oid.clone(), chat.title.to_string()));
        Ok(chat)
    }

    /// Rebuild a chat from stored state. No event is recorded.
    pub fn restore(oid: ChatId, title: Title, created_at: Timestamp, listeners: Vec<ChatListener>) -> Self {
        Self {
            oid,
            title,
            created_at,
            listeners,
            is_deleted: false,
            events: Vec::new(),
        }
    }

    /// Record that `message` was posted to this chat.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ChatDeleted` if the chat has been deleted.
    pub fn add_message(&mut self, message: &Message) -> Result<(), ChatError> {
        self.ensure_active()?;
        self.register_event(NewMessageReceived::new(
            self.oid.clone(),
            message.oid.clone(),
            message.text.to_string(),
            message.source.clone(),
        ));
        Ok(())
    }

    /// Mark the chat deleted and record `ChatDeleted`.
    pub fn delete(&mut self) {
        if self.is_deleted {
            return;
        }
        self.is_deleted = true;
        self.register_event(ChatDeleted::new(self.oid.clone()));
    }

    /// Attach an external listener.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ListenerAlreadyExists` if the listener is already attached.
    pub fn add_listener(&mut self, listener: ChatListener) -> Result<(), ChatError> {
        self.ensure_active()?;
        if self.listeners.iter().any(|l| l.oid == listener.oid) {
            return Err(ChatError::ListenerAlreadyExists(listener.oid.into_string()));
        }
        self.register_event(ListenerAdded::new(self.oid.clone(), listener.oid.clone()));
        self.listeners.push(listener);
        Ok(())
    }

    /// Drain the pending events. A second call returns an empty list.
    pub fn pull_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[DomainEvent] {
        &self.events
    }

    fn register_event(&mut self, event: impl Into<DomainEvent>) {
        self.events.push(event.into());
    }

    fn ensure_active(&self) -> Result<(), ChatError> {
        if self.is_deleted {
            return Err(ChatError::ChatDeleted(self.oid.to_string()));
        }
        Ok(())
    }
}

/// A message posted to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub oid: MessageId,
    pub chat_oid: ChatId,
    pub text: Text,
    /// Where the message came from ("api", "telegram", ...)
    pub source: String,
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(chat_oid: ChatId, text: Text, source: impl Into<String>) -> Result<Self, ValueObjectError> {
        Ok(Self {
            oid: MessageIdFactory::generate()?,
            chat_oid,
            text,
            source: source.into(),
            created_at: Timestamp::now(),
        })
    }
}

/// External listener of a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListener {
    pub oid: ListenerId,
    pub created_at: Timestamp,
}

impl ChatListener {
    pub fn new(oid: ListenerId) -> Self {
        Self {
            oid,
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_chat() -> Chat {
        Chat::create(Title::new("Team Standup".to_string()).unwrap()).unwrap()
    }

    #[test]
    fn test_chat_create_records_new_chat_created() {
        // テスト項目: Chat 作成時に NewChatCreated イベントが記録される
        // when (操作):
        let chat = create_chat();

        // then (期待する結果):
        let events = chat.pending_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::NewChatCreated(e) => {
                assert_eq!(e.chat_oid, chat.oid);
                assert_eq!(e.chat_title, "Team Standup");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_pull_events_is_destructive() {
        // テスト項目: pull_events は 1 回目で全件、2 回目で空を返す
        // given (前提条件):
        let mut chat = create_chat();
        let message = Message::new(chat.oid.clone(), Text::new("hi".to_string()).unwrap(), "api").unwrap();
        chat.add_message(&message).unwrap();

        // when (操作):
        let first = chat.pull_events();
        let second = chat.pull_events();

        // then (期待する結果):
        assert_eq!(first.len(), 2);
        assert!(matches!(first[0], DomainEvent::NewChatCreated(_)));
        assert!(matches!(first[1], DomainEvent::NewMessageReceived(_)));
        assert!(second.is_empty());
    }

    #[test]
    fn test_add_message_records_payload() {
        // テスト項目: メッセージ追加時のイベントにテキストと ID が含まれる
        // given (前提条件):
        let mut chat = create_chat();
        chat.pull_events();
        let message = Message::new(chat.oid.clone(), Text::new("hello".to_string()).unwrap(), "telegram").unwrap();

        // when (操作):
        chat.add_message(&message).unwrap();

        // then (期待する結果):
        match &chat.pull_events()[0] {
            DomainEvent::NewMessageReceived(e) => {
                assert_eq!(e.message_oid, message.oid);
                assert_eq!(e.message_text, "hello");
                assert_eq!(e.source, "telegram");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_delete_records_once() {
        // テスト項目: 削除は一度だけ ChatDeleted を記録する
        // given (前提条件):
        let mut chat = create_chat();
        chat.pull_events();

        // when (操作):
        chat.delete();
        chat.delete();

        // then (期待する結果):
        assert!(chat.is_deleted);
        let events = chat.pull_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DomainEvent::ChatDeleted(_)));
    }

    #[test]
    fn test_add_message_to_deleted_chat_fails() {
        // テスト項目: 削除済みチャットにはメッセージを追加できない
        // given (前提条件):
        let mut chat = create_chat();
        chat.delete();
        chat.pull_events();
        let message = Message::new(chat.oid.clone(), Text::new("late".to_string()).unwrap(), "api").unwrap();

        // when (操作):
        let result = chat.add_message(&message);

        // then (期待する結果):
        assert_eq!(result, Err(ChatError::ChatDeleted(chat.oid.to_string())));
        assert!(chat.pull_events().is_empty());
    }

    #[test]
    fn test_add_duplicate_listener_fails() {
        // テスト項目: 同じリスナーは二重に登録できない
        // given (前提条件):
        let mut chat = create_chat();
        let listener_id = ListenerId::new("tg-1".to_string()).unwrap();
        chat.add_listener(ChatListener::new(listener_id.clone())).unwrap();

        // when (操作):
        let result = chat.add_listener(ChatListener::new(listener_id));

        // then (期待する結果):
        assert_eq!(result, Err(ChatError::ListenerAlreadyExists("tg-1".to_string())));
        assert_eq!(chat.listeners.len(), 1);
        // NewChatCreated + ListenerAdded only
        assert_eq!(chat.pull_events().len(), 2);
    }
}
