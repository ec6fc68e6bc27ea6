//! Domain factories for creating identifiers.

use super::{ChatId, MessageId, error::ValueObjectError};

/// Factory for generating ChatId instances.
///
/// Keeps identifier generation apart from the validation logic in ChatId.
pub struct ChatIdFactory;

impl ChatIdFactory {
    /// Generate a new ChatId with a random UUID v4.
    pub fn generate() -> Result<ChatId, ValueObjectError> {
        ChatId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Factory for generating MessageId instances.
pub struct MessageIdFactory;

impl MessageIdFactory {
    pub fn generate() -> Result<MessageId, ValueObjectError> {
        MessageId::new(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_id_factory_generate() {
        // テスト項目: ChatIdFactory::generate() で UUID v4 形式の ChatId を生成できる
        // when (操作):
        let chat_id = ChatIdFactory::generate().unwrap();

        // then (期待する結果):
        assert_eq!(chat_id.as_str().len(), 36); // UUID v4 の標準長（ハイフン含む）
    }

    #[test]
    fn test_message_id_factory_generate_uniqueness() {
        // テスト項目: MessageIdFactory::generate() は毎回異なる ID を生成する
        // when (操作):
        let id1 = MessageIdFactory::generate().unwrap();
        let id2 = MessageIdFactory::generate().unwrap();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }
}
