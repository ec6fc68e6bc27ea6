//! Broker topic names and templates.

use crate::domain::ChatId;

/// Placeholder interpolated with the chat identifier in chat-scoped topics.
pub const CHAT_OID_PLACEHOLDER: &str = "{chat_oid}";

/// Single-token wildcard used when subscribing to every chat-scoped topic.
pub const SINGLE_TOKEN_WILDCARD: &str = "*";

/// Multi-token wildcard, matches the rest of the subject.
pub const TAIL_WILDCARD: &str = ">";

/// A topic name, either static (`chat.created`) or chat-scoped
/// (`chat.{chat_oid}.messages`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTemplate(String);

impl TopicTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_chat_scoped(&self) -> bool {
        self.0.contains(CHAT_OID_PLACEHOLDER)
    }

    /// Concrete topic for one chat. Static topics render to themselves.
    pub fn render(&self, chat_oid: &ChatId) -> String {
        self.0.replace(CHAT_OID_PLACEHOLDER, chat_oid.as_str())
    }

    /// Pattern matching every topic this template can render to.
    pub fn subscription_pattern(&self) -> String {
        self.0.replace(CHAT_OID_PLACEHOLDER, SINGLE_TOKEN_WILDCARD)
    }
}

impl From<&str> for TopicTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Topics the application publishes domain events to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerTopics {
    pub new_chat: TopicTemplate,
    /// Also the inbound topic drained by the background consumer.
    pub new_message: TopicTemplate,
    pub chat_deleted: TopicTemplate,
    pub listener_added: TopicTemplate,
}

impl Default for BrokerTopics {
    fn default() -> Self {
        Self {
            new_chat: TopicTemplate::new("chat.created"),
            new_message: TopicTemplate::new("chat.{chat_oid}.messages"),
            chat_deleted: TopicTemplate::new("chat.deleted"),
            listener_added: TopicTemplate::new("chat.listener-added"),
        }
    }
}

/// NATS-style subject matching: tokens are separated by `.`, `*` matches
/// exactly one token and a trailing `>` matches one or more tokens.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let mut pattern_tokens = pattern.split('.');
    let mut topic_tokens = topic.split('.');

    loop {
        match (pattern_tokens.next(), topic_tokens.next()) {
            (Some(TAIL_WILDCARD), Some(_)) => return pattern_tokens.next().is_none(),
            (Some(SINGLE_TOKEN_WILDCARD), Some(token)) => {
                if token.is_empty() {
                    return false;
                }
            }
            (Some(p), Some(t)) => {
                if p != t {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}
