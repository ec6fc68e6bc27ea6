//! Server configuration from command-line flags and `HIBIKI_*` environment
//! variables.

use clap::{Parser, ValueEnum};

use crate::infrastructure::broker::{BrokerTopics, TopicTemplate};

/// Which message broker adapter to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BrokerKind {
    /// In-process broker, single node only
    Memory,
    Nats,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "hibiki-server", version, about = "Hibiki chat server")]
pub struct ServerConfig {
    #[arg(long, env = "HIBIKI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "HIBIKI_PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "HIBIKI_BROKER", value_enum, default_value_t = BrokerKind::Memory)]
    pub broker: BrokerKind,

    #[arg(long, env = "HIBIKI_NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    #[arg(long, env = "HIBIKI_NEW_CHAT_TOPIC", default_value = "chat.created")]
    pub new_chat_topic: String,

    /// May contain `{chat_oid}`; also the topic the consumer subscribes to
    #[arg(long, env = "HIBIKI_NEW_MESSAGE_TOPIC", default_value = "chat.{chat_oid}.messages")]
    pub new_message_topic: String,

    #[arg(long, env = "HIBIKI_CHAT_DELETED_TOPIC", default_value = "chat.deleted")]
    pub chat_deleted_topic: String,

    #[arg(long, env = "HIBIKI_LISTENER_ADDED_TOPIC", default_value = "chat.listener-added")]
    pub listener_added_topic: String,

    /// Default level when RUST_LOG is not set
    #[arg(long, env = "HIBIKI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn topics(&self) -> BrokerTopics {
        BrokerTopics {
            new_chat: TopicTemplate::new(self.new_chat_topic.as_str()),
            new_message: TopicTemplate::new(self.new_message_topic.as_str()),
            chat_deleted: TopicTemplate::new(self.chat_deleted_topic.as_str()),
            listener_added: TopicTemplate::new(self.listener_added_topic.as_str()),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            broker: BrokerKind::Memory,
            nats_url: "nats://127.0.0.1:4222".to_string(),
            new_chat_topic: "chat.created".to_string(),
            new_message_topic: "chat.{chat_oid}.messages".to_string(),
            chat_deleted_topic: "chat.deleted".to_string(),
            listener_added_topic: "chat.listener-added".to_string(),
            log_level: "info".to_string(),
        }
    }
}
