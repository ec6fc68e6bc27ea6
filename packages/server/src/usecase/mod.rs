//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から Mediator 経由で呼び出され、Domain 層を操作します。

pub mod command;
pub mod consumer;
pub mod error;
pub mod event_handler;
pub mod init;
pub mod integration_event;
pub mod mediator;
pub mod query;

pub use command::{AddTelegramListenerCommand, CreateChatCommand, CreateMessageCommand, DeleteChatCommand};
pub use consumer::BrokerConsumer;
pub use error::{ApplicationError, ApplicationResult};
pub use event_handler::{BroadcastToSubscribersHandler, PublishToBrokerHandler};
pub use init::{AppContext, build_context};
pub use integration_event::{IntegrationEvent, NewMessageReceivedFromBroker};
pub use mediator::{Event, EventKind, EventMediator, HandlerOutcome, Mediator, PublishReport};
pub use query::{GetAllChatsListenersQuery, GetAllChatsQuery, GetChatDetailQuery, GetMessagesQuery};
