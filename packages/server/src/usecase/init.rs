//! アプリケーションの組み立て
//!
//! ハンドラの登録は Mediator を共有する前に、ここで一度だけ行います。
//! 以降、レジストリは読み取り専用です。

use std::sync::Arc;

use super::{
    command::{
        AddTelegramListenerCommand, AddTelegramListenerCommandHandler, CreateChatCommand,
        CreateChatCommandHandler, CreateMessageCommand, CreateMessageCommandHandler, DeleteChatCommand,
        DeleteChatCommandHandler,
    },
    consumer::BrokerConsumer,
    event_handler::{BroadcastToSubscribersHandler, PublishToBrokerHandler},
    mediator::{CommandHandler, EventHandler, EventKind, EventMediator, Mediator, QueryHandler},
    query::{
        GetAllChatsListenersQuery, GetAllChatsListenersQueryHandler, GetAllChatsQuery, GetAllChatsQueryHandler,
        GetChatDetailQuery, GetChatDetailQueryHandler, GetMessagesQuery, GetMessagesQueryHandler,
    },
};
use crate::{
    domain::{ChatRepository, MessageRepository},
    infrastructure::{
        broker::{BrokerTopics, MessageBroker, TopicTemplate},
        connection::ConnectionRegistry,
    },
};

/// UI 層が実行時に必要とする依存一式
#[derive(Clone)]
pub struct AppContext {
    pub mediator: Arc<Mediator>,
    pub registry: Arc<ConnectionRegistry>,
    pub broker: Arc<dyn MessageBroker>,
    pub consumer: Arc<BrokerConsumer>,
    pub topics: BrokerTopics,
}

pub fn build_context(
    broker: Arc<dyn MessageBroker>,
    chat_repository: Arc<dyn ChatRepository>,
    message_repository: Arc<dyn MessageRepository>,
    registry: Arc<ConnectionRegistry>,
    topics: BrokerTopics,
) -> AppContext {
    let events = Arc::new(build_event_mediator(&broker, &registry, &topics));
    let mut mediator = Mediator::new(events.clone());

    let create_chat: Arc<dyn CommandHandler<CreateChatCommand>> =
        Arc::new(CreateChatCommandHandler::new(chat_repository.clone(), events.clone()));
    mediator.register_command(vec![create_chat]);

    let create_message: Arc<dyn CommandHandler<CreateMessageCommand>> = Arc::new(CreateMessageCommandHandler::new(
        chat_repository.clone(),
        message_repository.clone(),
        events.clone(),
    ));
    mediator.register_command(vec![create_message]);

    let delete_chat: Arc<dyn CommandHandler<DeleteChatCommand>> = Arc::new(DeleteChatCommandHandler::new(
        chat_repository.clone(),
        message_repository.clone(),
        events.clone(),
    ));
    mediator.register_command(vec![delete_chat]);

    let add_listener: Arc<dyn CommandHandler<AddTelegramListenerCommand>> =
        Arc::new(AddTelegramListenerCommandHandler::new(chat_repository.clone(), events.clone()));
    mediator.register_command(vec![add_listener]);

    let chat_detail: Arc<dyn QueryHandler<GetChatDetailQuery>> =
        Arc::new(GetChatDetailQueryHandler::new(chat_repository.clone()));
    mediator.register_query(chat_detail);

    let all_chats: Arc<dyn QueryHandler<GetAllChatsQuery>> =
        Arc::new(GetAllChatsQueryHandler::new(chat_repository.clone()));
    mediator.register_query(all_chats);

    let messages: Arc<dyn QueryHandler<GetMessagesQuery>> = Arc::new(GetMessagesQueryHandler::new(
        chat_repository.clone(),
        message_repository,
    ));
    mediator.register_query(messages);

    let listeners: Arc<dyn QueryHandler<GetAllChatsListenersQuery>> =
        Arc::new(GetAllChatsListenersQueryHandler::new(chat_repository));
    mediator.register_query(listeners);

    let consumer = Arc::new(BrokerConsumer::new(
        broker.clone(),
        events,
        topics.new_message.subscription_pattern(),
    ));

    AppContext {
        mediator: Arc::new(mediator),
        registry,
        broker,
        consumer,
        topics,
    }
}

fn build_event_mediator(
    broker: &Arc<dyn MessageBroker>,
    registry: &Arc<ConnectionRegistry>,
    topics: &BrokerTopics,
) -> EventMediator {
    let publish_to = |topic: &TopicTemplate| -> Arc<dyn EventHandler> {
        Arc::new(PublishToBrokerHandler::new(broker.clone(), topic.clone()))
    };
    let broadcast: Arc<dyn EventHandler> = Arc::new(BroadcastToSubscribersHandler::new(registry.clone()));

    let mut events = EventMediator::new();
    events.register_event(EventKind::NewChatCreated, vec![publish_to(&topics.new_chat)]);
    events.register_event(EventKind::NewMessageReceived, vec![publish_to(&topics.new_message)]);
    // Local subscribers are told before the broker, so they hear about the
    // deletion even while the broker is down.
    events.register_event(
        EventKind::ChatDeleted,
        vec![broadcast.clone(), publish_to(&topics.chat_deleted)],
    );
    events.register_event(EventKind::ListenerAdded, vec![publish_to(&topics.listener_added)]);
    events.register_event(EventKind::NewMessageReceivedFromBroker, vec![broadcast]);
    events
}
