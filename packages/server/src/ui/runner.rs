//! Server startup, routing and graceful shutdown.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::{
    config::{BrokerKind, ServerConfig},
    error::ServerError,
    infrastructure::{
        broker::{InMemoryMessageBroker, MessageBroker, NatsMessageBroker},
        connection::ConnectionRegistry,
        repository::{InMemoryChatRepository, InMemoryMessageRepository},
    },
    ui::{handler, signal::cancel_on_signal, state::AppState},
    usecase::{AppContext, build_context},
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handler::health_check))
        .route("/api/chats", post(handler::create_chat).get(handler::list_chats))
        .route(
            "/api/chats/{chat_oid}",
            get(handler::get_chat).delete(handler::delete_chat),
        )
        .route(
            "/api/chats/{chat_oid}/messages",
            post(handler::create_message).get(handler::list_messages),
        )
        .route(
            "/api/chats/{chat_oid}/listeners",
            post(handler::add_listener).get(handler::list_listeners),
        )
        .route("/ws/chats/{chat_oid}", get(handler::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn create_broker(config: &ServerConfig) -> Arc<dyn MessageBroker> {
    match config.broker {
        BrokerKind::Memory => Arc::new(InMemoryMessageBroker::new()),
        BrokerKind::Nats => Arc::new(NatsMessageBroker::new(config.nats_url.as_str())),
    }
}

/// Run the server until Ctrl-C or SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let broker = create_broker(&config);
    if let Err(e) = broker.start().await {
        tracing::error!(broker = ?config.broker, "Failed to start message broker: {}", e);
        let _ = broker.close().await;
        return Err(e.into());
    }

    let context = build_context(
        broker,
        Arc::new(InMemoryChatRepository::new()),
        Arc::new(InMemoryMessageRepository::new()),
        Arc::new(ConnectionRegistry::new()),
        config.topics(),
    );

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await.map_err(|source| ServerError::Bind {
        addr: addr.clone(),
        source,
    })?;
    tracing::info!("Listening on {}", addr);

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());
    serve(listener, context, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled.
///
/// The broker must already be started. HTTP stops first, then the consumer
/// is cancelled, which unsubscribes and closes the broker. Remaining
/// subscribers are closed last.
pub async fn serve(listener: TcpListener, context: AppContext, shutdown: CancellationToken) -> Result<(), ServerError> {
    let consumer_cancel = CancellationToken::new();
    let consumer = context.consumer.clone();
    let consumer_task = tokio::spawn({
        let cancel = consumer_cancel.clone();
        async move { consumer.run(cancel).await }
    });

    let app = create_router(Arc::new(AppState::from(&context)));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("HTTP server received shutdown signal");
        })
        .await;

    consumer_cancel.cancel();
    let consumed = consumer_task.await;
    if let Err(e) = &consumed {
        tracing::error!("Broker consumer task aborted: {}", e);
    }

    // Upgraded sockets outlive the HTTP server, close them explicitly
    context.registry.close_all().await;

    served?;
    consumed??;
    tracing::info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::broker::{BrokerTopics, MockMessageBroker};

    #[tokio::test]
    async fn test_serve_reports_crashed_consumer() {
        // テスト項目: コンシューマのタスクが異常終了した場合、serve はエラーを返す
        // given (前提条件):
        let mut broker = MockMessageBroker::new();
        broker.expect_subscribe().returning(|_| panic!("subscription crashed"));
        broker.expect_unsubscribe().returning(|| panic!("subscription crashed"));
        let context = build_context(
            Arc::new(broker),
            Arc::new(InMemoryChatRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(ConnectionRegistry::new()),
            BrokerTopics::default(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        // when (操作):
        let result = serve(listener, context, shutdown).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ServerError::ConsumerTask(_))));
    }
}
