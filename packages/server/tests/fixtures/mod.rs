//! Test fixtures shared by the integration tests.
//!
//! `TestServer` runs the full router and broker consumer in-process, on an
//! ephemeral port, against the in-memory broker.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use hibiki_server::{
    domain::ChatId,
    error::ServerError,
    infrastructure::{
        broker::{BrokerTopics, InMemoryMessageBroker, MessageBroker},
        connection::ConnectionRegistry,
        repository::{InMemoryChatRepository, InMemoryMessageRepository},
    },
    ui::serve,
    usecase::{AppContext, build_context},
};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    addr: SocketAddr,
    pub broker: Arc<InMemoryMessageBroker>,
    pub context: AppContext,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<Result<(), ServerError>>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let broker = Arc::new(InMemoryMessageBroker::new());
        broker.start().await.expect("Failed to start broker");

        let context = build_context(
            broker.clone(),
            Arc::new(InMemoryChatRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(ConnectionRegistry::new()),
            BrokerTopics::default(),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, context.clone(), shutdown.clone()));

        let server = Self {
            addr,
            broker,
            context,
            shutdown,
            handle: Some(handle),
        };
        server
            .wait_until(|s| async move { s.broker.has_active_subscription() })
            .await;
        server
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, chat_oid: &str) -> String {
        format!("ws://{}/ws/chats/{}", self.addr, chat_oid)
    }

    /// Poll `condition` until it holds or the timeout expires.
    pub async fn wait_until<'a, F, Fut>(&'a self, condition: F)
    where
        F: Fn(&'a Self) -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        while !condition(self).await {
            assert!(tokio::time::Instant::now() < deadline, "Timed out waiting for condition");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn wait_for_subscribers(&self, chat_oid: &str, expected: usize) {
        let chat_oid = ChatId::new(chat_oid.to_string()).expect("Invalid chat oid");
        let chat_oid = &chat_oid;
        self.wait_until(|s| async move { s.context.registry.count(chat_oid).await == expected })
            .await;
    }

    /// Stop HTTP, then the consumer, and return the server result.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        self.shutdown.cancel();
        match self.handle.take() {
            Some(handle) => handle.await.expect("Server task panicked"),
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
