//! 接続中の購読者をチャットごとに管理するレジストリ

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock, mpsc};
use uuid::Uuid;

use crate::domain::ChatId;

pub type ConnectionId = Uuid;

/// What the registry asks a connection writer to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Push a text frame
    Text(String),
    /// Send a close frame and stop writing
    Close,
}

/// Handle to one live subscriber.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl Connection {
    pub fn new(sender: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    /// Create a connection together with the receiver its writer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, outbound: Outbound) -> bool {
        self.sender.send(outbound).is_ok()
    }
}

type Bucket = Arc<Mutex<HashMap<ConnectionId, Connection>>>;

/// チャットごとの接続一覧
///
/// 外側の Map はバケットの追加・削除時のみ書き込みロックを取ります。
/// 送信はバケットのロック内で行うため、同じチャットへの attach / detach は
/// 実行中のブロードキャストの完了を待ち、detach 済みの接続へ送信されることはありません。
#[derive(Default)]
pub struct ConnectionRegistry {
    chats: RwLock<HashMap<ChatId, Bucket>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for a chat. Attaching the same connection twice
    /// keeps a single entry.
    pub async fn attach(&self, chat_oid: &ChatId, connection: Connection) {
        let mut chats = self.chats.write().await;
        let bucket = chats.entry(chat_oid.clone()).or_default().clone();
        let mut bucket = bucket.lock().await;
        bucket.insert(connection.id(), connection);
        tracing::debug!(chat_oid = %chat_oid, connections = bucket.len(), "Connection attached");
    }

    /// Remove a connection. Unknown chats and connections are ignored.
    pub async fn detach(&self, chat_oid: &ChatId, connection_id: ConnectionId) {
        let mut chats = self.chats.write().await;
        let Some(bucket) = chats.get(chat_oid).cloned() else {
            return;
        };
        let mut connections = bucket.lock().await;
        if connections.remove(&connection_id).is_some() {
            tracing::debug!(chat_oid = %chat_oid, %connection_id, "Connection detached");
        }
        if connections.is_empty() {
            chats.remove(chat_oid);
        }
    }

    /// Push `payload` to every connection of a chat and return how many
    /// accepted it. Connections whose writer is gone are dropped.
    pub async fn broadcast(&self, chat_oid: &ChatId, payload: &str) -> usize {
        let Some(bucket) = self.bucket(chat_oid).await else {
            return 0;
        };

        let mut connections = bucket.lock().await;
        let mut stale = Vec::new();
        let mut delivered = 0;
        for (id, connection) in connections.iter() {
            if connection.send(Outbound::Text(payload.to_string())) {
                delivered += 1;
            } else {
                tracing::warn!(chat_oid = %chat_oid, connection_id = %id, "Failed to deliver to connection");
                stale.push(*id);
            }
        }
        for id in stale {
            connections.remove(&id);
        }
        delivered
    }

    /// Ask every connection of a chat to close and forget the chat. Returns
    /// the number of connections that were told to close.
    pub async fn disconnect_all(&self, chat_oid: &ChatId) -> usize {
        let Some(bucket) = self.chats.write().await.remove(chat_oid) else {
            return 0;
        };

        let closed = close_bucket(&bucket).await;
        tracing::info!(chat_oid = %chat_oid, closed, "Disconnected all connections of chat");
        closed
    }

    /// Ask every connection of every chat to close and empty the registry.
    pub async fn close_all(&self) -> usize {
        let buckets: Vec<Bucket> = self.chats.write().await.drain().map(|(_, bucket)| bucket).collect();

        let mut closed = 0;
        for bucket in &buckets {
            closed += close_bucket(bucket).await;
        }
        tracing::info!(closed, "Closed all subscriber connections");
        closed
    }

    /// Number of live connections for a chat.
    pub async fn count(&self, chat_oid: &ChatId) -> usize {
        match self.bucket(chat_oid).await {
            Some(bucket) => bucket.lock().await.len(),
            None => 0,
        }
    }

    async fn bucket(&self, chat_oid: &ChatId) -> Option<Bucket> {
        self.chats.read().await.get(chat_oid).cloned()
    }
}

async fn close_bucket(bucket: &Bucket) -> usize {
    let mut connections = bucket.lock().await;
    let closed = connections
        .values()
        .filter(|connection| connection.send(Outbound::Close))
        .count();
    connections.clear();
    closed
}
