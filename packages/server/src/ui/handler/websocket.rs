//! WebSocket subscription handler.
//!
//! A client connects to `/ws/chats/{chat_oid}` and from then on receives every
//! message posted to that chat. The server only writes; anything the client
//! sends besides a close frame is ignored.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use hibiki_shared::time::get_jst_timestamp;
use serde::Serialize;

use crate::{
    domain::ChatId,
    infrastructure::{
        connection::{Connection, Outbound},
        dto::websocket::{ConnectedMessage, ErrorMessage, MessageType},
    },
    ui::state::AppState,
    usecase::GetChatDetailQuery,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(chat_oid): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, chat_oid))
}

async fn chat_exists(state: &AppState, chat_oid: &str) -> Result<ChatId, String> {
    state
        .mediator
        .dispatch_query(GetChatDetailQuery {
            chat_oid: chat_oid.to_string(),
        })
        .await
        .map(|chat| chat.oid)
        .map_err(|e| e.to_string())
}

async fn send_json<T: Serialize>(sender: &mut SplitSink<WebSocket, Message>, message: &T) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize WebSocket message: {}", e);
            return false;
        }
    };
    sender.send(Message::Text(json.into())).await.is_ok()
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, chat_oid: String) {
    let (mut sender, mut receiver) = socket.split();

    let chat_oid = match chat_exists(&state, &chat_oid).await {
        Ok(oid) => oid,
        Err(error) => {
            tracing::warn!(chat_oid = %chat_oid, "Rejecting subscription: {}", error);
            let rejected = ErrorMessage {
                r#type: MessageType::Error,
                error,
            };
            send_json(&mut sender, &rejected).await;
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    let connected = ConnectedMessage {
        r#type: MessageType::Connected,
        chat_oid: chat_oid.to_string(),
        connected_at: get_jst_timestamp(),
    };
    if !send_json(&mut sender, &connected).await {
        tracing::warn!(chat_oid = %chat_oid, "Client went away before subscribing");
        return;
    }

    let (connection, mut rx) = Connection::channel();
    let connection_id = connection.id();
    state.registry.attach(&chat_oid, connection).await;

    // The chat may have been deleted between the lookup and the attach
    if chat_exists(&state, chat_oid.as_str()).await.is_err() {
        state.registry.detach(&chat_oid, connection_id).await;
        let _ = sender.send(Message::Close(None)).await;
        return;
    }
    tracing::info!(chat_oid = %chat_oid, %connection_id, "Subscriber connected");

    // Forward registry pushes to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Text(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Drain client frames until it closes
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    };

    state.registry.detach(&chat_oid, connection_id).await;
    tracing::info!(chat_oid = %chat_oid, %connection_id, "Subscriber disconnected");
}
