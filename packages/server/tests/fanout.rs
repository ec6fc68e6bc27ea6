//! Event fan-out integration tests.
//!
//! Commands published to the broker, broker messages broadcast to WebSocket
//! subscribers, and chat deletion closing every subscriber.

mod fixtures;
use std::time::Duration;

use bytes::Bytes;
use fixtures::{TestServer, WAIT_TIMEOUT};
use futures_util::StreamExt;
use hibiki_server::{
    domain::ChatId,
    infrastructure::{
        broker::MessageBroker,
        connection::{Connection, Outbound},
    },
};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(server: &TestServer, chat_oid: &str) -> Client {
    let (ws, _) = connect_async(server.ws_url(chat_oid))
        .await
        .expect("Failed to connect WebSocket");
    ws
}

/// Next text frame parsed as JSON.
async fn next_json(ws: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(WAIT_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Stream ended")
            .expect("WebSocket error");
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).expect("Failed to parse JSON"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

async fn expect_close(ws: &mut Client) {
    let frame = tokio::time::timeout(WAIT_TIMEOUT, ws.next())
        .await
        .expect("Timed out waiting for close");
    match frame {
        None | Some(Ok(Message::Close(_))) => {}
        Some(other) => panic!("expected close, got {:?}", other),
    }
}

async fn create_chat(client: &reqwest::Client, server: &TestServer, title: &str) -> String {
    let response = client
        .post(format!("{}/api/chats", server.base_url()))
        .json(&json!({ "title": title }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    body["oid"].as_str().expect("oid should be a string").to_string()
}

#[tokio::test]
async fn test_create_chat_publishes_new_chat_event() {
    // テスト項目: チャット作成で chat.created へイベント ID をキーとして publish される
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let oid = create_chat(&client, &server, "Team Standup").await;

    // then (期待する結果):
    let records = server.broker.published_to("chat.created");
    assert_eq!(records.len(), 1);
    let payload: Value = serde_json::from_slice(&records[0].payload).unwrap();
    assert_eq!(payload["type"], "NewChatCreated");
    assert_eq!(payload["chat_oid"], oid.as_str());
    assert_eq!(payload["chat_title"], "Team Standup");
    assert_eq!(records[0].key_str(), payload["event_id"].as_str().unwrap());
}

#[tokio::test]
async fn test_broker_message_reaches_registered_connection() {
    // テスト項目: ブローカーから届いたメッセージが登録済みの接続へ配信される
    // given (前提条件):
    let server = TestServer::start().await;
    let chat_oid = ChatId::new("C1".to_string()).unwrap();
    let (connection, mut rx) = Connection::channel();
    server.context.registry.attach(&chat_oid, connection).await;

    // when (操作):
    server
        .broker
        .publish(
            "chat.C1.messages",
            b"k1",
            Bytes::from_static(
                br#"{"type":"NewMessageReceivedFromBroker","chat_oid":"C1","message_text":"hi","message_oid":"m1"}"#,
            ),
        )
        .await
        .unwrap();

    // then (期待する結果):
    let received = tokio::time::timeout(WAIT_TIMEOUT, rx.recv()).await.unwrap();
    let Some(Outbound::Text(text)) = received else {
        panic!("expected a text frame");
    };
    let json: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["type"], "new-message");
    assert_eq!(json["message_text"], "hi");
    assert_eq!(json["message_oid"], "m1");
}

#[tokio::test]
async fn test_websocket_receives_connected_then_broker_message() {
    // テスト項目: WebSocket 購読者が接続通知と、ブローカー経由のメッセージを受信する
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let oid = create_chat(&client, &server, "Team Standup").await;
    let mut ws = connect(&server, &oid).await;

    let connected = next_json(&mut ws).await;
    assert_eq!(connected["type"], "connected");
    assert_eq!(connected["chat_oid"], oid.as_str());
    server.wait_for_subscribers(&oid, 1).await;

    // when (操作):
    let payload = json!({
        "type": "NewMessageReceivedFromBroker",
        "chat_oid": oid,
        "message_text": "from telegram",
        "message_oid": "m1",
        "source": "telegram",
    });
    server
        .broker
        .publish(
            &format!("chat.{}.messages", oid),
            b"k1",
            Bytes::from(serde_json::to_vec(&payload).unwrap()),
        )
        .await
        .unwrap();

    // then (期待する結果):
    let message = next_json(&mut ws).await;
    assert_eq!(message["type"], "new-message");
    assert_eq!(message["message_text"], "from telegram");
    assert_eq!(message["source"], "telegram");
}

#[tokio::test]
async fn test_posted_message_round_trips_to_websocket() {
    // テスト項目: HTTP で投稿したメッセージがブローカーを経由して購読者へ届く
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let oid = create_chat(&client, &server, "Team Standup").await;
    let mut ws = connect(&server, &oid).await;
    next_json(&mut ws).await;
    server.wait_for_subscribers(&oid, 1).await;

    // when (操作):
    let response = client
        .post(format!("{}/api/chats/{}/messages", server.base_url(), oid))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let posted: Value = response.json().await.unwrap();

    // then (期待する結果):
    let message = next_json(&mut ws).await;
    assert_eq!(message["type"], "new-message");
    assert_eq!(message["message_text"], "hello");
    assert_eq!(message["message_oid"], posted["oid"]);
    assert_eq!(message["chat_oid"], oid.as_str());
}

#[tokio::test]
async fn test_delete_chat_notifies_and_closes_every_subscriber() {
    // テスト項目: チャット削除で全購読者へ削除通知が届き、接続が閉じられる
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let oid = create_chat(&client, &server, "Team Standup").await;
    let mut first = connect(&server, &oid).await;
    let mut second = connect(&server, &oid).await;
    next_json(&mut first).await;
    next_json(&mut second).await;
    server.wait_for_subscribers(&oid, 2).await;

    // when (操作):
    let response = client
        .delete(format!("{}/api/chats/{}", server.base_url(), oid))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // then (期待する結果):
    for ws in [&mut first, &mut second] {
        let notice = next_json(ws).await;
        assert_eq!(notice["type"], "chat-deleted");
        assert_eq!(notice["chat_oid"], oid.as_str());
        expect_close(ws).await;
    }
    let chat_oid = ChatId::new(oid.clone()).unwrap();
    assert_eq!(server.context.registry.count(&chat_oid).await, 0);
    assert_eq!(server.context.registry.broadcast(&chat_oid, "late").await, 0);
}

#[tokio::test]
async fn test_websocket_for_unknown_chat_is_rejected() {
    // テスト項目: 存在しないチャットへの WebSocket 接続はエラー通知の後に閉じられる
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let mut ws = connect(&server, "nonexistent").await;

    // then (期待する結果):
    let error = next_json(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert!(error["error"].as_str().unwrap().contains("nonexistent"));
    expect_close(&mut ws).await;
    assert_eq!(
        server
            .context
            .registry
            .count(&ChatId::new("nonexistent".to_string()).unwrap())
            .await,
        0
    );
}

#[tokio::test]
async fn test_client_disconnect_detaches_subscriber() {
    // テスト項目: クライアントが切断すると購読が解除される
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let oid = create_chat(&client, &server, "Team Standup").await;
    let mut ws = connect(&server, &oid).await;
    next_json(&mut ws).await;
    server.wait_for_subscribers(&oid, 1).await;

    // when (操作):
    ws.close(None).await.expect("Failed to close WebSocket");

    // then (期待する結果):
    server.wait_for_subscribers(&oid, 0).await;
}

#[tokio::test]
async fn test_consumer_skips_malformed_payloads() {
    // テスト項目: 不正なメッセージの後もコンシューマは配信を続ける
    // given (前提条件):
    let server = TestServer::start().await;
    let chat_oid = ChatId::new("C1".to_string()).unwrap();
    let (connection, mut rx) = Connection::channel();
    server.context.registry.attach(&chat_oid, connection).await;

    // when (操作):
    server
        .broker
        .publish("chat.C1.messages", b"k0", Bytes::from_static(b"{not json"))
        .await
        .unwrap();
    server
        .broker
        .publish(
            "chat.C1.messages",
            b"k1",
            Bytes::from_static(
                br#"{"type":"NewMessageReceivedFromBroker","chat_oid":"C1","message_text":"still here","message_oid":"m2"}"#,
            ),
        )
        .await
        .unwrap();

    // then (期待する結果):
    let received = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
    assert!(matches!(received, Some(Outbound::Text(text)) if text.contains("still here")));
}

#[tokio::test]
async fn test_shutdown_closes_remaining_subscribers() {
    // テスト項目: サーバー停止時に残っている購読者へ Close が送られ、登録が解除される
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let oid = create_chat(&client, &server, "Team Standup").await;
    let chat_oid = ChatId::new(oid.clone()).unwrap();
    let (connection, mut rx) = Connection::channel();
    server.context.registry.attach(&chat_oid, connection).await;
    let mut ws = connect(&server, &oid).await;
    next_json(&mut ws).await;
    server.wait_for_subscribers(&oid, 2).await;
    let registry = server.context.registry.clone();

    // when (操作):
    let result = server.shutdown().await;

    // then (期待する結果):
    assert!(result.is_ok());
    assert_eq!(rx.try_recv().unwrap(), Outbound::Close);
    expect_close(&mut ws).await;
    assert_eq!(registry.count(&chat_oid).await, 0);
}
