//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{
    add_listener, create_chat, create_message, delete_chat, get_chat, health_check, list_chats, list_listeners,
    list_messages,
};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
