//! Data transfer objects: HTTP bodies, WebSocket pushes and the broker wire
//! format.

pub mod broker;
pub mod http;
pub mod websocket;
