//! Live subscriber connections.
//!
//! The transport (WebSocket handshake, framing) lives in the UI layer; here a
//! connection is just a handle with an outbound channel.

mod registry;

pub use registry::{Connection, ConnectionId, ConnectionRegistry, Outbound};
