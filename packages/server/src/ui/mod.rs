//! UI layer: HTTP/WebSocket endpoints and the server runner.

mod error;
pub mod handler;
mod runner;
mod signal;
pub mod state;

pub use error::ApiError;
pub use runner::{create_router, run, serve};
pub use signal::shutdown_signal;
