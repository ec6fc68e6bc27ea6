//! Shared state handed to every axum handler.

use std::sync::Arc;

use crate::{
    infrastructure::connection::ConnectionRegistry,
    usecase::{AppContext, Mediator},
};

/// Shared application state
pub struct AppState {
    /// Entry point to every command and query
    pub mediator: Arc<Mediator>,
    /// Live WebSocket subscribers per chat
    pub registry: Arc<ConnectionRegistry>,
}

impl From<&AppContext> for AppState {
    fn from(context: &AppContext) -> Self {
        Self {
            mediator: context.mediator.clone(),
            registry: context.registry.clone(),
        }
    }
}
