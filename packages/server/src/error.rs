//! Top-level server errors.

use thiserror::Error;

use crate::{infrastructure::broker::BrokerError, usecase::ApplicationError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("HTTP server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Broker consumer failed: {0}")]
    Consumer(#[from] ApplicationError),

    #[error("Broker consumer task aborted: {0}")]
    ConsumerTask(#[from] tokio::task::JoinError),
}
