//! Hibiki chat server library.
//!
//! Layered as `domain` → `usecase` → `infrastructure` / `ui`. Commands and
//! queries go through an in-process mediator; domain events are published to a
//! message broker and broker messages are fanned out to WebSocket subscribers.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use ui::run;
