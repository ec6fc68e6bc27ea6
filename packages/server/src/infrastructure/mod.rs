//! Infrastructure layer: broker adapters, the connection registry, storage
//! implementations and DTOs.

pub mod broker;
pub mod connection;
pub mod dto;
pub mod repository;
