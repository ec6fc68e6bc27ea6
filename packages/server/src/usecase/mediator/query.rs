//! Query side of the mediator.

use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    sync::Arc,
};

use async_trait::async_trait;

use crate::usecase::error::{ApplicationError, ApplicationResult};

/// A read-only request.
pub trait Query: Send + Sync + 'static {
    type Output: Send + 'static;
}

#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    async fn handle(&self, query: &Q) -> ApplicationResult<Q::Output>;
}

/// Exactly one handler per query type.
#[derive(Default)]
pub struct QueryRegistry {
    // TypeId::of::<Q>() -> Arc<dyn QueryHandler<Q>>
    handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the handler for `Q`, replacing any previous one.
    pub fn register_query<Q: Query>(&mut self, handler: Arc<dyn QueryHandler<Q>>) {
        self.handlers.insert(TypeId::of::<Q>(), Box::new(handler));
    }

    pub async fn dispatch<Q: Query>(&self, query: Q) -> ApplicationResult<Q::Output> {
        let handler = self
            .handlers
            .get(&TypeId::of::<Q>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn QueryHandler<Q>>>())
            .ok_or(ApplicationError::HandlerNotRegistered {
                name: type_name::<Q>(),
            })?;
        handler.handle(&query).await
    }
}
