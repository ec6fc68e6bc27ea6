//! In-process mediator routing commands, queries and events to handlers.
//!
//! Command handlers publish the events their aggregate recorded, so they hold
//! the event side ([`EventMediator`]) directly. [`Mediator`] is the facade the
//! UI layer talks to and owns the command and query registries next to a
//! shared handle on the same event mediator.

mod command;
mod event;
mod query;

use std::sync::Arc;

pub use command::{Command, CommandHandler, CommandRegistry};
pub use event::{
    Event, EventHandler, EventKind, EventMediator, HandlerOutcome, HandlerResult, PublishReport,
};
pub use query::{Query, QueryHandler, QueryRegistry};

use super::error::ApplicationResult;

pub struct Mediator {
    commands: CommandRegistry,
    queries: QueryRegistry,
    events: Arc<EventMediator>,
}

impl Mediator {
    pub fn new(events: Arc<EventMediator>) -> Self {
        Self {
            commands: CommandRegistry::new(),
            queries: QueryRegistry::new(),
            events,
        }
    }

    pub fn register_command<C: Command>(&mut self, handlers: Vec<Arc<dyn CommandHandler<C>>>) {
        self.commands.register_command(handlers);
    }

    pub fn register_query<Q: Query>(&mut self, handler: Arc<dyn QueryHandler<Q>>) {
        self.queries.register_query(handler);
    }

    /// Run every handler registered for the command and collect their outputs.
    pub async fn dispatch_command<C: Command>(&self, command: C) -> ApplicationResult<Vec<C::Output>> {
        tracing::debug!(command = std::any::type_name::<C>(), "Dispatching command");
        self.commands.dispatch(command).await
    }

    pub async fn dispatch_query<Q: Query>(&self, query: Q) -> ApplicationResult<Q::Output> {
        self.queries.dispatch(query).await
    }

    pub async fn publish<I>(&self, events: I) -> ApplicationResult<PublishReport>
    where
        I: IntoIterator + Send,
        I::Item: Into<Event>,
    {
        self.events.publish(events).await
    }

    pub fn events(&self) -> &Arc<EventMediator> {
        &self.events
    }
}
