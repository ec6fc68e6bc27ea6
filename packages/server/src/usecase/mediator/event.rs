//! Event side of the mediator.
//!
//! Events are published in batches. Every kind in a batch must have at least
//! one handler; this is checked for the whole batch before anything runs.
//! Handlers then run sequentially: events in list order, and for each event
//! its handlers in registration order. A failing handler stops the remaining
//! handlers of that event only, the rest of the batch still runs.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, DomainEvent, EventId},
    usecase::{
        error::{ApplicationError, ApplicationResult},
        integration_event::IntegrationEvent,
    },
};

/// Anything the event mediator can dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Domain(DomainEvent),
    Integration(IntegrationEvent),
}

/// Registry key: one tag per concrete event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewChatCreated,
    NewMessageReceived,
    ChatDeleted,
    ListenerAdded,
    NewMessageReceivedFromBroker,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewChatCreated => "NewChatCreated",
            Self::NewMessageReceived => "NewMessageReceived",
            Self::ChatDeleted => "ChatDeleted",
            Self::ListenerAdded => "ListenerAdded",
            Self::NewMessageReceivedFromBroker => "NewMessageReceivedFromBroker",
        }
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Domain(DomainEvent::NewChatCreated(_)) => EventKind::NewChatCreated,
            Self::Domain(DomainEvent::NewMessageReceived(_)) => EventKind::NewMessageReceived,
            Self::Domain(DomainEvent::ChatDeleted(_)) => EventKind::ChatDeleted,
            Self::Domain(DomainEvent::ListenerAdded(_)) => EventKind::ListenerAdded,
            Self::Integration(IntegrationEvent::NewMessageReceivedFromBroker(_)) => {
                EventKind::NewMessageReceivedFromBroker
            }
        }
    }

    pub fn event_id(&self) -> EventId {
        match self {
            Self::Domain(event) => event.event_id(),
            Self::Integration(event) => event.event_id(),
        }
    }

    pub fn chat_oid(&self) -> &ChatId {
        match self {
            Self::Domain(event) => event.chat_oid(),
            Self::Integration(event) => event.chat_oid(),
        }
    }
}

impl From<DomainEvent> for Event {
    fn from(event: DomainEvent) -> Self {
        Self::Domain(event)
    }
}

impl From<IntegrationEvent> for Event {
    fn from(event: IntegrationEvent) -> Self {
        Self::Integration(event)
    }
}

/// The side effect a handler performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Published { topic: String, key: String },
    Broadcast { chat_oid: ChatId, delivered: usize },
    Disconnected {
        chat_oid: ChatId,
        notified: usize,
        closed: usize,
    },
    /// The handler does not act on this event
    Skipped,
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> ApplicationResult<HandlerOutcome>;

    /// Used in logs and reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Result of one handler invocation.
#[derive(Debug)]
pub struct HandlerResult {
    pub event_id: EventId,
    pub kind: EventKind,
    pub handler: &'static str,
    pub result: ApplicationResult<HandlerOutcome>,
}

/// Every handler invocation of one `publish` call, in execution order.
#[derive(Debug, Default)]
pub struct PublishReport {
    results: Vec<HandlerResult>,
}

impl PublishReport {
    pub fn results(&self) -> &[HandlerResult] {
        &self.results
    }

    /// Outcomes of the handlers that succeeded.
    pub fn outcomes(&self) -> Vec<&HandlerOutcome> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().ok())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.result.is_ok())
    }

    /// Treat the first handler failure as the failure of the whole batch.
    pub fn into_result(self) -> ApplicationResult<Vec<HandlerOutcome>> {
        self.results.into_iter().map(|r| r.result).collect()
    }
}

/// Event handlers keyed by [`EventKind`].
///
/// Built once at startup and shared read-only afterwards, typically behind an
/// `Arc` handed to command handlers.
#[derive(Default)]
pub struct EventMediator {
    handlers: HashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl EventMediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append handlers for `kind`. Earlier registrations run first.
    pub fn register_event(&mut self, kind: EventKind, handlers: Vec<Arc<dyn EventHandler>>) {
        self.handlers.entry(kind).or_default().extend(handlers);
    }

    pub fn handlers(&self, kind: EventKind) -> &[Arc<dyn EventHandler>] {
        self.handlers
            .get(&kind)
            .map(|list| list.as_slice())
            .unwrap_or_default()
    }

    /// Dispatch a batch of events.
    ///
    /// # Errors
    ///
    /// Returns `HandlerNotRegistered` without running anything if some event
    /// in the batch has no handler. Handler failures are reported in the
    /// [`PublishReport`], not here.
    pub async fn publish<I>(&self, events: I) -> ApplicationResult<PublishReport>
    where
        I: IntoIterator + Send,
        I::Item: Into<Event>,
    {
        let events: Vec<Event> = events.into_iter().map(Into::into).collect();

        let kinds: HashSet<EventKind> = events.iter().map(Event::kind).collect();
        if let Some(missing) = kinds.into_iter().find(|kind| self.handlers(*kind).is_empty()) {
            return Err(ApplicationError::HandlerNotRegistered {
                name: missing.name(),
            });
        }

        let mut report = PublishReport::default();
        for event in &events {
            let kind = event.kind();
            for handler in self.handlers(kind) {
                let result = handler.handle(event).await;
                let failed = result.is_err();
                if let Err(e) = &result {
                    tracing::error!(
                        event_id = %event.event_id(),
                        kind = kind.name(),
                        handler = handler.name(),
                        "Event handler failed: {}",
                        e
                    );
                }
                report.results.push(HandlerResult {
                    event_id: event.event_id(),
                    kind,
                    handler: handler.name(),
                    result,
                });
                if failed {
                    break;
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatDeleted, NewChatCreated};
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &Event) -> ApplicationResult<HandlerOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, event.kind().name()));
            if self.fail {
                return Err(ApplicationError::ChatNotFound(event.chat_oid().to_string()));
            }
            Ok(HandlerOutcome::Skipped)
        }
    }

    fn recorder(label: &'static str, calls: &Arc<Mutex<Vec<String>>>, fail: bool) -> Arc<dyn EventHandler> {
        Arc::new(Recorder {
            label,
            calls: calls.clone(),
            fail,
        })
    }

    fn chat_oid() -> ChatId {
        ChatId::new("C1".to_string()).unwrap()
    }

    fn created() -> DomainEvent {
        NewChatCreated::new(chat_oid(), "Team Standup".to_string()).into()
    }

    fn deleted() -> DomainEvent {
        ChatDeleted::new(chat_oid()).into()
    }

    #[tokio::test]
    async fn test_publish_runs_in_event_then_registration_order() {
        // テスト項目: イベント順 → 登録順でハンドラが呼ばれる
        // given (前提条件):
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut mediator = EventMediator::new();
        mediator.register_event(
            EventKind::NewChatCreated,
            vec![recorder("h1", &calls, false), recorder("h2", &calls, false)],
        );
        mediator.register_event(EventKind::ChatDeleted, vec![recorder("h3", &calls, false)]);

        // when (操作):
        let report = mediator.publish(vec![created(), deleted()]).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["h1:NewChatCreated", "h2:NewChatCreated", "h3:ChatDeleted"]
        );
        assert_eq!(report.results().len(), 3);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_publish_with_unregistered_kind_runs_nothing() {
        // テスト項目: 未登録の種別が 1 つでもあれば、どのハンドラも呼ばれない
        // given (前提条件):
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut mediator = EventMediator::new();
        mediator.register_event(EventKind::NewChatCreated, vec![recorder("h1", &calls, false)]);

        // when (操作):
        let result = mediator.publish(vec![created(), deleted()]).await;

        // then (期待する結果):
        match result {
            Err(ApplicationError::HandlerNotRegistered { name }) => assert_eq!(name, "ChatDeleted"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handler_failure_is_isolated_to_its_event() {
        // テスト項目: 失敗したハンドラは同じイベントの後続のみを止め、次のイベントは処理される
        // given (前提条件):
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut mediator = EventMediator::new();
        mediator.register_event(
            EventKind::NewChatCreated,
            vec![recorder("broken", &calls, true), recorder("skipped", &calls, false)],
        );
        mediator.register_event(EventKind::ChatDeleted, vec![recorder("h3", &calls, false)]);

        // when (操作):
        let report = mediator.publish(vec![created(), deleted()]).await.unwrap();

        // then (期待する結果):
        assert_eq!(*calls.lock().unwrap(), vec!["broken:NewChatCreated", "h3:ChatDeleted"]);
        assert!(!report.is_success());
        assert_eq!(report.outcomes().len(), 1);
        assert!(matches!(report.into_result(), Err(ApplicationError::ChatNotFound(_))));
    }

    #[tokio::test]
    async fn test_publish_empty_batch_is_ok() {
        // テスト項目: 空のイベント列の publish は何もせず成功する
        // given (前提条件):
        let mediator = EventMediator::new();

        // when (操作):
        let report = mediator.publish(Vec::<DomainEvent>::new()).await.unwrap();

        // then (期待する結果):
        assert!(report.results().is_empty());
    }
}
