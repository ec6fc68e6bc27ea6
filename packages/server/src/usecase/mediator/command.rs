//! Command side of the mediator.

use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    sync::Arc,
};

use async_trait::async_trait;

use crate::usecase::error::{ApplicationError, ApplicationResult};

/// A request that changes state.
pub trait Command: Send + Sync + 'static {
    type Output: Send + 'static;
}

#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: &C) -> ApplicationResult<C::Output>;
}

type HandlerList<C> = Vec<Arc<dyn CommandHandler<C>>>;

/// Command handlers keyed by command type, kept in registration order.
#[derive(Default)]
pub struct CommandRegistry {
    // TypeId::of::<C>() -> HandlerList<C>
    handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append handlers for `C`. Earlier registrations run first.
    pub fn register_command<C: Command>(&mut self, handlers: Vec<Arc<dyn CommandHandler<C>>>) {
        let entry = self
            .handlers
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(HandlerList::<C>::new()));
        if let Some(list) = entry.downcast_mut::<HandlerList<C>>() {
            list.extend(handlers);
        }
    }

    pub fn handlers<C: Command>(&self) -> &[Arc<dyn CommandHandler<C>>] {
        self.handlers
            .get(&TypeId::of::<C>())
            .and_then(|entry| entry.downcast_ref::<HandlerList<C>>())
            .map(|list| list.as_slice())
            .unwrap_or_default()
    }

    /// Run every handler for `command` in order. The first error aborts the
    /// remaining handlers.
    pub async fn dispatch<C: Command>(&self, command: C) -> ApplicationResult<Vec<C::Output>> {
        let handlers = self.handlers::<C>();
        if handlers.is_empty() {
            return Err(ApplicationError::HandlerNotRegistered {
                name: type_name::<C>(),
            });
        }

        let mut outputs = Vec::with_capacity(handlers.len());
        for handler in handlers {
            outputs.push(handler.handle(&command).await?);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Ping(u32);

    impl Command for Ping {
        type Output = String;
    }

    struct Recorder {
        label: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl CommandHandler<Ping> for Recorder {
        async fn handle(&self, command: &Ping) -> ApplicationResult<String> {
            let call = format!("{}:{}", self.label, command.0);
            self.calls.lock().unwrap().push(call.clone());
            if self.fail {
                return Err(ApplicationError::ChatNotFound(call));
            }
            Ok(call)
        }
    }

    fn recorder(label: &'static str, calls: &Arc<Mutex<Vec<String>>>, fail: bool) -> Arc<dyn CommandHandler<Ping>> {
        Arc::new(Recorder {
            label,
            calls: calls.clone(),
            fail,
        })
    }

    #[tokio::test]
    async fn test_dispatch_without_handler_fails() {
        // テスト項目: ハンドラ未登録のコマンドは HandlerNotRegistered になる
        // given (前提条件):
        let registry = CommandRegistry::new();

        // when (操作):
        let result = registry.dispatch(Ping(1)).await;

        // then (期待する結果):
        match result {
            Err(ApplicationError::HandlerNotRegistered { name }) => assert!(name.ends_with("Ping")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_runs_handlers_in_registration_order() {
        // テスト項目: 登録順にハンドラが呼ばれ、結果も同じ順で返る
        // given (前提条件):
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CommandRegistry::new();
        registry.register_command(vec![recorder("first", &calls, false)]);
        registry.register_command(vec![recorder("second", &calls, false)]);

        // when (操作):
        let outputs = registry.dispatch(Ping(7)).await.unwrap();

        // then (期待する結果):
        assert_eq!(outputs, vec!["first:7".to_string(), "second:7".to_string()]);
        assert_eq!(*calls.lock().unwrap(), vec!["first:7", "second:7"]);
    }

    #[tokio::test]
    async fn test_first_error_aborts_remaining_handlers() {
        // テスト項目: 途中のハンドラが失敗すると以降のハンドラは呼ばれない
        // given (前提条件):
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CommandRegistry::new();
        registry.register_command(vec![
            recorder("first", &calls, true),
            recorder("second", &calls, false),
        ]);

        // when (操作):
        let result = registry.dispatch(Ping(1)).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ApplicationError::ChatNotFound(_))));
        assert_eq!(*calls.lock().unwrap(), vec!["first:1"]);
    }
}
