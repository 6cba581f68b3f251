//! Event emitter used by the post mutation path.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::event::PostEvent;
use crate::handler::{EventHandler, HandlerResult};

/// Dispatches post events to registered handlers.
///
/// The emitter never reports handler failures back to the code that
/// committed the post mutation; failures are logged and dropped.
pub struct EventEmitter {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventEmitter {
    /// Creates an emitter with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Registers a handler.
    pub async fn on(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }

    /// Emits an event without waiting for handlers (fire and forget).
    ///
    /// Each handler runs on its own detached task. Its outcome is ignored
    /// by the caller; errors end up in the log only.
    pub async fn emit(&self, event: PostEvent) {
        let handlers = self.handlers.read().await.clone();

        for handler in handlers {
            let event = event.clone();
            tokio::spawn(async move {
                if let Err(e) = handler.handle(&event).await {
                    tracing::error!(
                        handler = handler.id(),
                        event = %event.kind,
                        "Event handler error: {}",
                        e
                    );
                }
            });
        }
    }

    /// Emits an event and waits for every handler to settle.
    pub async fn emit_and_wait(&self, event: PostEvent) -> Vec<HandlerResult> {
        let handlers = self.handlers.read().await.clone();

        let runs = handlers.iter().map(|handler| {
            let event = &event;
            async move {
                let start = Instant::now();
                let result = handler.handle(event).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                match result {
                    Ok(()) => HandlerResult::success(handler.id(), duration_ms),
                    Err(e) => HandlerResult::failure(handler.id(), e.to_string(), duration_ms),
                }
            }
        });

        futures::future::join_all(runs).await
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EventError;
    use crate::event::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        fn id(&self) -> &str {
            "counting"
        }

        async fn handle(&self, _event: &PostEvent) -> Result<(), EventError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        fn id(&self) -> &str {
            "failing"
        }

        async fn handle(&self, _event: &PostEvent) -> Result<(), EventError> {
            Err(EventError::HandlerFailed("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_emit_and_wait_collects_results() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        emitter
            .on(Arc::new(CountingHandler {
                calls: calls.clone(),
            }))
            .await;
        emitter.on(Arc::new(FailingHandler)).await;

        let event = PostEvent::builder(EventKind::PostCreated, "p1").build();
        let results = emitter.emit_and_wait(event).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(results[1].handler_id, "failing");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_emit_is_fire_and_forget() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        emitter.on(Arc::new(FailingHandler)).await;
        emitter
            .on(Arc::new(CountingHandler {
                calls: calls.clone(),
            }))
            .await;

        let event = PostEvent::builder(EventKind::PostDeleted, "p9").build();
        emitter.emit(event).await;

        for _ in 0..50 {
            if calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
