use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::LifecycleEvent;

#[derive(Debug, Error, Clone)]
pub enum ObserverError {
    #[error("Observer failed: {0}")]
    Failed(String),

    #[error("Observer timed out after {0:?}")]
    Timeout(Duration),
}

/// Post-commit hook. Failures are logged and never reach the caller that
/// triggered the event.
#[async_trait]
pub trait LifecycleObserver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn notify(&self, event: &LifecycleEvent) -> Result<(), ObserverError>;
}

#[derive(Clone, Default)]
pub struct EventBus {
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn LifecycleObserver>) {
        tracing::debug!("Registered lifecycle observer: {}", observer.name());
        self.observers.push(observer);
    }

    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.register(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Fan the event out in the background. The handle resolves once every
    /// observer finished or timed out.
    pub fn publish(&self, event: LifecycleEvent) -> JoinHandle<()> {
        let bus = self.clone();
        tokio::spawn(async move { bus.dispatch(&event).await })
    }

    /// Run all observers concurrently, each under its own timeout
    pub async fn dispatch(&self, event: &LifecycleEvent) {
        let runs = self.observers.iter().map(|observer| async move {
            let started = Instant::now();
            let limit = observer.timeout();
            let result = match timeout(limit, observer.notify(event)).await {
                Ok(result) => result,
                Err(_) => Err(ObserverError::Timeout(limit)),
            };
            match result {
                Ok(()) => tracing::debug!(
                    "Observer: {} handled {} in {:?}",
                    observer.name(),
                    event.kind.name(),
                    started.elapsed()
                ),
                Err(error) => tracing::warn!(
                    "Observer: {} failed on {} event {}: {}",
                    observer.name(),
                    event.kind.name(),
                    event.id,
                    error
                ),
            }
        });
        join_all(runs).await;
    }
}
