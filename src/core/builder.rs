use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{PoolConfig, drain::DrainLoop, pool::UniqPool, shared::Shared},
    error::ConfigError,
    events::{Bus, Event},
    executor::{Execute, WorkerPool},
    subscribers::{Subscribe, SubscriberSet},
    tasks::Identifier,
};

/// Builder for constructing a [`UniqPool`] with optional features.
pub struct PoolBuilder<K> {
    cfg: PoolConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    executor: Option<Arc<dyn Execute>>,
    _id: PhantomData<fn() -> K>,
}

impl<K: Identifier> PoolBuilder<K> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: PoolConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            executor: None,
            _id: PhantomData,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (admission outcomes, drains, shutdown)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the default [`WorkerPool`] with a custom executor.
    ///
    /// The pool calls [`Execute::stop_and_wait`] on it during shutdown.
    pub fn with_executor(mut self, executor: Arc<dyn Execute>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Validates the configuration, spawns the drain loop and returns the pool.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<UniqPool<K>, ConfigError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener_token = CancellationToken::new();
        let listener = if self.subscribers.is_empty() {
            None
        } else {
            let rx = bus.subscribe();
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            Some(tokio::spawn(listen(rx, set, listener_token.clone())))
        };

        let executor = self.executor.unwrap_or_else(|| {
            Arc::new(WorkerPool::with_bus(
                self.cfg.workers,
                self.cfg.backlog,
                bus.clone(),
            ))
        });

        let shared = Arc::new(Shared::new(self.cfg.queue_capacity, bus));
        let token = CancellationToken::new();
        let drain = tokio::spawn(
            DrainLoop {
                shared: Arc::clone(&shared),
                executor: Arc::clone(&executor),
                interval: self.cfg.interval,
                token: token.clone(),
            }
            .run(),
        );

        Ok(UniqPool::from_parts(
            self.cfg,
            shared,
            executor,
            token,
            drain,
            listener,
            listener_token,
        ))
    }
}

/// Forwards bus events to the subscriber set until cancelled, then flushes
/// what was already published and waits for subscribers to finish.
async fn listen(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            res = rx.recv() => match res {
                Ok(ev) => set.emit(&ev),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = token.cancelled() => {
                loop {
                    match rx.try_recv() {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged");
                        }
                        Err(_) => break,
                    }
                }
                break;
            }
        }
    }
    set.shutdown().await;
}
