//! # WorkerPool: bounded backlog with a fixed number of concurrent workers.
//!
//! Default [`Execute`] implementation used by [`UniqPool`](crate::UniqPool) unless
//! another executor is supplied to the builder.
//!
//! ## Architecture
//! ```text
//! submit(work) ──► [backlog: mpsc(backlog)] ──► dispatcher
//!                                                  │ acquire permit (Semaphore(workers))
//!                                                  ▼
//!                                           JoinSet::spawn(work)
//!                                                  └─► panic caught → WorkPanicked
//! ```
//!
//! ## Rules
//! - At most `workers` units run at the same time.
//! - `submit` waits while the backlog is full (backpressure towards the drain loop).
//! - Units start in submission order; they may finish in any order.
//! - A panicking unit is isolated: its permit is released and the pool keeps running.
//! - `stop_and_wait` closes the backlog, lets the dispatcher start everything already
//!   queued and waits for all running units.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{
    sync::{Semaphore, mpsc},
    task::{JoinHandle, JoinSet},
};

use crate::events::{Bus, Event, EventKind};
use crate::executor::Execute;
use crate::subscribers::panic_message;
use crate::tasks::Work;

/// Fixed-concurrency executor backed by tokio tasks.
pub struct WorkerPool {
    workers: usize,
    backlog: usize,
    tx: Mutex<Option<mpsc::Sender<Work>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Creates a pool and spawns its dispatcher. Must be called inside a tokio runtime.
    ///
    /// `workers` and `backlog` are clamped to a minimum of 1.
    pub fn new(workers: usize, backlog: usize) -> Self {
        Self::spawn(workers, backlog, None)
    }

    /// Same as [`WorkerPool::new`], additionally publishing `WorkPanicked` to `bus`.
    pub fn with_bus(workers: usize, backlog: usize, bus: Bus) -> Self {
        Self::spawn(workers, backlog, Some(bus))
    }

    fn spawn(workers: usize, backlog: usize, bus: Option<Bus>) -> Self {
        let workers = workers.max(1);
        let backlog = backlog.max(1);
        let (tx, rx) = mpsc::channel(backlog);
        let permits = Arc::new(Semaphore::new(workers));
        let handle = tokio::spawn(dispatch(rx, permits, bus));

        Self {
            workers,
            backlog,
            tx: Mutex::new(Some(tx)),
            dispatcher: Mutex::new(Some(handle)),
        }
    }

    /// Maximum number of concurrently running units.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Capacity of the backlog queue.
    pub fn backlog(&self) -> usize {
        self.backlog
    }
}

#[async_trait]
impl Execute for WorkerPool {
    async fn submit(&self, work: Work) {
        let tx = self.tx.lock().clone();
        let Some(tx) = tx else {
            tracing::warn!(work = ?work.label(), "worker pool stopped; work dropped");
            return;
        };
        if let Err(mpsc::error::SendError(work)) = tx.send(work).await {
            tracing::warn!(work = ?work.label(), "worker pool dispatcher gone; work dropped");
        }
    }

    async fn stop_and_wait(&self) {
        drop(self.tx.lock().take());
        let handle = self.dispatcher.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "worker pool dispatcher failed");
            }
        }
    }

    fn name(&self) -> &'static str {
        "WorkerPool"
    }
}

/// Starts queued work as permits become available; exits once the backlog is closed
/// and every started unit has finished.
async fn dispatch(mut rx: mpsc::Receiver<Work>, permits: Arc<Semaphore>, bus: Option<Bus>) {
    let mut running = JoinSet::new();

    while let Some(work) = rx.recv().await {
        // The semaphore is never closed.
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        while running.try_join_next().is_some() {}

        let bus = bus.clone();
        running.spawn(async move {
            let _permit = permit;
            let label = work.label_arc();
            let fut = async move { work.start().await };

            if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                let info = panic_message(&*panic_err);
                tracing::warn!(work = ?label, %info, "work panicked");
                if let Some(bus) = bus {
                    let mut ev = Event::new(EventKind::WorkPanicked).with_reason(info);
                    if let Some(label) = label {
                        ev = ev.with_task(label);
                    }
                    bus.publish(ev);
                }
            }
        });
    }

    while running.join_next().await.is_some() {}
}
