//! # LogWriter: structured event logger
//!
//! A minimal subscriber that turns incoming [`Event`]s into `tracing` records.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  uniqpool: staged task="job-7" pending=3
//! DEBUG uniqpool: collapsed task="job-7"
//! WARN  uniqpool: rejected task="job-9" pending=16 reason="staging full"
//! INFO  uniqpool: drained drained=3 trigger="tick" elapsed_ms=0
//! INFO  uniqpool: shutdown requested
//! INFO  uniqpool: pool stopped
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::TaskStaged => {
                tracing::info!(target: "uniqpool", seq = e.seq, task, pending = ?e.pending, "staged");
            }
            EventKind::TaskCollapsed => {
                tracing::debug!(target: "uniqpool", seq = e.seq, task, "collapsed");
            }
            EventKind::TaskRejected => {
                tracing::warn!(target: "uniqpool", seq = e.seq, task, pending = ?e.pending, reason, "rejected");
            }
            EventKind::DrainCompleted => {
                tracing::info!(
                    target: "uniqpool",
                    seq = e.seq,
                    drained = ?e.drained,
                    trigger = reason,
                    elapsed_ms = ?e.elapsed_ms,
                    "drained"
                );
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "uniqpool", seq = e.seq, "shutdown requested");
            }
            EventKind::PoolStopped => {
                tracing::info!(target: "uniqpool", seq = e.seq, "pool stopped");
            }
            EventKind::ExecutorStopped => {
                tracing::info!(target: "uniqpool", seq = e.seq, executor = task, "executor stopped");
            }
            EventKind::WorkPanicked => {
                tracing::error!(target: "uniqpool", seq = e.seq, task, reason, "work panicked");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "uniqpool", seq = e.seq, subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "uniqpool", seq = e.seq, subscriber = task, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
