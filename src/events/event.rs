//! # Runtime events emitted by the pool, drain loop and executor.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Admission events**: outcome of each submission (staged, collapsed, rejected)
//! - **Drain events**: one per drain cycle
//! - **Lifecycle events**: shutdown requested, pool stopped, executor stopped
//! - **Isolation events**: panics and overflows caught inside workers/subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! identifier label, counts and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use uniqpool::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskRejected)
//!     .with_task("\"report-42\"")
//!     .with_reason("staging full")
//!     .with_pending(16);
//!
//! assert_eq!(ev.kind, EventKind::TaskRejected);
//! assert_eq!(ev.task.as_deref(), Some("\"report-42\""));
//! assert_eq!(ev.pending, Some(16));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Admission events ===
    /// A new entry was placed into the staging area.
    ///
    /// Sets:
    /// - `task`: identifier label
    /// - `pending`: staged entries after insertion
    TaskStaged,

    /// Submission collapsed into an already pending entry; its work was discarded.
    ///
    /// Sets:
    /// - `task`: identifier label
    TaskCollapsed,

    /// Non-blocking submission rejected because the staging area was full.
    ///
    /// Sets:
    /// - `task`: identifier label
    /// - `pending`: staged entries at the time of rejection
    /// - `reason`: rejection reason
    TaskRejected,

    // === Drain events ===
    /// A drain cycle finished.
    ///
    /// Sets:
    /// - `drained`: number of entries forwarded to the executor
    /// - `reason`: `"tick"` or `"shutdown"`
    DrainCompleted,

    // === Lifecycle events ===
    /// `stop_and_wait` was called (or the pool was dropped).
    ShutdownRequested,

    /// Drain loop performed its final drain and terminated.
    PoolStopped,

    /// Executor finished all forwarded work and released its workers.
    ///
    /// Sets:
    /// - `task`: executor name
    ExecutorStopped,

    // === Executor events ===
    /// A unit of work panicked inside the executor, or the executor itself
    /// panicked while accepting it.
    ///
    /// Sets:
    /// - `task`: work label (identifier), if known
    /// - `reason`: panic payload
    WorkPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Identifier label, subscriber name or executor name, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (panics, overflow details, drain trigger).
    pub reason: Option<Arc<str>>,
    /// Staged entries observed when the event was produced.
    pub pending: Option<u32>,
    /// Entries forwarded by a drain cycle.
    pub drained: Option<u32>,
    /// Duration of the operation that produced the event (milliseconds, compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            pending: None,
            drained: None,
            elapsed_ms: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task (identifier) label.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the current staging depth.
    #[inline]
    pub fn with_pending(mut self, n: usize) -> Self {
        self.pending = Some(saturate(n));
        self
    }

    /// Attaches the number of entries forwarded by a drain.
    #[inline]
    pub fn with_drained(mut self, n: usize) -> Self {
        self.drained = Some(saturate(n));
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.elapsed_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
