//! # uniqpool
//!
//! **uniqpool** is a deduplicating admission layer that sits in front of a worker pool.
//!
//! Work is submitted together with an identifier. While an entry for an identifier is
//! waiting in the staging area, further submissions for it collapse into that entry.
//! A background drain loop forwards staged work to the executor on a fixed cadence,
//! so bursts of duplicate submissions turn into a single execution.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller A        caller B        caller C
//!  submit("x")    try_submit("x")  try_submit("y")
//!      │               │                │
//!      ▼               ▼                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  UniqPool (admission)                                             │
//! │  - Staging: FIFO + identifier set under one mutex                 │
//! │  - "x" pending → B collapses, C staged, full → reject / wait      │
//! └───────────────────────────────┬───────────────────────────────────┘
//!                                 │ every `interval`, and once more on shutdown
//!                                 ▼
//!                     ┌────────────────────────┐
//!                     │       DrainLoop        │  pop oldest → forward → release id
//!                     └───────────┬────────────┘
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Execute (WorkerPool by default: backlog + N concurrent workers)  │
//! └───────────────────────────────────────────────────────────────────┘
//!
//!   all of the above ── publish(Event) ──► Bus ──► SubscriberSet ──► Subscribe impls
//! ```
//!
//! ### Lifecycle
//! ```text
//! UniqPool::new(cfg) ──► spawn DrainLoop
//!
//! loop {
//!   ├─► wait for tick | shutdown token
//!   │       └─ shutdown ─► stopped = true
//!   ├─► drain: pop → executor.submit → release (until empty)
//!   └─► stopped? seal staging, publish PoolStopped, exit
//! }
//!
//! stop_and_wait(): stopped = true ─► cancel ─► join drain loop ─► executor.stop_and_wait()
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                  |
//! |-------------------|---------------------------------------------------------------|-------------------------------------|
//! | **Admission**     | Dedup by identifier, blocking and non-blocking submission.    | [`UniqPool`], [`Admission`]         |
//! | **Execution**     | Pluggable backend, bounded default worker pool.               | [`Execute`], [`WorkerPool`]         |
//! | **Work**          | Async or blocking zero-argument closures.                     | [`Work`], [`Identifier`]            |
//! | **Subscriber API**| Observe admissions, drains and shutdown.                      | [`Subscribe`], [`Event`]            |
//! | **Configuration** | Validated sizing and cadence.                                 | [`PoolConfig`], [`ConfigError`]     |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber (structured `tracing` output).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use uniqpool::{Admission, PoolConfig, UniqPool};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = UniqPool::new(PoolConfig::new(10, 2, 10, Duration::from_millis(100)))?;
//!
//!     assert_eq!(pool.submit("user:42", || async { /* rebuild feed */ }).await, Admission::Staged);
//!     assert_eq!(pool.submit("user:42", || async { /* redundant */ }).await, Admission::Collapsed);
//!
//!     pool.stop_and_wait().await;
//!     assert!(pool.stopped());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod executor;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{Admission, PoolBuilder, PoolConfig, UniqPool};
pub use error::ConfigError;
pub use events::{Bus, Event, EventKind};
pub use executor::{Execute, WorkerPool};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BoxWorkFuture, Identifier, Work};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
