//! # Executor capability.
//!
//! [`Execute`] is the seam between the admission layer and whatever actually runs work.
//! The drain loop forwards every staged [`Work`] through [`Execute::submit`] and, during
//! shutdown, calls [`Execute::stop_and_wait`] exactly once after the final drain.
//!
//! ## Contract
//! - `submit` accepts a unit for asynchronous execution. It may wait for backlog
//!   space, but must not wait for the work itself to finish.
//! - `stop_and_wait` returns once every previously submitted unit has finished and
//!   the executor's resources are released.
//! - Failures inside work are the executor's concern; the pool never observes them.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use uniqpool::{Execute, Work};
//!
//! /// Runs every unit inline on a fresh tokio task, unbounded.
//! struct Detached;
//!
//! #[async_trait]
//! impl Execute for Detached {
//!     async fn submit(&self, work: Work) {
//!         tokio::spawn(work.start());
//!     }
//!
//!     async fn stop_and_wait(&self) {}
//!
//!     fn name(&self) -> &'static str { "detached" }
//! }
//! ```

use async_trait::async_trait;

use crate::tasks::Work;

/// Execution backend that runs forwarded work units concurrently.
#[async_trait]
pub trait Execute: Send + Sync + 'static {
    /// Accepts a unit of work for asynchronous execution.
    async fn submit(&self, work: Work);

    /// Waits for all submitted work to finish, then releases resources.
    async fn stop_and_wait(&self);

    /// Returns the executor name used in events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
