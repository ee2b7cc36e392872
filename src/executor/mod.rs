//! # Execution backend.
//!
//! - [`Execute`]: capability the drain loop forwards work to
//! - [`WorkerPool`]: default implementation with a bounded backlog and fixed worker count

mod execute;
mod worker_pool;

pub use execute::Execute;
pub use worker_pool::WorkerPool;
