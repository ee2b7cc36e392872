//! # Work-related types.
//!
//! - [`Identifier`] - bound for deduplication keys
//! - [`Work`] - opaque zero-argument callable forwarded to the executor

mod id;
mod work;

pub use id::Identifier;
pub use work::{BoxWorkFuture, Work};
