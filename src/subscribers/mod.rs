//! # Event subscribers for the uniqpool runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for handling runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   UniqPool / drain loop / WorkerPool ── publish(Event) ──► Bus
//!                                                             │
//!                                                      event listener
//!                                                             │
//!                                                      SubscriberSet::emit
//!                                                   ┌─────────┼─────────┐
//!                                                   ▼         ▼         ▼
//!                                               LogWriter  Metrics   Custom
//! ```

mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod embedded;

pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
