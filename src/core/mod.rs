//! Runtime core: admission, staging and the drain loop.
//!
//! The public API from this module is [`UniqPool`], its [`PoolBuilder`],
//! [`PoolConfig`] and the [`Admission`] outcome.
//!
//! Internal modules:
//! - [`staging`]: FIFO of pending entries plus the identifier set, mutated together;
//! - [`shared`]: state shared by the pool handle and the drain loop (lock, notify, stopped flag);
//! - [`drain`]: periodic and shutdown-triggered hand-off to the executor;
//! - [`pool`]: submit contract, introspection and shutdown protocol;
//! - [`builder`]: validation and wiring of bus, subscribers, executor and drain loop.

mod admission;
mod builder;
mod config;
mod drain;
mod pool;
mod shared;
mod staging;

pub use admission::Admission;
pub use builder::PoolBuilder;
pub use config::PoolConfig;
pub use pool::UniqPool;
