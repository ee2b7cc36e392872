//! Error types used by the uniqpool runtime.
//!
//! Only construction can fail with a recoverable error: [`ConfigError`] is
//! returned when a [`PoolConfig`](crate::PoolConfig) field is out of range.
//!
//! Other outcomes are not errors:
//! - a full staging area is reported as [`Admission::Rejected`](crate::Admission::Rejected);
//! - a duplicate identifier is reported as [`Admission::Collapsed`](crate::Admission::Collapsed);
//! - submitting after shutdown is a caller bug and panics.

use thiserror::Error;

/// # Errors produced while validating a pool configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Staging area capacity must be at least 1.
    #[error("queue capacity must be positive")]
    ZeroQueueCapacity,

    /// Executor must run at least one worker.
    #[error("worker count must be positive")]
    ZeroWorkers,

    /// Executor backlog must hold at least one unit of work.
    #[error("executor backlog must be positive")]
    ZeroBacklog,

    /// Drain interval must be a non-zero duration.
    #[error("drain interval must be positive")]
    ZeroInterval,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use uniqpool::ConfigError;
    ///
    /// assert_eq!(ConfigError::ZeroWorkers.as_label(), "config_zero_workers");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroQueueCapacity => "config_zero_queue_capacity",
            ConfigError::ZeroWorkers => "config_zero_workers",
            ConfigError::ZeroBacklog => "config_zero_backlog",
            ConfigError::ZeroInterval => "config_zero_interval",
        }
    }

    /// Returns the name of the offending [`PoolConfig`](crate::PoolConfig) field.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::ZeroQueueCapacity => "queue_capacity",
            ConfigError::ZeroWorkers => "workers",
            ConfigError::ZeroBacklog => "backlog",
            ConfigError::ZeroInterval => "interval",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        format!("invalid config field `{}`: {self}", self.field())
    }
}
