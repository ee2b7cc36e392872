//! # Pool configuration.
//!
//! Provides [`PoolConfig`] centralized settings for the admission layer and its default executor.
//!
//! Unlike most runtime knobs, every sizing field here is **required to be positive**:
//! [`PoolConfig::validate`] rejects zero values instead of treating them as sentinels,
//! and [`UniqPool`](crate::UniqPool) construction fails with a [`ConfigError`].

use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for a [`UniqPool`](crate::UniqPool).
///
/// ## Field semantics
/// - `queue_capacity`: staging area size; `try_submit` rejects and `submit` waits when it is full
/// - `workers`: concurrency of the default [`WorkerPool`](crate::WorkerPool)
/// - `backlog`: backlog capacity of the default [`WorkerPool`](crate::WorkerPool)
/// - `interval`: drain cadence; the first drain happens one interval after construction
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
///
/// `workers` and `backlog` are validated even when a custom executor is supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Capacity of the staging area.
    pub queue_capacity: usize,

    /// Number of workers of the default executor.
    pub workers: usize,

    /// Backlog capacity of the default executor.
    pub backlog: usize,

    /// Time between two drains of the staging area.
    pub interval: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages skip older items.
    pub bus_capacity: usize,
}

impl PoolConfig {
    /// Creates a configuration from the four required parameters; other fields use defaults.
    pub fn new(queue_capacity: usize, workers: usize, backlog: usize, interval: Duration) -> Self {
        Self {
            queue_capacity,
            workers,
            backlog,
            interval,
            ..Self::default()
        }
    }

    /// Checks that every required field is positive.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use uniqpool::{ConfigError, PoolConfig};
    ///
    /// let cfg = PoolConfig::new(0, 2, 10, Duration::from_millis(100));
    /// assert_eq!(cfg.validate(), Err(ConfigError::ZeroQueueCapacity));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.backlog == 0 {
            return Err(ConfigError::ZeroBacklog);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for PoolConfig {
    /// Default configuration:
    ///
    /// - `queue_capacity = 1024`
    /// - `workers = 4`
    /// - `backlog = 1024`
    /// - `interval = 100ms`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            workers: 4,
            backlog: 1024,
            interval: Duration::from_millis(100),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(PoolConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_new_keeps_default_bus() {
        let cfg = PoolConfig::new(10, 2, 10, Duration::from_millis(100));
        assert_eq!(cfg.bus_capacity, PoolConfig::default().bus_capacity);
        assert_eq!(cfg.queue_capacity, 10);
    }

    #[test]
    fn test_each_zero_field_is_rejected() {
        let ms = Duration::from_millis(100);
        assert_eq!(
            PoolConfig::new(0, 1, 1, ms).validate(),
            Err(ConfigError::ZeroQueueCapacity)
        );
        assert_eq!(
            PoolConfig::new(1, 0, 1, ms).validate(),
            Err(ConfigError::ZeroWorkers)
        );
        assert_eq!(
            PoolConfig::new(1, 1, 0, ms).validate(),
            Err(ConfigError::ZeroBacklog)
        );
        assert_eq!(
            PoolConfig::new(1, 1, 1, Duration::ZERO).validate(),
            Err(ConfigError::ZeroInterval)
        );
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = PoolConfig {
            bus_capacity: 0,
            ..PoolConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
