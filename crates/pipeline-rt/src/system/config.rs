//! System configuration with sensible defaults (spec §6: `actor_system.*`
//! configuration keys).

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use pipeline_core::OverflowPolicy;

/// Default dispatcher worker count (spec §6: `actor_system.dispatcher.parallelism`, default 8).
pub const DEFAULT_WORKER_THREADS: usize = 8;

/// Default mailbox capacity (spec §6: `actor_system.mailbox.capacity`, default 10000).
pub const DEFAULT_MAILBOX_CAPACITY: usize = pipeline_core::DEFAULT_MAILBOX_CAPACITY;

/// Default timeout for actor spawn operations.
pub const DEFAULT_SPAWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for graceful system shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum concurrent actors (0 = unlimited).
pub const DEFAULT_MAX_ACTORS: usize = 0;

/// System-wide configuration for the actor runtime.
///
/// # Examples
///
/// ```
/// use pipeline_rt::system::{SystemConfig, DEFAULT_MAILBOX_CAPACITY};
///
/// let config = SystemConfig::default();
/// assert_eq!(config.default_mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);
///
/// let config = SystemConfig::builder()
///     .with_mailbox_capacity(500)
///     .with_worker_threads(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.default_mailbox_capacity, 500);
/// assert_eq!(config.worker_threads, 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Dispatcher worker count (spec §4.2's `Start(n)`).
    pub worker_threads: usize,
    /// Default mailbox capacity for actors that don't override it.
    pub default_mailbox_capacity: usize,
    /// Default mailbox overflow policy for actors that don't override it.
    pub default_mailbox_policy: OverflowPolicy,
    /// Timeout for actor spawn operations.
    pub spawn_timeout: Duration,
    /// Timeout for graceful system shutdown.
    pub shutdown_timeout: Duration,
    /// Maximum concurrent actors (0 = unlimited).
    pub max_actors: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            default_mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            default_mailbox_policy: OverflowPolicy::Backpressure,
            spawn_timeout: DEFAULT_SPAWN_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_actors: DEFAULT_MAX_ACTORS,
        }
    }
}

impl SystemConfig {
    /// Starts a fluent builder seeded with the defaults above.
    pub fn builder() -> SystemConfigBuilder {
        SystemConfigBuilder::default()
    }

    /// Validates configuration values, returning a human-readable message
    /// for the first invalid field found.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_threads == 0 {
            return Err("worker_threads must be > 0".to_string());
        }
        if self.default_mailbox_capacity == 0 {
            return Err("default_mailbox_capacity must be > 0".to_string());
        }
        if self.spawn_timeout.is_zero() {
            return Err("spawn_timeout must be > 0".to_string());
        }
        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be > 0".to_string());
        }
        Ok(())
    }
}

/// Fluent builder for [`SystemConfig`].
#[derive(Debug, Default)]
pub struct SystemConfigBuilder {
    config: SystemConfig,
}

impl SystemConfigBuilder {
    /// Sets the dispatcher worker count.
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Sets the default mailbox capacity.
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.default_mailbox_capacity = capacity;
        self
    }

    /// Sets the default mailbox overflow policy.
    pub fn with_mailbox_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.default_mailbox_policy = policy;
        self
    }

    /// Sets the actor spawn timeout.
    pub fn with_spawn_timeout(mut self, timeout: Duration) -> Self {
        self.config.spawn_timeout = timeout;
        self
    }

    /// Sets the graceful shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Sets the maximum number of concurrent actors (0 = unlimited).
    pub fn with_max_actors(mut self, max: usize) -> Self {
        self.config.max_actors = max;
        self
    }

    /// Validates and builds the final [`SystemConfig`].
    pub fn build(self) -> Result<SystemConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = SystemConfig::default();
        assert_eq!(config.worker_threads, 8);
        assert_eq!(config.default_mailbox_capacity, 10_000);
        assert_eq!(config.default_mailbox_policy, OverflowPolicy::Backpressure);
        assert_eq!(config.max_actors, 0);
    }

    #[test]
    fn validation_rejects_zero_worker_threads() {
        let invalid = SystemConfig {
            worker_threads: 0,
            ..Default::default()
        };
        assert!(invalid.validate().unwrap_err().contains("worker_threads"));
    }

    #[test]
    fn validation_rejects_zero_mailbox_capacity() {
        let invalid = SystemConfig {
            default_mailbox_capacity: 0,
            ..Default::default()
        };
        assert!(invalid.validate().unwrap_err().contains("mailbox_capacity"));
    }

    #[test]
    fn builder_applies_every_field() {
        let config = SystemConfig::builder()
            .with_worker_threads(4)
            .with_mailbox_capacity(500)
            .with_mailbox_policy(OverflowPolicy::DropOldest)
            .with_spawn_timeout(Duration::from_secs(10))
            .with_shutdown_timeout(Duration::from_secs(60))
            .with_max_actors(100)
            .build()
            .unwrap();

        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.default_mailbox_capacity, 500);
        assert_eq!(config.default_mailbox_policy, OverflowPolicy::DropOldest);
        assert_eq!(config.spawn_timeout, Duration::from_secs(10));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(60));
        assert_eq!(config.max_actors, 100);
    }

    #[test]
    fn builder_validation_failure_propagates() {
        let result = SystemConfig::builder().with_mailbox_capacity(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn serializes_round_trip_as_json() {
        let config = SystemConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.worker_threads, deserialized.worker_threads);
        assert_eq!(config.default_mailbox_capacity, deserialized.default_mailbox_capacity);
    }
}
