//! System-level error types.
//!
//! Spec §7: "System errors: Start on a stopped system, Spawn with
//! duplicate path, Stop of an unknown reference — returned immediately to
//! caller; never escalated."

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use pipeline_core::ActorPath;

/// System-level errors for actor runtime operations.
#[derive(Debug, Error)]
pub enum SystemError {
    /// No actor is registered at this path.
    #[error("actor not found: {0}")]
    NotFound(ActorPath),

    /// A path is already occupied by a running actor.
    #[error("actor already registered at {0}")]
    AlreadyRegistered(ActorPath),

    /// Spawning failed for a reason other than a path collision.
    #[error("failed to spawn actor at {0}: {1}")]
    SpawnFailed(ActorPath, String),

    /// The system is shutting down and rejects new operations.
    #[error("system shutdown in progress")]
    ShuttingDown,

    /// `max_actors` (0 = unlimited) would be exceeded by this spawn.
    #[error("actor limit exceeded: current {current}, max {max}")]
    ActorLimitExceeded { current: usize, max: usize },

    /// Graceful shutdown did not complete within its configured timeout.
    #[error("shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),
}

impl SystemError {
    /// Whether a retry might succeed without operator intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, SystemError::ActorLimitExceeded { .. })
    }

    /// Whether the system as a whole is in a terminal condition.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SystemError::ShuttingDown | SystemError::ShutdownTimeout(_))
    }

    /// Whether the caller can keep using the system after seeing this error.
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_path() {
        let err = SystemError::NotFound(ActorPath::root("worker"));
        assert!(err.to_string().contains("worker"));
    }

    #[test]
    fn actor_limit_exceeded_names_both_counts() {
        let err = SystemError::ActorLimitExceeded { current: 100, max: 50 };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn shutting_down_is_fatal_and_unrecoverable() {
        let err = SystemError::ShuttingDown;
        assert!(err.is_fatal());
        assert!(!err.is_recoverable());
        assert!(!err.is_transient());
    }

    #[test]
    fn actor_limit_exceeded_is_transient_and_recoverable() {
        let err = SystemError::ActorLimitExceeded { current: 1, max: 1 };
        assert!(err.is_transient());
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
    }
}
