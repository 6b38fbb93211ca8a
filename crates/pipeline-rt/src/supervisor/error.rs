//! Errors raised by the supervisor (spec §4.4).

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use pipeline_core::ActorPath;

/// Failures from supervisor operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The named child isn't registered with this supervisor.
    #[error("child not registered: {0}")]
    UnknownChild(ActorPath),

    /// The restart-rate window was exceeded and the child was stopped
    /// rather than restarted.
    #[error("restart limit exceeded for {path}: {count} restarts within {within_seconds}s")]
    RestartLimitExceeded {
        path: ActorPath,
        count: u32,
        within_seconds: u64,
    },

    /// Re-spawning a failed child failed in turn.
    #[error("failed to respawn {0}: {1}")]
    RespawnFailed(ActorPath, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let err = SupervisorError::UnknownChild(ActorPath::root("worker"));
        assert!(err.to_string().contains("worker"));
    }
}
