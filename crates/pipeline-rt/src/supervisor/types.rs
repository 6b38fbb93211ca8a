//! Shared supervisor vocabulary (spec §4.4).

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

/// What a child's own restart policy says about a given failure.
///
/// Spec §4.4 describes the rate-limited Restart path in detail;
/// `RestartPolicy` decides whether a failure is even restart-eligible
/// before the window check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Always restart on failure.
    Permanent,
    /// Restart only on abnormal failure (never on a voluntary stop).
    Transient,
    /// Never restart; a failure simply removes the child.
    Temporary,
}

impl RestartPolicy {
    /// Whether a failure with this policy is restart-eligible at all,
    /// before the rate-limiting window is even consulted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pipeline_rt::supervisor::RestartPolicy;
    ///
    /// assert!(RestartPolicy::Permanent.allows_restart());
    /// assert!(!RestartPolicy::Temporary.allows_restart());
    /// ```
    pub fn allows_restart(self) -> bool {
        !matches!(self, RestartPolicy::Temporary)
    }
}

/// Which siblings restart together when one child fails (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisionStrategy {
    /// Re-spawn only the failed child.
    OneForOne,
    /// Re-spawn every child of this supervisor.
    OneForAll,
    /// Re-spawn the failed child and every sibling added after it, in
    /// addition order.
    RestForOne,
}

/// The four outcomes a supervisor can apply to a child's failure
/// (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionDecision {
    /// Stop the failed reference, then re-spawn per the configured
    /// strategy.
    Restart,
    /// Ignore the error; the child's existing instance keeps running.
    Resume,
    /// Terminate the failed child; do not restart it.
    Stop,
    /// Forward a failure report to this supervisor's own parent.
    Escalate,
}

/// A supervised child's identity within its parent, for restart-history
/// and ordering bookkeeping. Distinct from `ActorPath`: a child may be
/// re-identified across restarts while its path stays the same.
pub type ChildId = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_never_allows_restart() {
        assert!(!RestartPolicy::Temporary.allows_restart());
        assert!(RestartPolicy::Permanent.allows_restart());
        assert!(RestartPolicy::Transient.allows_restart());
    }
}
