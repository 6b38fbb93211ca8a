//! The supervisor decision engine (spec §4.4): rate-limited restart
//! tracking plus the four-way Restart/Resume/Stop/Escalate decision.
//!
//! `Supervisor` does not itself stop or spawn actors — it decides what
//! should happen to a failed child and which siblings a Restart decision
//! pulls in under the configured [`SupervisionStrategy`]. `ActorSystem`
//! carries the decision out.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use crate::actor::props::SupervisionConfig;
use crate::supervisor::backoff::RestartBackoff;
use crate::supervisor::types::{RestartPolicy, SupervisionDecision, SupervisionStrategy};
use pipeline_core::ActorPath;

/// A failure-reaction override, consulted before the default rate-limit
/// logic. Returning `None` falls through to the default Restart/Stop
/// decision; `Some(_)` (typically Resume or Escalate) short-circuits it.
pub type FailureHook = Arc<dyn Fn(&ActorPath, &str) -> Option<SupervisionDecision> + Send + Sync>;

struct ChildEntry {
    path: ActorPath,
    restart_policy: RestartPolicy,
    backoff: RestartBackoff,
}

/// Tracks a supervisor's children in registration order and decides how
/// to react to a child's failure.
pub struct Supervisor {
    strategy: SupervisionStrategy,
    max_restarts: u32,
    within_seconds: u64,
    children: Mutex<Vec<ChildEntry>>,
    on_failure: Option<FailureHook>,
}

impl Supervisor {
    pub fn new(config: SupervisionConfig) -> Self {
        Self {
            strategy: config.strategy,
            max_restarts: config.max_restarts,
            within_seconds: config.within_seconds,
            children: Mutex::new(Vec::new()),
            on_failure: None,
        }
    }

    /// Attaches an override hook for Resume/Escalate decisions beyond
    /// the default Restart/Stop path.
    pub fn with_on_failure(mut self, hook: FailureHook) -> Self {
        self.on_failure = Some(hook);
        self
    }

    /// Registers a child in the supervisor's ordering, used by
    /// `RestForOne` to determine which siblings restart together.
    pub fn register_child(&self, path: ActorPath, restart_policy: RestartPolicy) {
        let mut children = self.children.lock();
        if children.iter().any(|c| c.path == path) {
            return;
        }
        let window = Duration::from_secs(self.within_seconds);
        children.push(ChildEntry {
            path,
            restart_policy,
            backoff: RestartBackoff::new(self.max_restarts, window),
        });
    }

    /// Removes a child from the supervisor's ordering (on voluntary
    /// stop or a terminal Stop decision).
    pub fn unregister_child(&self, path: &ActorPath) {
        self.children.lock().retain(|c| &c.path != path);
    }

    /// Decides what to do about `path`'s failure.
    ///
    /// Consults the override hook first; if it declines, falls back to:
    /// the child's own restart policy, then the rate-limited window
    /// (exceeded → Stop, otherwise → Restart).
    pub fn decide(&self, path: &ActorPath, cause: &str) -> SupervisionDecision {
        if let Some(hook) = &self.on_failure {
            if let Some(decision) = hook(path, cause) {
                return decision;
            }
        }

        let mut children = self.children.lock();
        let Some(entry) = children.iter_mut().find(|c| &c.path == path) else {
            return SupervisionDecision::Escalate;
        };

        if !entry.restart_policy.allows_restart() {
            return SupervisionDecision::Stop;
        }

        if entry.backoff.is_limit_exceeded() {
            return SupervisionDecision::Stop;
        }
        entry.backoff.record_restart();
        SupervisionDecision::Restart
    }

    /// The exponential backoff delay to wait before respawning `path`,
    /// given its restart history so far.
    pub fn restart_delay(&self, path: &ActorPath) -> Duration {
        let mut children = self.children.lock();
        children
            .iter_mut()
            .find(|c| &c.path == path)
            .map(|c| c.backoff.calculate_delay())
            .unwrap_or_default()
    }

    /// The set of paths a Restart decision for `failed` pulls in, under
    /// this supervisor's configured strategy.
    pub fn restart_set(&self, failed: &ActorPath) -> Vec<ActorPath> {
        let children = self.children.lock();
        match self.strategy {
            SupervisionStrategy::OneForOne => vec![failed.clone()],
            SupervisionStrategy::OneForAll => children.iter().map(|c| c.path.clone()).collect(),
            SupervisionStrategy::RestForOne => match children.iter().position(|c| &c.path == failed) {
                Some(index) => children[index..].iter().map(|c| c.path.clone()).collect(),
                None => vec![failed.clone()],
            },
        }
    }
}
