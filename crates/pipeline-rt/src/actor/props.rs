//! Actor spawn parameters (spec §4.3: "`Spawn(props)` creates an actor
//! with name, factory function, desired parallelism, supervision config,
//! mailbox config, and declared output names").

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 3: Internal module imports
use crate::actor::traits::Actor;
use crate::supervisor::{RestartPolicy, SupervisionStrategy};
use pipeline_core::OverflowPolicy;

/// Builds a fresh actor instance. Called once at spawn time and again on
/// every restart, so it must not capture state that should survive a
/// restart — that belongs in `pre_restart`/`post_restart` or a
/// checkpoint.
pub type ActorFactory = Arc<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

/// Spawn-time configuration for one actor.
#[derive(Clone)]
pub struct Props {
    /// Local name, composed onto the parent's path.
    pub name: String,
    /// Builds a fresh actor instance.
    pub factory: ActorFactory,
    /// Desired parallelism. The reference runtime in this crate spawns one
    /// receive loop per path regardless of this value; it is carried
    /// through for topologies (spec §4.8's flat topology) that fan work
    /// out across multiple mailbox-backed workers sharing a path prefix.
    pub parallelism: usize,
    /// Mailbox capacity for this actor.
    pub mailbox_capacity: usize,
    /// Mailbox overflow policy for this actor.
    pub mailbox_policy: OverflowPolicy,
    /// Declared output names (spec §4.8: used to wire the flat topology's
    /// transform graph; unused by the actor runtime itself).
    pub outputs: Vec<String>,
    /// How a parent supervisor should react to this actor's failures, if
    /// supervision is enabled for its parent (spec §4.4).
    pub restart_policy: RestartPolicy,
}

impl Props {
    /// Builds `Props` with the library's defaults: backpressure mailbox at
    /// the workspace default capacity, no declared outputs, permanent
    /// restart policy.
    pub fn new(name: impl Into<String>, factory: ActorFactory) -> Self {
        Self {
            name: name.into(),
            factory,
            parallelism: 1,
            mailbox_capacity: pipeline_core::DEFAULT_MAILBOX_CAPACITY,
            mailbox_policy: OverflowPolicy::Backpressure,
            outputs: Vec::new(),
            restart_policy: RestartPolicy::Permanent,
        }
    }

    pub fn with_mailbox(mut self, capacity: usize, policy: OverflowPolicy) -> Self {
        self.mailbox_capacity = capacity;
        self.mailbox_policy = policy;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<String>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }
}

/// A supervisor's configuration for one of its children, attached at the
/// supervisor-registration call rather than at spawn (a plain actor
/// doesn't need to know it's supervised).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupervisionConfig {
    pub strategy: SupervisionStrategy,
    pub max_restarts: u32,
    pub within_seconds: u64,
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            strategy: SupervisionStrategy::OneForOne,
            max_restarts: 5,
            within_seconds: 60,
        }
    }
}
