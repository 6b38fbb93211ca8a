//! Errors the runner's lifecycle operations and configuration parsing
//! can return (spec §4.8, §7: "Configuration errors: surfaced at Start;
//! prevent transition into running.").

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors returned by [`crate::runner::PipelineRunner`] and the topology
/// builders it delegates to.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The configuration failed validation or referenced an unknown
    /// component type; fatal to `Start` (spec §7).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A named component type has no registered factory.
    #[error("no factory registered for {kind} type {type_name:?}")]
    UnknownComponentType { kind: &'static str, type_name: String },

    /// A factory failed while constructing a component from its opaque
    /// config.
    #[error("failed to build {kind} {name:?}: {source}")]
    ComponentBuild {
        kind: &'static str,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// A lifecycle call (`start`/`stop`/`pause`/`resume`) was attempted
    /// from a state that does not permit it.
    #[error("cannot {action} runner from state {from:?}")]
    InvalidTransition { from: &'static str, action: &'static str },

    /// `pause`/`resume` against a topology that does not support them
    /// (actor topology: spec §4.8 "declared no-ops ... with a clear
    /// extension point" only applies to states that exist; an actor
    /// topology that was never started has none to pause).
    #[error("{0} is a no-op for the actor topology")]
    NoOpForActorTopology(&'static str),

    /// Propagated from the underlying actor system or stream processor.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
