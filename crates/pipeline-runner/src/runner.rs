//! The pipeline runner's lifecycle (spec §4.8): "Start, Stop, Pause,
//! Resume are protected by a single lock; Status and Stats reads use a
//! shared read lock."

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use tokio::sync::RwLock;

// Layer 3: Internal module imports
use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::registry::ComponentRegistry;
use crate::topology::{self, Topology};
use pipeline_stream::{ProcessorStats, StageStats};

/// The runner's lifecycle state (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Pending,
    Running,
    Paused,
    Stopping,
    Stopped,
}

impl RunnerState {
    fn label(self) -> &'static str {
        match self {
            RunnerState::Pending => "pending",
            RunnerState::Running => "running",
            RunnerState::Paused => "paused",
            RunnerState::Stopping => "stopping",
            RunnerState::Stopped => "stopped",
        }
    }
}

struct Inner {
    state: RunnerState,
    topology: Option<Topology>,
}

/// Owns one pipeline's lifecycle: builds its topology from a validated
/// [`RunnerConfig`] on `start`, tears it down on `stop`, and delegates
/// `pause`/`resume` to the stream processor when the topology is one
/// (flat and actor topologies declare both a no-op — spec §4.8).
pub struct PipelineRunner {
    config: RunnerConfig,
    registry: ComponentRegistry,
    inner: RwLock<Inner>,
}

impl PipelineRunner {
    pub fn new(config: RunnerConfig, registry: ComponentRegistry) -> Self {
        Self {
            config,
            registry,
            inner: RwLock::new(Inner {
                state: RunnerState::Pending,
                topology: None,
            }),
        }
    }

    /// Validates the configuration, builds the selected topology, and
    /// starts it. Valid only from `pending` or `stopped` (spec §7:
    /// configuration errors are fatal to `Start` and must not move the
    /// runner out of its current state).
    pub async fn start(&self) -> Result<(), RunnerError> {
        self.config.validate().map_err(RunnerError::Configuration)?;

        let mut inner = self.inner.write().await;
        if !matches!(inner.state, RunnerState::Pending | RunnerState::Stopped) {
            return Err(RunnerError::InvalidTransition {
                from: inner.state.label(),
                action: "start",
            });
        }

        let built = topology::build(&self.config, &self.registry).await?;
        if let Topology::Stream(processor) = &built {
            processor.start().map_err(|error| RunnerError::Other(error.into()))?;
        }

        inner.topology = Some(built);
        inner.state = RunnerState::Running;
        Ok(())
    }

    /// Cancels the running topology's context, stops the stream
    /// processor first if that's what's running, then stops the actor
    /// system (spec §4.8). Valid from `running` or `paused`.
    pub async fn stop(&self) -> Result<(), RunnerError> {
        let mut inner = self.inner.write().await;
        if !matches!(inner.state, RunnerState::Running | RunnerState::Paused) {
            return Err(RunnerError::InvalidTransition {
                from: inner.state.label(),
                action: "stop",
            });
        }
        inner.state = RunnerState::Stopping;

        if let Some(built) = inner.topology.take() {
            match built {
                Topology::Stream(processor) => {
                    processor.stop().await.map_err(|error| RunnerError::Other(error.into()))?;
                }
                Topology::Flat(system) | Topology::Actor(system) => {
                    system.shutdown().await.map_err(|error| RunnerError::Other(error.into()))?;
                }
            }
        }

        inner.state = RunnerState::Stopped;
        Ok(())
    }

    /// Pauses record delivery. Only the stream topology supports this;
    /// flat and actor topologies return [`RunnerError::NoOpForActorTopology`]
    /// (spec §4.8: "declared no-ops ... with a clear extension point").
    pub async fn pause(&self) -> Result<(), RunnerError> {
        let mut inner = self.inner.write().await;
        match &inner.topology {
            Some(Topology::Stream(processor)) => {
                processor.pause().map_err(|error| RunnerError::Other(error.into()))?;
                inner.state = RunnerState::Paused;
                Ok(())
            }
            Some(Topology::Flat(_)) | Some(Topology::Actor(_)) => Err(RunnerError::NoOpForActorTopology("pause")),
            None => Err(RunnerError::InvalidTransition {
                from: inner.state.label(),
                action: "pause",
            }),
        }
    }

    /// The reverse of [`Self::pause`].
    pub async fn resume(&self) -> Result<(), RunnerError> {
        let mut inner = self.inner.write().await;
        match &inner.topology {
            Some(Topology::Stream(processor)) => {
                processor.resume().map_err(|error| RunnerError::Other(error.into()))?;
                inner.state = RunnerState::Running;
                Ok(())
            }
            Some(Topology::Flat(_)) | Some(Topology::Actor(_)) => Err(RunnerError::NoOpForActorTopology("resume")),
            None => Err(RunnerError::InvalidTransition {
                from: inner.state.label(),
                action: "resume",
            }),
        }
    }

    /// A shared read lock; never contends with another concurrent
    /// `status` or `stats` call, only with a lifecycle transition.
    pub async fn status(&self) -> RunnerState {
        self.inner.read().await.state
    }

    /// Per-stage statistics, if and only if the running topology is the
    /// stream processor (spec §4.5 owns these counters; flat and actor
    /// topologies have no equivalent single place to read them from).
    pub async fn stats(&self) -> Option<(ProcessorStats, Vec<StageStats>)> {
        match &self.inner.read().await.topology {
            Some(Topology::Stream(processor)) => Some(processor.stats()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;

    fn stream_config() -> RunnerConfig {
        RunnerConfig::from_toml(
            r#"
            type = "stream"

            [stream]
            name = "demo-source"
            type = "demo-interval"
            [stream.config]
            period_ms = 5

            [stream_sink]
            name = "console"
            type = "console"
        "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn start_then_stop_round_trips_through_running() {
        let runner = PipelineRunner::new(stream_config(), ComponentRegistry::with_defaults());
        assert_eq!(runner.status().await, RunnerState::Pending);

        runner.start().await.unwrap();
        assert_eq!(runner.status().await, RunnerState::Running);

        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        runner.stop().await.unwrap();
        assert_eq!(runner.status().await, RunnerState::Stopped);
    }

    #[tokio::test]
    async fn pause_and_resume_delegate_to_the_stream_processor() {
        let runner = PipelineRunner::new(stream_config(), ComponentRegistry::with_defaults());
        runner.start().await.unwrap();

        runner.pause().await.unwrap();
        assert_eq!(runner.status().await, RunnerState::Paused);

        runner.resume().await.unwrap();
        assert_eq!(runner.status().await, RunnerState::Running);

        runner.stop().await.unwrap();
    }

    #[tokio::test]
    async fn pause_before_start_is_an_invalid_transition() {
        let runner = PipelineRunner::new(stream_config(), ComponentRegistry::with_defaults());
        let error = runner.pause().await.unwrap_err();
        assert!(matches!(error, RunnerError::InvalidTransition { action: "pause", .. }));
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let runner = PipelineRunner::new(stream_config(), ComponentRegistry::with_defaults());
        runner.start().await.unwrap();
        let error = runner.start().await.unwrap_err();
        assert!(matches!(error, RunnerError::InvalidTransition { action: "start", .. }));
        runner.stop().await.unwrap();
    }

    #[tokio::test]
    async fn pause_on_actor_topology_is_a_no_op_error() {
        let document = r#"
            type = "actor"

            [root]
            name = "root-sink"
            type = "console"
        "#;
        let config = RunnerConfig::from_toml(document).unwrap();
        let runner = PipelineRunner::new(config, ComponentRegistry::with_defaults());
        runner.start().await.unwrap();

        let error = runner.pause().await.unwrap_err();
        assert!(matches!(error, RunnerError::NoOpForActorTopology("pause")));
        runner.stop().await.unwrap();
    }
}
