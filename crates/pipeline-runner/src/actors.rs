//! Adapter actors wrapping a [`Source`]/[`Stage`]/[`Sink`] so the flat and
//! actor topologies (spec §4.8) can run `pipeline-contracts` components
//! inside the `pipeline-rt` actor runtime.
//!
//! Each adapter is deliberately thin: it owns exactly one component and
//! forwards records to the `ActorRef`s named in its `outputs` (spec §6:
//! "`outputs` (list of named downstream actors)"). A [`SourceActor`]
//! drives itself by re-sending a `"pull"` command to its own mailbox
//! after every successful read, rather than owning a separate task —
//! keeping the single-mailbox-owner invariant the runtime relies on for
//! supervised restarts.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use pipeline_contracts::{OpContext, Sink, Source, Stage};
use pipeline_core::{Message, MessageKind};
use pipeline_rt::actor::{Actor, ActorContext, ActorError};

const PULL_COMMAND: &str = "pull";

fn op_context(ctx: &ActorContext) -> OpContext {
    OpContext::new(ctx.system().cancellation().clone(), ctx.logger().clone())
}

/// Drives a [`Source`] by self-scheduling `"pull"` commands, forwarding
/// every record it reads to this actor's configured outputs.
pub struct SourceActor {
    source: Box<dyn Source>,
    outputs: Vec<String>,
}

impl SourceActor {
    pub fn new(source: Box<dyn Source>, outputs: Vec<String>) -> Self {
        Self { source, outputs }
    }
}

#[async_trait]
impl Actor for SourceActor {
    async fn pre_start(&mut self, ctx: &ActorContext) -> Result<(), ActorError> {
        ctx.this()
            .tell(MessageKind::Command(PULL_COMMAND.to_string()), None)
            .await
            .map_err(|error| ActorError::Lifecycle(error.to_string()))
    }

    async fn receive(&mut self, ctx: &ActorContext, message: Message) -> Result<(), ActorError> {
        let MessageKind::Command(command) = &message.kind else {
            return Ok(());
        };
        if command != PULL_COMMAND {
            return Ok(());
        }

        let op_ctx = op_context(ctx);
        match self.source.read(op_ctx).await {
            Ok(Some(record)) => {
                for output in &self.outputs {
                    if let Some(target) = ctx.system().lookup(&pipeline_core::ActorPath::root(output)) {
                        let _ = target
                            .tell(MessageKind::Data(record.clone()), Some(ctx.this().path().clone()))
                            .await;
                    }
                }
                ctx.this()
                    .tell(MessageKind::Command(PULL_COMMAND.to_string()), None)
                    .await
                    .map_err(|error| ActorError::Lifecycle(error.to_string()))
            }
            Ok(None) => {
                // End of stream: stop pulling, leave the actor running so
                // its `post_stop` close hook fires on an explicit `Stop`.
                Ok(())
            }
            Err(error) => Err(ActorError::Other(error.into())),
        }
    }

    async fn post_stop(&mut self, _ctx: &ActorContext) -> Result<(), ActorError> {
        self.source.close().await.map_err(|error| ActorError::Other(error.into()))
    }
}

/// Applies a [`Stage`] to every `Data` message it receives, forwarding
/// each output record to this actor's configured outputs.
pub struct StageActor {
    stage: Box<dyn Stage>,
    outputs: Vec<String>,
}

impl StageActor {
    pub fn new(stage: Box<dyn Stage>, outputs: Vec<String>) -> Self {
        Self { stage, outputs }
    }
}

#[async_trait]
impl Actor for StageActor {
    async fn receive(&mut self, ctx: &ActorContext, message: Message) -> Result<(), ActorError> {
        let MessageKind::Data(record) = message.kind else {
            return Ok(());
        };

        let op_ctx = op_context(ctx);
        let produced = self
            .stage
            .process(&op_ctx, record)
            .await
            .map_err(|error| ActorError::Other(error.into()))?;

        if let Some(record) = produced {
            for output in &self.outputs {
                if let Some(target) = ctx.system().lookup(&pipeline_core::ActorPath::root(output)) {
                    let _ = target
                        .tell(MessageKind::Data(record.clone()), Some(ctx.this().path().clone()))
                        .await;
                }
            }
        }
        Ok(())
    }

    async fn post_stop(&mut self, ctx: &ActorContext) -> Result<(), ActorError> {
        let op_ctx = op_context(ctx);
        self.stage.close(&op_ctx).await.map(|_| ()).map_err(|error| ActorError::Other(error.into()))
    }
}

/// Writes every `Data` message it receives to a [`Sink`].
pub struct SinkActor {
    sink: Box<dyn Sink>,
}

impl SinkActor {
    pub fn new(sink: Box<dyn Sink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Actor for SinkActor {
    async fn receive(&mut self, ctx: &ActorContext, message: Message) -> Result<(), ActorError> {
        let MessageKind::Data(record) = &message.kind else {
            return Ok(());
        };
        let op_ctx = op_context(ctx);
        self.sink
            .write(&op_ctx, record)
            .await
            .map_err(|error| ActorError::Other(error.into()))
    }

    async fn post_stop(&mut self, ctx: &ActorContext) -> Result<(), ActorError> {
        let op_ctx = op_context(ctx);
        if let Err(error) = self.sink.flush(&op_ctx).await {
            ctx.logger().warn(
                "sink flush failed during stop",
                &[pipeline_contracts::Attr::new("error", error.to_string())],
            );
        }
        self.sink.close().await.map_err(|error| ActorError::Other(error.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::IntervalSource;
    use pipeline_contracts::SinkError;
    use pipeline_core::{Record, RecordMetadata};
    use pipeline_rt::{ActorSystem, Props, SystemConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CountingSink {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Sink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }
        fn sink_type(&self) -> &str {
            "test"
        }
        async fn write(&mut self, _ctx: &OpContext, _record: &pipeline_core::Record) -> Result<(), SinkError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn sink_actor_forwards_data_messages_to_the_wrapped_sink() {
        let system = ActorSystem::new(SystemConfig::default());
        system.start().await;

        let count = Arc::new(AtomicUsize::new(0));
        let sunk = Arc::clone(&count);
        let props = Props::new(
            "sink-under-test",
            Arc::new(move || {
                Box::new(SinkActor::new(Box::new(CountingSink { count: Arc::clone(&sunk) }))) as Box<dyn Actor>
            }),
        );
        let sink_ref = system.spawn(props, None).unwrap();

        let record = Record::new(Default::default(), RecordMetadata::new("test", "origin"));
        sink_ref.tell(MessageKind::Data(record), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn source_actor_pulls_and_forwards_without_external_prompting() {
        let system = ActorSystem::new(SystemConfig::default());
        system.start().await;

        let count = Arc::new(AtomicUsize::new(0));
        let sunk = Arc::clone(&count);
        let sink_props = Props::new(
            "counting-sink",
            Arc::new(move || {
                Box::new(SinkActor::new(Box::new(CountingSink { count: Arc::clone(&sunk) }))) as Box<dyn Actor>
            }),
        );
        system.spawn(sink_props, None).unwrap();

        let source_props = Props::new(
            "demo-source",
            Arc::new(|| {
                Box::new(SourceActor::new(
                    Box::new(IntervalSource::new("demo", Duration::from_millis(5))),
                    vec!["counting-sink".to_string()],
                )) as Box<dyn Actor>
            }),
        );
        system.spawn(source_props, None).unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(count.load(Ordering::SeqCst) >= 2);
        system.shutdown().await.unwrap();
    }
}
