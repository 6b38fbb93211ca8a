//! The single-processor stream topology (spec §4.5): one producer task
//! (the source), one consumer task (stage-chain-to-sink), joined by one
//! bounded channel.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::state::{AtomicState, ProcessorState};
use crate::stats::{ProcessorStats, StageStats, Statistics};
use pipeline_contracts::{OpContext, Sink, Source, Stage};
use pipeline_core::Record;
use pipeline_realtime::RealtimeProcessor;

/// Default bounded-channel capacity between the source and the stage
/// chain (spec §4.5).
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Errors returned by [`StreamProcessor`]'s lifecycle operations.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("cannot {action} from state {from:?}")]
    InvalidTransition {
        from: ProcessorState,
        action: &'static str,
    },
    #[error("processor was already started")]
    AlreadyStarted,
    #[error("processor has no running tasks")]
    NotRunning,
    #[error("a processor task panicked or was cancelled before completing")]
    TaskJoin,
}

struct PendingComponents {
    source: Box<dyn Source>,
    stages: Vec<Box<dyn Stage>>,
    sink: Box<dyn Sink>,
    channel_capacity: usize,
    realtime: Option<Arc<RealtimeProcessor>>,
}

struct RunningTasks {
    producer: JoinHandle<Box<dyn Source>>,
    consumer: JoinHandle<(Vec<Box<dyn Stage>>, Box<dyn Sink>)>,
}

/// A single stream-processing pipeline: one source, an ordered stage
/// chain, one sink.
pub struct StreamProcessor {
    state: Arc<AtomicState>,
    paused: Arc<AtomicBool>,
    stats: Arc<Statistics>,
    ctx: OpContext,
    pending: Mutex<Option<PendingComponents>>,
    tasks: Mutex<Option<RunningTasks>>,
}

impl StreamProcessor {
    /// Builds a processor with the default channel capacity and no
    /// realtime preprocessing.
    pub fn new(source: Box<dyn Source>, stages: Vec<Box<dyn Stage>>, sink: Box<dyn Sink>) -> Self {
        Self::with_options(source, stages, sink, DEFAULT_CHANNEL_CAPACITY, None)
    }

    /// Builds a processor with an explicit channel capacity and an
    /// optional realtime dedup/upsert layer (spec §4.7), applied to every
    /// record before it reaches the stage chain.
    pub fn with_options(
        source: Box<dyn Source>,
        stages: Vec<Box<dyn Stage>>,
        sink: Box<dyn Sink>,
        channel_capacity: usize,
        realtime: Option<Arc<RealtimeProcessor>>,
    ) -> Self {
        let stage_names: Vec<String> = stages.iter().map(|stage| stage.name().to_string()).collect();
        Self {
            state: Arc::new(AtomicState::new(ProcessorState::Created)),
            paused: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Statistics::new(stage_names)),
            ctx: OpContext::new_default(),
            pending: Mutex::new(Some(PendingComponents {
                source,
                stages,
                sink,
                channel_capacity,
                realtime,
            })),
            tasks: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ProcessorState {
        self.state.get()
    }

    pub fn stats(&self) -> (ProcessorStats, Vec<StageStats>) {
        self.stats.snapshot()
    }

    /// Starts the processor: spawns the producer and consumer tasks.
    /// Valid only from `created` or `stopped` (spec §4.5).
    pub fn start(&self) -> Result<(), ProcessorError> {
        if !self
            .state
            .transition(&[ProcessorState::Created, ProcessorState::Stopped], ProcessorState::Running)
        {
            return Err(ProcessorError::InvalidTransition {
                from: self.state.get(),
                action: "start",
            });
        }

        let components = self.pending.lock().take().ok_or(ProcessorError::AlreadyStarted)?;
        let (tx, rx) = mpsc::channel(components.channel_capacity);

        let producer_ctx = self.ctx.child();
        let mut source = components.source;
        let producer: JoinHandle<Box<dyn Source>> = tokio::spawn(async move {
            loop {
                if producer_ctx.is_cancelled() {
                    break;
                }
                match source.read(producer_ctx.clone()).await {
                    Ok(Some(record)) => {
                        if tx.send(record).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        tracing::error!(%error, "source read failed; stopping production");
                        break;
                    }
                }
            }
            source
        });

        let consumer_ctx = self.ctx.child();
        let state = Arc::clone(&self.state);
        let paused = Arc::clone(&self.paused);
        let stats = Arc::clone(&self.stats);
        let realtime = components.realtime;
        let mut stages = components.stages;
        let mut sink = components.sink;
        let mut rx = rx;
        let consumer: JoinHandle<(Vec<Box<dyn Stage>>, Box<dyn Sink>)> = tokio::spawn(async move {
            run_consumer_loop(
                &consumer_ctx,
                &mut rx,
                &mut stages,
                &mut sink,
                &stats,
                &paused,
                realtime.as_deref(),
            )
            .await;

            if let Err(error) = sink.flush(&consumer_ctx).await {
                tracing::warn!(%error, "error flushing sink at shutdown");
            }
            state.transition(
                &[ProcessorState::Running, ProcessorState::Paused, ProcessorState::Stopping],
                ProcessorState::Stopped,
            );

            (stages, sink)
        });

        *self.tasks.lock() = Some(RunningTasks { producer, consumer });
        Ok(())
    }

    /// Valid only from `running` (spec §4.5). Paused records are drained
    /// from the channel but not processed.
    pub fn pause(&self) -> Result<(), ProcessorError> {
        if self.state.transition(&[ProcessorState::Running], ProcessorState::Paused) {
            self.paused.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(ProcessorError::InvalidTransition {
                from: self.state.get(),
                action: "pause",
            })
        }
    }

    /// Valid only from `paused`.
    pub fn resume(&self) -> Result<(), ProcessorError> {
        if self.state.transition(&[ProcessorState::Paused], ProcessorState::Running) {
            self.paused.store(false, Ordering::SeqCst);
            Ok(())
        } else {
            Err(ProcessorError::InvalidTransition {
                from: self.state.get(),
                action: "resume",
            })
        }
    }

    /// Cancels the processor's context, waits for both tasks to exit,
    /// then calls `Close` on the source, every stage, and the sink —
    /// logging but not propagating close errors (spec §4.5).
    pub async fn stop(&self) -> Result<(), ProcessorError> {
        if !self
            .state
            .transition(&[ProcessorState::Running, ProcessorState::Paused], ProcessorState::Stopping)
        {
            return Err(ProcessorError::InvalidTransition {
                from: self.state.get(),
                action: "stop",
            });
        }

        self.ctx.cancellation().cancel();

        let tasks = self.tasks.lock().take().ok_or(ProcessorError::NotRunning)?;
        let mut source = tasks.producer.await.map_err(|_| ProcessorError::TaskJoin)?;
        let (mut stages, mut sink) = tasks.consumer.await.map_err(|_| ProcessorError::TaskJoin)?;

        if let Err(error) = source.close().await {
            tracing::warn!(%error, "error closing source");
        }
        for stage in stages.iter_mut() {
            if let Err(error) = stage.close(&self.ctx).await {
                tracing::warn!(stage = stage.name(), %error, "error closing stage");
            }
        }
        if let Err(error) = sink.close().await {
            tracing::warn!(%error, "error closing sink");
        }

        Ok(())
    }
}

/// The consumer task's run loop: reads from `rx`, applies `stages` in
/// declared order, writes survivors to `sink`.
#[allow(clippy::too_many_arguments)]
async fn run_consumer_loop(
    ctx: &OpContext,
    rx: &mut mpsc::Receiver<Record>,
    stages: &mut [Box<dyn Stage>],
    sink: &mut Box<dyn Sink>,
    stats: &Statistics,
    paused: &AtomicBool,
    realtime: Option<&RealtimeProcessor>,
) {
    loop {
        let received = tokio::select! {
            _ = ctx.cancellation().cancelled() => None,
            maybe = rx.recv() => maybe,
        };
        let Some(record) = received else {
            break;
        };

        if paused.load(Ordering::SeqCst) {
            // "the record is drained but not processed" (spec §4.5).
            continue;
        }

        stats.record_input();
        let record_start = Instant::now();

        let record = match realtime {
            Some(realtime) => match realtime.process(record).await {
                Some(record) => record,
                None => {
                    stats.record_duplicate();
                    continue;
                }
            },
            None => record,
        };

        let mut current = Some(record);
        let mut had_error = false;

        for (index, stage) in stages.iter_mut().enumerate() {
            let Some(record) = current.take() else {
                break;
            };
            let stage_start = Instant::now();
            match stage.process(ctx, record).await {
                Ok(Some(record)) => {
                    stats.record_stage_success(index, stage_start.elapsed());
                    current = Some(record);
                }
                Ok(None) => {
                    stats.record_stage_filtered(index, stage_start.elapsed());
                }
                Err(error) => {
                    stats.record_stage_error(index, stage_start.elapsed());
                    tracing::warn!(stage = stage.name(), %error, "stage error; dropping record");
                    had_error = true;
                }
            }
        }

        if had_error {
            continue;
        }

        let Some(record) = current else {
            continue;
        };

        if let Err(error) = sink.write(ctx, &record).await {
            stats.record_sink_error();
            tracing::warn!(sink = sink.name(), %error, "sink write failed");
        }
        stats.record_output(record_start.elapsed());
    }
}
