//! # pipeline-stream — the stream-processing topology (spec §4.5).
//!
//! One source feeds a bounded channel; one consumer task runs the
//! record through an ordered stage chain and into a sink. Lifecycle
//! (`created` → `running` → `paused`/`stopping` → `stopped`/`failed`)
//! and statistics are owned here; stage and realtime semantics live in
//! `pipeline-stages` and `pipeline-realtime`.

pub mod processor;
pub mod state;
pub mod stats;

pub use processor::{ProcessorError, StreamProcessor, DEFAULT_CHANNEL_CAPACITY};
pub use state::{AtomicState, ProcessorState};
pub use stats::{ProcessorStats, StageStats, Statistics};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_contracts::{OpContext, Sink, SinkError, Source, SourceError};
    use pipeline_core::{Record, RecordMetadata};
    use pipeline_stages::PassthroughStage;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CountingSource {
        remaining: usize,
    }

    #[async_trait]
    impl Source for CountingSource {
        fn name(&self) -> &str {
            "counting-source"
        }

        fn source_type(&self) -> &str {
            "test"
        }

        async fn read(&mut self, _ctx: OpContext) -> Result<Option<Record>, SourceError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(Record::new(
                json!({"n": self.remaining}).as_object().unwrap().clone(),
                RecordMetadata::new("test", "counting-source"),
            )))
        }
    }

    struct CollectingSink {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Sink for CollectingSink {
        fn name(&self) -> &str {
            "collecting-sink"
        }

        fn sink_type(&self) -> &str {
            "test"
        }

        async fn write(&mut self, _ctx: &OpContext, _record: &Record) -> Result<(), SinkError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn runs_records_end_to_end_through_a_passthrough_stage() {
        let count = Arc::new(AtomicUsize::new(0));
        let processor = StreamProcessor::new(
            Box::new(CountingSource { remaining: 5 }),
            vec![Box::new(PassthroughStage::new("pass"))],
            Box::new(CollectingSink {
                count: Arc::clone(&count),
            }),
        );

        processor.start().expect("start from created");
        // Give the tasks a moment to drain the finite source.
        tokio::time::sleep(Duration::from_millis(50)).await;
        processor.stop().await.expect("stop from running");

        assert_eq!(count.load(Ordering::SeqCst), 5);
        let (stats, _) = processor.stats();
        assert_eq!(stats.output, 5);
        assert_eq!(processor.state(), ProcessorState::Stopped);
    }

    #[tokio::test]
    async fn pause_stops_delivery_without_erroring() {
        let count = Arc::new(AtomicUsize::new(0));
        let processor = StreamProcessor::new(
            Box::new(CountingSource { remaining: 1000 }),
            vec![],
            Box::new(CollectingSink {
                count: Arc::clone(&count),
            }),
        );

        processor.start().expect("start from created");
        processor.pause().expect("pause from running");
        assert_eq!(processor.state(), ProcessorState::Paused);
        processor.resume().expect("resume from paused");
        processor.stop().await.expect("stop from running");
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let state = AtomicState::new(ProcessorState::Created);
        assert!(!state.transition(&[ProcessorState::Running], ProcessorState::Stopped));
    }
}
