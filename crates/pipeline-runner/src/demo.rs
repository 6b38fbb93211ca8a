//! Demo source and sink used to exercise the runner end-to-end without a
//! real backend connector (spec §1 scopes per-backend I/O glue out; spec
//! §8 S4 exercises "a 1-per-second demo source").

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::json;

// Layer 3: Internal module imports
use pipeline_contracts::{OpContext, Sink, SinkError, Source, SourceError};
use pipeline_core::{Record, RecordMetadata};

/// A pull-variant source emitting one record per `period`, forever,
/// until the context is cancelled (spec §8 S4).
pub struct IntervalSource {
    name: String,
    period: Duration,
    emitted: u64,
}

impl IntervalSource {
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
            emitted: 0,
        }
    }
}

#[async_trait]
impl Source for IntervalSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        "demo-interval"
    }

    async fn read(&mut self, ctx: OpContext) -> Result<Option<Record>, SourceError> {
        tokio::select! {
            _ = ctx.cancellation().cancelled() => Ok(None),
            _ = tokio::time::sleep(self.period) => {
                self.emitted += 1;
                let metadata = RecordMetadata::new(self.name.clone(), "demo-interval");
                let payload = json!({"seq": self.emitted})
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                Ok(Some(Record::new(payload, metadata)))
            }
        }
    }
}

/// A sink that logs each record through the configured logger and counts
/// writes — the stand-in for a real destination adapter (spec §1).
pub struct ConsoleSink {
    name: String,
    written: Arc<AtomicU64>,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            written: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A shared counter callers can inspect without holding the sink
    /// (the sink itself is moved into the stream processor's consumer
    /// task once started).
    pub fn written_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.written)
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &str {
        "console"
    }

    async fn write(&mut self, ctx: &OpContext, record: &Record) -> Result<(), SinkError> {
        ctx.logger().info(
            "record",
            &[pipeline_contracts::Attr::new("payload", format!("{:?}", record.payload()))],
        );
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn interval_source_emits_after_its_period() {
        let mut source = IntervalSource::new("demo", Duration::from_millis(5));
        let ctx = OpContext::new_default();
        let record = source.read(ctx).await.unwrap();
        assert!(record.is_some());
        assert_eq!(record.unwrap().get("seq").unwrap(), 1);
    }

    #[tokio::test]
    async fn interval_source_stops_on_cancellation() {
        let mut source = IntervalSource::new("demo", Duration::from_secs(30));
        let ctx = OpContext::new_default();
        ctx.cancellation().cancel();
        let record = source.read(ctx).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn console_sink_counts_writes() {
        let mut sink = ConsoleSink::new("console");
        let counter = sink.written_counter();
        let ctx = OpContext::new_default();
        let record = Record::new(Default::default(), RecordMetadata::new("src", "origin"));
        sink.write(&ctx, &record).await.unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}
