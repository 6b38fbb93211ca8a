//! Sink contract (spec §6): "`Name() -> string`, `Type() -> string`,
//! `Write(ctx, record) -> error`, `Flush(ctx) -> error`, `Close() ->
//! error`."

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use thiserror::Error;

// Layer 3: Internal module imports
use crate::context::OpContext;
use pipeline_core::Record;

/// Errors a [`Sink`] implementation can return.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A transient I/O error (spec §7): the record write may be retried.
    #[error("transient I/O error: {0}")]
    Transient(#[source] anyhow::Error),
    /// The record itself is unwritable regardless of retry (e.g. it
    /// violates the destination's schema).
    #[error("record rejected by sink: {0}")]
    Rejected(String),
    /// Any other adapter-specific failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A component consuming records out of the pipeline.
#[async_trait]
pub trait Sink: Send + Sync {
    /// The sink's configured name.
    fn name(&self) -> &str;

    /// The sink's type tag (e.g. `"postgres"`, `"console"`, `"s3"`).
    fn sink_type(&self) -> &str;

    /// Writes a single record. Implementations that batch internally may
    /// buffer here and flush on [`flush`](Sink::flush).
    async fn write(&mut self, ctx: &OpContext, record: &Record) -> Result<(), SinkError>;

    /// Forces any buffered writes out to the destination.
    async fn flush(&mut self, ctx: &OpContext) -> Result<(), SinkError> {
        let _ = ctx;
        Ok(())
    }

    /// Releases held resources. Called once, after the pipeline has
    /// stopped feeding this sink.
    async fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::RecordMetadata;
    use std::sync::{Arc, Mutex};

    struct CollectingSink {
        received: Arc<Mutex<Vec<Record>>>,
    }

    #[async_trait]
    impl Sink for CollectingSink {
        fn name(&self) -> &str {
            "collector"
        }
        fn sink_type(&self) -> &str {
            "test"
        }
        async fn write(&mut self, _ctx: &OpContext, record: &Record) -> Result<(), SinkError> {
            self.received.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_flush_and_close_are_no_ops() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let mut sink = CollectingSink {
            received: Arc::clone(&received),
        };
        let ctx = OpContext::new_default();
        let record = Record::new(Default::default(), RecordMetadata::new("src", "origin"));
        sink.write(&ctx, &record).await.unwrap();
        sink.flush(&ctx).await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(received.lock().unwrap().len(), 1);
    }
}
