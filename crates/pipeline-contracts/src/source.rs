//! Source contract (spec §6).
//!
//! "`Name() -> string`, `Type() -> string`, one of two variants: *Channel
//! variant*: `Start(ctx, out_chan)` begins producing records, closes the
//! channel when done. *Pull variant*: `Open(ctx)`, `Read(ctx) ->
//! (record_chan, error_chan)`, `Close()`. Optional extensions:
//! `Pause/Resume` for flow control; `GetCheckpoint/SetCheckpoint` for
//! restart recovery; `Stats` for lag reporting."
//!
//! Both variants live on one trait with default implementations, rather
//! than as two separate traits a caller would need to downcast between —
//! a source that only implements one variant leaves the other at its
//! default, which reports [`SourceError::Unsupported`].

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

// Layer 3: Internal module imports
use crate::checkpoint::CheckpointData;
use crate::context::OpContext;
use pipeline_core::Record;

/// Sender half of the bounded source → processor channel (spec §4.5:
/// default capacity 1000).
pub type RecordSender = mpsc::Sender<Record>;
/// Receiver half of the bounded source → processor channel.
pub type RecordReceiver = mpsc::Receiver<Record>;

/// Errors a [`Source`] implementation can return.
#[derive(Debug, Error)]
pub enum SourceError {
    /// This source doesn't implement the requested variant or extension.
    #[error("source does not support: {0}")]
    Unsupported(&'static str),
    /// A transient I/O error (spec §7): counted, logged, retried by the
    /// connector or surfaced as a record-level error.
    #[error("transient I/O error: {0}")]
    Transient(#[source] anyhow::Error),
    /// Any other adapter-specific failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Lag/throughput reporting for a source (optional extension, spec §6).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceStats {
    /// Records produced since the source started.
    pub produced: u64,
    /// Best-effort estimate of unconsumed backlog, if the backend exposes
    /// one (e.g. a broker's consumer-group lag).
    pub lag: Option<u64>,
}

/// A component producing records into the pipeline.
#[async_trait]
pub trait Source: Send + Sync {
    /// The source's configured name (for logging, stats, and the
    /// pipeline's declared-inputs wiring).
    fn name(&self) -> &str;

    /// The source's type tag (e.g. `"kafka"`, `"csv"`, `"cdc-postgres"`).
    fn source_type(&self) -> &str;

    /// Channel variant: begin producing records into `out`, closing it
    /// (dropping the sender) when production is done or `ctx` is
    /// cancelled.
    async fn start(&mut self, ctx: OpContext, out: RecordSender) -> Result<(), SourceError> {
        let _ = (ctx, out);
        Err(SourceError::Unsupported("channel start"))
    }

    /// Pull variant: open the source for reading.
    async fn open(&mut self, ctx: OpContext) -> Result<(), SourceError> {
        let _ = ctx;
        Ok(())
    }

    /// Pull variant: read the next record, or `None` at end of stream.
    async fn read(&mut self, ctx: OpContext) -> Result<Option<pipeline_core::Record>, SourceError> {
        let _ = ctx;
        Err(SourceError::Unsupported("pull read"))
    }

    /// Pull variant (and common teardown for the channel variant too):
    /// release any held resources.
    async fn close(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Optional extension: pause production (flow control).
    async fn pause(&mut self) -> Result<(), SourceError> {
        Err(SourceError::Unsupported("pause"))
    }

    /// Optional extension: resume production after [`pause`](Source::pause).
    async fn resume(&mut self) -> Result<(), SourceError> {
        Err(SourceError::Unsupported("resume"))
    }

    /// Optional extension: the source's current checkpoint, for restart
    /// recovery (spec §4.7).
    fn get_checkpoint(&self) -> Option<CheckpointData> {
        None
    }

    /// Optional extension: restore the source's position from a
    /// previously saved checkpoint.
    async fn set_checkpoint(&mut self, data: CheckpointData) -> Result<(), SourceError> {
        let _ = data;
        Err(SourceError::Unsupported("set_checkpoint"))
    }

    /// Optional extension: lag/throughput reporting.
    fn stats(&self) -> SourceStats {
        SourceStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalSource;

    #[async_trait]
    impl Source for MinimalSource {
        fn name(&self) -> &str {
            "minimal"
        }
        fn source_type(&self) -> &str {
            "test"
        }
    }

    #[tokio::test]
    async fn unimplemented_variant_reports_unsupported() {
        let mut source = MinimalSource;
        let ctx = OpContext::new_default();
        let result = source.read(ctx).await;
        assert!(matches!(result, Err(SourceError::Unsupported(_))));
    }

    #[tokio::test]
    async fn default_checkpoint_hooks_are_inert() {
        let source = MinimalSource;
        assert!(source.get_checkpoint().is_none());
        assert_eq!(source.stats(), SourceStats::default());
    }
}
