//! Stage contract (spec §3, §6): a stage is a pure function from one
//! input record to at most one output record — `Process(ctx, record)`
//! returns either a transformed record or nothing, never mutating the
//! record it was given. `Close()` releases resources (e.g. flushing every
//! open aggregation window) once the stream feeding the stage has ended,
//! and may emit more than the single record a `process` call can.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use thiserror::Error;

// Layer 3: Internal module imports
use crate::context::OpContext;
use pipeline_core::Record;

/// Errors a [`Stage`] implementation can return.
#[derive(Debug, Error)]
pub enum StageError {
    /// The record failed validation or a filter precondition in a way
    /// that should be counted and routed to the error path (spec §7),
    /// rather than treated as a processing fault.
    #[error("record rejected: {0}")]
    Rejected(String),
    /// Any other stage-specific failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single transformation step in a stage chain.
#[async_trait]
pub trait Stage: Send + Sync {
    /// The stage's configured name (used in per-stage statistics, spec
    /// §4.5).
    fn name(&self) -> &str;

    /// The stage's type tag (e.g. `"filter"`, `"remap"`, `"aggregate"`).
    fn stage_type(&self) -> &str;

    /// Transforms one input record into at most one output record;
    /// `Ok(None)` means the record was filtered out. Must not mutate
    /// `record` in place — every stage produces new [`Record`] values
    /// built via [`Record::with_payload`].
    async fn process(&mut self, ctx: &OpContext, record: Record) -> Result<Option<Record>, StageError>;

    /// Flushes any buffered state (e.g. an open aggregation window) and
    /// releases resources. Called once when the upstream stream ends.
    async fn close(&mut self, ctx: &OpContext) -> Result<Vec<Record>, StageError> {
        let _ = ctx;
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::RecordMetadata;

    struct EvenOnly;

    #[async_trait]
    impl Stage for EvenOnly {
        fn name(&self) -> &str {
            "even-only"
        }
        fn stage_type(&self) -> &str {
            "test"
        }
        async fn process(
            &mut self,
            _ctx: &OpContext,
            record: Record,
        ) -> Result<Option<Record>, StageError> {
            match record.get("n").and_then(|v| v.as_i64()) {
                Some(n) if n % 2 == 0 => Ok(Some(record)),
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn stage_passes_through_or_filters_a_record() {
        let mut stage = EvenOnly;
        let ctx = OpContext::new_default();
        let mut payload = serde_json::Map::new();
        payload.insert("n".to_string(), serde_json::json!(4));
        let record = Record::new(payload, RecordMetadata::new("src", "origin"));
        let out = stage.process(&ctx, record).await.unwrap();
        assert!(out.is_some());

        let mut odd_payload = serde_json::Map::new();
        odd_payload.insert("n".to_string(), serde_json::json!(3));
        let odd = Record::new(odd_payload, RecordMetadata::new("src", "origin"));
        let out = stage.process(&ctx, odd).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn default_close_emits_nothing() {
        let mut stage = EvenOnly;
        let ctx = OpContext::new_default();
        let out = stage.close(&ctx).await.unwrap();
        assert!(out.is_empty());
    }
}
