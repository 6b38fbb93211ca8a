//! The `passthrough` stage (spec §4.6): "Returns input unchanged."

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use pipeline_contracts::{OpContext, Stage, StageError};
use pipeline_core::Record;

/// A stage that returns every record unchanged. Used standalone, as a
/// scaffolding default, and as the round-trip fixture in spec §8.
pub struct PassthroughStage {
    name: String,
}

impl PassthroughStage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for PassthroughStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage_type(&self) -> &str {
        "passthrough"
    }

    async fn process(&mut self, _ctx: &OpContext, record: Record) -> Result<Option<Record>, StageError> {
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::RecordMetadata;

    #[tokio::test]
    async fn round_trip_leaves_record_untouched() {
        // Spec §8: "for any record R and a pipeline of [passthrough,
        // passthrough] ... the output equals R with no additional fields."
        let mut first = PassthroughStage::new("p1");
        let mut second = PassthroughStage::new("p2");
        let ctx = OpContext::new_default();

        let mut payload = serde_json::Map::new();
        payload.insert("k".to_string(), serde_json::json!("v"));
        let record = Record::new(payload, RecordMetadata::new("src", "origin"));

        let after_first = first.process(&ctx, record.clone()).await.unwrap().unwrap();
        assert_eq!(after_first, record.clone());

        let after_second = second.process(&ctx, after_first).await.unwrap().unwrap();
        assert_eq!(after_second, record);
    }
}
