//! The `enrich` stage (spec §4.6): "Adds configured static fields;
//! optionally records a `enriched_from` marker."

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;

// Layer 3: Internal module imports
use pipeline_contracts::{OpContext, Stage, StageError};
use pipeline_core::Record;

/// A stage that adds a fixed set of static fields to every record.
pub struct EnrichStage {
    name: String,
    fields: Vec<(String, Value)>,
    marker: Option<String>,
}

impl EnrichStage {
    /// `marker`, if set, is the `enriched_from` value recorded on every
    /// record this stage touches.
    pub fn new(name: impl Into<String>, fields: Vec<(String, Value)>, marker: Option<String>) -> Self {
        Self {
            name: name.into(),
            fields,
            marker,
        }
    }
}

#[async_trait]
impl Stage for EnrichStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage_type(&self) -> &str {
        "enrich"
    }

    async fn process(&mut self, _ctx: &OpContext, record: Record) -> Result<Option<Record>, StageError> {
        let mut payload = record.payload().clone();
        for (key, value) in &self.fields {
            payload.insert(key.clone(), value.clone());
        }
        if let Some(marker) = &self.marker {
            payload.insert("enriched_from".to_string(), Value::String(marker.clone()));
        }
        Ok(Some(record.with_payload(payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::RecordMetadata;
    use serde_json::json;

    fn record() -> Record {
        Record::new(Default::default(), RecordMetadata::new("src", "origin"))
    }

    #[tokio::test]
    async fn adds_static_fields() {
        let mut stage = EnrichStage::new(
            "enrich",
            vec![("region".to_string(), json!("us-east-1"))],
            None,
        );
        let ctx = OpContext::new_default();
        let out = stage.process(&ctx, record()).await.unwrap().unwrap();
        assert_eq!(out.get("region").unwrap(), "us-east-1");
        assert!(out.get("enriched_from").is_none());
    }

    #[tokio::test]
    async fn records_enriched_from_marker_when_configured() {
        let mut stage = EnrichStage::new("enrich", Vec::new(), Some("geo-ip".to_string()));
        let ctx = OpContext::new_default();
        let out = stage.process(&ctx, record()).await.unwrap().unwrap();
        assert_eq!(out.get("enriched_from").unwrap(), "geo-ip");
    }
}
