//! The `remap` stage (spec §4.6): "Returns a new record with all input
//! fields plus: a `processed_at` field set to the current RFC-3339
//! timestamp; if the input had a string field `message` whose contents
//! parse as a key-value document, the parsed fields are merged in (parsed
//! fields win on collision); optional static mappings copy `src` field to
//! `dst` field."

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

// Layer 3: Internal module imports
use pipeline_contracts::{OpContext, Stage, StageError};
use pipeline_core::Record;

/// A stage that stamps a processing timestamp, folds a logfmt-style
/// `message` field into top-level fields, and applies static field
/// renames.
pub struct RemapStage {
    name: String,
    /// `(src, dst)` pairs: copy the value at `src` to `dst`.
    mappings: Vec<(String, String)>,
}

impl RemapStage {
    pub fn new(name: impl Into<String>, mappings: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            mappings,
        }
    }
}

#[async_trait]
impl Stage for RemapStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage_type(&self) -> &str {
        "remap"
    }

    async fn process(&mut self, _ctx: &OpContext, record: Record) -> Result<Option<Record>, StageError> {
        let mut payload = record.payload().clone();
        payload.insert(
            "processed_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        if let Some(Value::String(message)) = record.payload().get("message") {
            if let Some(parsed) = parse_kv_document(message) {
                for (key, value) in parsed {
                    payload.insert(key, Value::String(value));
                }
            }
        }

        for (src, dst) in &self.mappings {
            if let Some(value) = record.payload().get(src).cloned() {
                payload.insert(dst.clone(), value);
            }
        }

        Ok(Some(record.with_payload(payload)))
    }
}

/// Parses a logfmt-style `key=value key2="value with spaces"` document.
/// Returns `None` if any whitespace-delimited token lacks an `=`, so a
/// free-text message is left untouched rather than partially merged.
fn parse_kv_document(input: &str) -> Option<Vec<(String, String)>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in input.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    if tokens.is_empty() {
        return None;
    }

    let mut pairs = Vec::with_capacity(tokens.len());
    for token in tokens {
        let mut parts = token.splitn(2, '=');
        let key = parts.next()?;
        let value = parts.next()?;
        if key.is_empty() {
            return None;
        }
        pairs.push((key.to_string(), value.to_string()));
    }
    Some(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::RecordMetadata;
    use serde_json::json;

    fn record(fields: Value) -> Record {
        let payload = match fields {
            Value::Object(map) => map,
            _ => panic!("test fixture must be a JSON object"),
        };
        Record::new(payload, RecordMetadata::new("test", "test"))
    }

    #[tokio::test]
    async fn adds_processed_at_timestamp() {
        let mut stage = RemapStage::new("remap", Vec::new());
        let ctx = OpContext::new_default();
        let out = stage.process(&ctx, record(json!({"k": "v"}))).await.unwrap().unwrap();
        assert!(out.get("processed_at").unwrap().as_str().is_some());
        assert_eq!(out.get("k").unwrap(), "v");
    }

    #[tokio::test]
    async fn merges_parsed_kv_message_with_parsed_fields_winning() {
        let mut stage = RemapStage::new("remap", Vec::new());
        let ctx = OpContext::new_default();
        let input = record(json!({"level": "info", "message": "level=error code=500"}));
        let out = stage.process(&ctx, input).await.unwrap().unwrap();
        assert_eq!(out.get("level").unwrap(), "error");
        assert_eq!(out.get("code").unwrap(), "500");
    }

    #[tokio::test]
    async fn free_text_message_is_left_untouched() {
        let mut stage = RemapStage::new("remap", Vec::new());
        let ctx = OpContext::new_default();
        let input = record(json!({"message": "something went wrong"}));
        let out = stage.process(&ctx, input).await.unwrap().unwrap();
        assert_eq!(out.get("message").unwrap(), "something went wrong");
    }

    #[tokio::test]
    async fn static_mapping_copies_src_to_dst() {
        let mut stage = RemapStage::new("remap", vec![("host".to_string(), "hostname".to_string())]);
        let ctx = OpContext::new_default();
        let input = record(json!({"host": "node-1"}));
        let out = stage.process(&ctx, input).await.unwrap().unwrap();
        assert_eq!(out.get("hostname").unwrap(), "node-1");
        assert_eq!(out.get("host").unwrap(), "node-1");
    }
}
