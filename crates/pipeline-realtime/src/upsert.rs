//! Upsert rewriter (spec §4.7): "For each record processed in realtime
//! mode, if the configured event-type field equals `UPDATE` and
//! `EntityExists(entity_id)` returns false, the event-type field is
//! rewritten to `CREATE` in a copy of the record's payload before handing
//! to the stage chain. This rewriting is atomic to the record (no partial
//! mutation visible to stages)."

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use serde_json::Value;

// Layer 3: Internal module imports
use crate::dedup::Dedup;
use pipeline_core::Record;

/// Rewrites `UPDATE` events into `CREATE` when the targeted entity has
/// never been seen.
pub struct UpsertRewriter {
    dedup: Arc<dyn Dedup>,
    event_type_field: String,
    entity_id_field: String,
}

impl UpsertRewriter {
    pub fn new(
        dedup: Arc<dyn Dedup>,
        event_type_field: impl Into<String>,
        entity_id_field: impl Into<String>,
    ) -> Self {
        Self {
            dedup,
            event_type_field: event_type_field.into(),
            entity_id_field: entity_id_field.into(),
        }
    }

    /// Returns a rewritten copy of `record` if the upsert rewrite
    /// applies, otherwise `record` itself, untouched.
    pub async fn rewrite(&self, record: Record) -> Record {
        let event_type = record
            .get(&self.event_type_field)
            .and_then(Value::as_str)
            .map(str::to_string);
        let entity_id = record
            .get(&self.entity_id_field)
            .and_then(Value::as_str)
            .map(str::to_string);

        let (Some(event_type), Some(entity_id)) = (event_type, entity_id) else {
            return record;
        };

        if event_type != "UPDATE" || self.dedup.entity_exists(&entity_id).await {
            return record;
        }

        let mut payload = record.payload().clone();
        payload.insert(self.event_type_field.clone(), Value::String("CREATE".to_string()));
        record.with_payload(payload)
    }
}
