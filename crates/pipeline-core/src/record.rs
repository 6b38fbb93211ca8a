//! The record: the immutable unit that flows through a pipeline.

// Layer 1: Standard library imports
use std::collections::BTreeMap;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::value::{Payload, Value};

/// Metadata carried alongside a record's payload.
///
/// Mirrors spec §3: "a metadata block (source name, origin identifier,
/// partition+offset, optional message key)". `partition` and `offset` are
/// broker-shaped concepts but are left generic enough to also carry a CDC
/// log position or event-table cursor as a string, per the source that
/// produced the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Name of the source that produced this record (e.g. "orders-kafka").
    pub source: String,
    /// Origin identifier within the source (e.g. a topic or table name).
    pub origin: String,
    /// Partition identifier, if the source is partitioned.
    pub partition: Option<String>,
    /// Offset or position within the partition.
    pub offset: Option<String>,
    /// Message key, if the source attaches one (e.g. a broker message key).
    pub key: Option<String>,
    /// Free-form extra metadata a source chooses to attach.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl RecordMetadata {
    /// Builds metadata for the given source and origin, all other fields
    /// left at their defaults.
    pub fn new(source: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            origin: origin.into(),
            ..Default::default()
        }
    }
}

/// An immutable record flowing through the pipeline.
///
/// Spec §3: "Records are treated as immutable once emitted from a source;
/// stages that 'modify' a record conceptually produce a new value. Records
/// carry no back-pointer to their producer." Every stage that "changes" a
/// record therefore takes `&Record` and returns a new, owned `Record`
/// rather than mutating in place — [`Record::with_payload`] and
/// [`Record::map_payload`] are the two sanctioned construction paths for
/// that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    payload: Payload,
    metadata: RecordMetadata,
    ingested_at: DateTime<Utc>,
}

impl Record {
    /// Constructs a record with the given payload and metadata, stamped
    /// with the current time as its ingestion timestamp.
    pub fn new(payload: Payload, metadata: RecordMetadata) -> Self {
        Self {
            payload,
            metadata,
            ingested_at: Utc::now(),
        }
    }

    /// Constructs a record with an explicit ingestion timestamp — used by
    /// sources replaying historical data and by tests that need
    /// deterministic timestamps.
    pub fn with_timestamp(
        payload: Payload,
        metadata: RecordMetadata,
        ingested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            payload,
            metadata,
            ingested_at,
        }
    }

    /// Read-only access to the payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Read-only access to the metadata.
    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    /// The ingestion timestamp.
    pub fn ingested_at(&self) -> DateTime<Utc> {
        self.ingested_at
    }

    /// Reads a single field by dotted path, e.g. `"meta.level"`.
    pub fn get(&self, field_path: &str) -> Option<&Value> {
        crate::value::resolve_path(&self.payload, field_path)
    }

    /// Produces a new record with the given payload, keeping this record's
    /// metadata and ingestion timestamp. This is the canonical way a stage
    /// "modifies" a record without mutating the original.
    pub fn with_payload(&self, payload: Payload) -> Self {
        Self {
            payload,
            metadata: self.metadata.clone(),
            ingested_at: self.ingested_at,
        }
    }

    /// Applies `f` to a clone of this record's payload and returns a new
    /// record built from the result. Convenience wrapper around
    /// [`Record::with_payload`] for the common "copy, tweak a few fields"
    /// shape used by `remap` and `enrich`.
    pub fn map_payload(&self, f: impl FnOnce(&mut Payload)) -> Self {
        let mut payload = self.payload.clone();
        f(&mut payload);
        self.with_payload(payload)
    }
}
