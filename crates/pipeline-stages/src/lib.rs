//! # pipeline-stages — the conforming stage library (spec §4.6).
//!
//! Each stage here is a [`pipeline_contracts::Stage`] implementation: a
//! per-record transformation returning at most one output record, or
//! none if the record is filtered out. Their public contract is fixed by
//! the specification; their internals
//! are free, and several (`filter`, `aggregate`) carry real machinery
//! rather than placeholder behavior.

pub mod aggregate;
pub mod enrich;
pub mod filter;
pub mod passthrough;
pub mod remap;
pub mod sample;
pub mod validate;

pub use aggregate::{AggregateFn, AggregateStage};
pub use enrich::EnrichStage;
pub use filter::FilterStage;
pub use passthrough::PassthroughStage;
pub use remap::RemapStage;
pub use sample::SampleStage;
pub use validate::{FieldSchema, FieldType, Schema, ValidateStage, ValidationErrors};
