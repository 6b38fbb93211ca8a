//! # pipeline-contracts — external interfaces the core consumes (spec §6).
//!
//! This crate defines the traits that sources, sinks, stages, checkpoint
//! stores, and loggers must implement. Per spec §1, the per-backend I/O
//! glue (Kafka/SQL/ES/S3 client code) is explicitly out of scope — this
//! crate defines only the seams those collaborators plug into.
//!
//! None of these traits carry an associated `Error` type: spec §7 treats
//! errors as "abstract kinds, not concrete types", and the pipeline runner
//! (spec §4.8) needs to hold heterogeneous sources/sinks/stages as trait
//! objects, which associated types would rule out. Each contract gets one
//! `thiserror` enum with an `Other(#[from] anyhow::Error)` escape hatch for
//! whatever an adapter's own client library throws.

pub mod checkpoint;
pub mod context;
pub mod logger;
pub mod sink;
pub mod source;
pub mod stage;

pub use checkpoint::{CheckpointData, CheckpointError, Checkpointer, NullCheckpointer};
pub use context::OpContext;
pub use logger::{Attr, Logger, TracingLogger};
pub use sink::{Sink, SinkError};
pub use source::{RecordReceiver, RecordSender, Source, SourceError, SourceStats};
pub use stage::{Stage, StageError};
