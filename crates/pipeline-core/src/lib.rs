//! # pipeline-core — shared data model for the pipeline execution engine.
//!
//! This crate defines the types every other crate in the workspace builds
//! on: the record and value model that flows through stages, the actor
//! topology's message envelope, actor path addressing, and the bounded
//! mailbox with its overflow policies. Nothing in this crate depends on
//! tokio tasks or the actor runtime itself — it is the vocabulary, not the
//! machinery.
//!
//! # Module organization
//!
//! - [`value`] — the dynamic, JSON-shaped payload value.
//! - [`record`] — the immutable unit that flows through source → stages → sink.
//! - [`path`] — hierarchical actor path addressing.
//! - [`message`] — the actor topology's transport envelope.
//! - [`mailbox`] — bounded, overflow-policy-aware message queue.
//! - [`ids`] — UUID-backed identifiers used throughout the workspace.

pub mod ids;
pub mod mailbox;
pub mod message;
pub mod path;
pub mod record;
pub mod value;

/// Default mailbox capacity (spec §3: "capacity (default 10,000)").
pub const DEFAULT_MAILBOX_CAPACITY: usize = 10_000;

pub use ids::{ActorId, MessageId};
pub use mailbox::{Mailbox, MailboxError, OverflowPolicy, TryPopError};
pub use message::{ErrorEvent, LifecycleEvent, Message, MessageKind, ReplyChannel};
pub use path::ActorPath;
pub use record::{Record, RecordMetadata};
pub use value::{Payload, Value};
