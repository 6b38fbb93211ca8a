//! # pipeline-runner — assembles and drives one pipeline (spec §4.8).
//!
//! Reads a [`RunnerConfig`], resolves every `type` tag it names against a
//! [`ComponentRegistry`], builds whichever [`Topology`] the configuration
//! selects — flat, hierarchical actor tree, or single stream processor —
//! and exposes the resulting [`PipelineRunner`]'s start/stop/pause/resume
//! lifecycle. Per-backend connectors are out of scope (spec §1): the
//! registry is the seam a caller plugs those into; this crate ships only
//! the backend-free stages from `pipeline-stages` and a demo
//! source/sink to exercise a configuration end-to-end.

pub mod actors;
pub mod config;
pub mod demo;
pub mod error;
pub mod registry;
pub mod runner;
pub mod topology;

pub use config::{ActorDefinition, RunnerConfig, TopologyKind};
pub use error::RunnerError;
pub use registry::ComponentRegistry;
pub use runner::{PipelineRunner, RunnerState};
pub use topology::{Topology, RemoteDedupAdapter};
