//! Errors an [`super::Actor`](crate::actor::Actor) implementation can return.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// An actor lifecycle or message-handling failure.
///
/// Spec §4.3: "on dispatch-executed error from Receive, notify the parent
/// via a `ChildFailed` lifecycle message." The runtime only needs the
/// cause rendered as a string to build that message, so this carries an
/// `anyhow`-backed escape hatch alongside a couple of named cases the
/// runtime itself distinguishes.
#[derive(Debug, Error)]
pub enum ActorError {
    /// A lifecycle hook (`pre_start`, `pre_restart`, `post_restart`) failed.
    #[error("lifecycle hook failed: {0}")]
    Lifecycle(String),
    /// `Receive` rejected the message outright.
    #[error("message handling failed: {0}")]
    Rejected(String),
    /// Any other failure from actor-owned logic.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
