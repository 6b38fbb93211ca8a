//! Bounded mailbox with overflow policy.
//!
//! Spec §4.1: `Push` enqueues, `Pop` blocks until a message is available
//! or the mailbox closes, `TryPop` is non-blocking, `Drain` returns all
//! currently enqueued messages, `Close` is idempotent.
//!
//! Grounded in the teacher's `mailbox/bounded.rs`, but reworked from a
//! `tokio::mpsc`-backed sender/receiver split into a single `VecDeque`
//! behind a `parking_lot::Mutex` plus two `tokio::sync::Notify`s: the three
//! overflow policies (backpressure, drop-oldest, drop-newest) need queue
//! surgery on a full push that an mpsc channel can't express.

mod bounded;
mod policy;

pub use bounded::Mailbox;
pub use policy::OverflowPolicy;

use thiserror::Error;

/// Errors `Push`/`TrySend` can return.
///
/// Spec §4.1: "Push fails with `closed` if the mailbox has been closed,
/// with `full` only under drop-newest."
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MailboxError {
    /// The mailbox has been closed; no further pushes are accepted.
    #[error("mailbox closed")]
    Closed,
    /// The mailbox was full and the drop-newest policy rejected this push.
    #[error("mailbox full (capacity {capacity})")]
    Full {
        /// The mailbox's configured capacity.
        capacity: usize,
    },
}

/// Error returned by [`Mailbox::try_pop`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TryPopError {
    /// No message is currently queued.
    #[error("mailbox empty")]
    Empty,
    /// The mailbox is closed and fully drained.
    #[error("mailbox closed and empty")]
    Closed,
}
