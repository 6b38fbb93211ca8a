//! Overflow policy selection.

use serde::{Deserialize, Serialize};

/// What happens when a bounded mailbox is full and a new message arrives.
///
/// Spec §4.1:
/// - **Backpressure**: Push blocks until space is available.
/// - **DropOldest**: the oldest enqueued message is discarded, the new one
///   is enqueued.
/// - **DropNewest**: the new message is rejected with a `full` error;
///   existing contents are preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Producers experience flow control; Push blocks until space opens up.
    #[default]
    Backpressure,
    /// Discard the oldest queued message to make room for the new one.
    DropOldest,
    /// Reject the new message, preserving existing contents.
    DropNewest,
}
