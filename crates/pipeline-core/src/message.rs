//! The actor topology's transport envelope.
//!
//! Spec §3: "A transport envelope around either a record payload, a
//! command string, an error event, or a lifecycle event. It has a
//! generated identifier, a type tag drawn from {data, command, error,
//! lifecycle}, a sender reference, a timestamp, and an optional reply
//! channel for request/response patterns. Invariant: the reply channel, if
//! present, is single-use and capacity-1."

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

// Layer 3: Internal module imports
use crate::ids::MessageId;
use crate::path::ActorPath;
use crate::record::Record;

/// A single-use, capacity-1 reply channel attached to a [`Message`] sent
/// via Ask (spec §4.3: "Ask allocates a capacity-1 reply channel").
///
/// Wraps a [`tokio::sync::oneshot::Sender`], which already has exactly
/// that shape: one send, consuming `self`.
pub struct ReplyChannel(oneshot::Sender<Message>);

impl ReplyChannel {
    /// Creates a linked reply channel pair: the sender half travels inside
    /// the message, the receiver half is held by the Ask caller.
    pub fn new() -> (Self, oneshot::Receiver<Message>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Sends the reply, consuming the channel. Returns the message back to
    /// the caller if the receiving end was already dropped (Ask caller
    /// cancelled).
    pub fn send(self, reply: Message) -> Result<(), Message> {
        self.0.send(reply)
    }
}

impl fmt::Debug for ReplyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReplyChannel(..)")
    }
}

/// An error event carried inside an error-typed message.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    /// Human-readable description of the failure.
    pub message: String,
    /// Opaque source identifier (actor path, stage name, ...).
    pub source: Option<String>,
}

impl ErrorEvent {
    /// Builds an error event with no attributed source.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A lifecycle event: the two shapes the actor runtime sends to parents
/// (spec §4.3, §4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Sent when a child's `Receive` (or a lifecycle hook) returned an
    /// error; triggers the parent supervisor's decision process.
    ChildFailed {
        /// Local name of the failed child.
        name: String,
        /// Human-readable failure cause.
        cause: String,
    },
    /// Sent when a child stopped voluntarily; removes it from the
    /// supervisor's child table without restarting.
    ChildTerminated {
        /// Local name of the terminated child.
        name: String,
    },
}

/// The tagged payload of a [`Message`].
#[derive(Debug)]
pub enum MessageKind {
    /// A record flowing through the actor topology.
    Data(Record),
    /// An opaque command string (pause/resume/stop/stats, ...).
    Command(String),
    /// An error event.
    Error(ErrorEvent),
    /// A lifecycle event.
    Lifecycle(LifecycleEvent),
}

/// A message in transit between actors.
#[derive(Debug)]
pub struct Message {
    /// Generated identifier, unique per message instance.
    pub id: MessageId,
    /// The tagged payload.
    pub kind: MessageKind,
    /// The sender's path, if known. Absent for system-originated messages.
    pub sender: Option<ActorPath>,
    /// Time the message was constructed.
    pub timestamp: DateTime<Utc>,
    /// Single-use, capacity-1 reply channel for request/response (Ask).
    pub reply_to: Option<ReplyChannel>,
}

impl Message {
    /// Constructs a new message of the given kind with no sender and no
    /// reply channel (the common Tell shape).
    pub fn new(kind: MessageKind) -> Self {
        Self {
            id: MessageId::new(),
            kind,
            sender: None,
            timestamp: Utc::now(),
            reply_to: None,
        }
    }

    /// Builder-style: attaches a sender path.
    pub fn with_sender(mut self, sender: ActorPath) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Builder-style: attaches a reply channel, returning the paired
    /// receiver for the Ask caller to await.
    pub fn with_reply(mut self) -> (Self, oneshot::Receiver<Message>) {
        let (channel, rx) = ReplyChannel::new();
        self.reply_to = Some(channel);
        (self, rx)
    }

    /// Convenience constructor for a data message.
    pub fn data(record: Record) -> Self {
        Self::new(MessageKind::Data(record))
    }

    /// Convenience constructor for a command message.
    pub fn command(command: impl Into<String>) -> Self {
        Self::new(MessageKind::Command(command.into()))
    }

    /// Convenience constructor for an empty data reply, used by the actor
    /// loop to satisfy Ask callers whose handler didn't reply explicitly
    /// (spec §4.3: "the loop must deliver a default empty data reply
    /// before releasing the message, so that callers of Ask cannot hang").
    pub fn empty_reply() -> Self {
        Self::new(MessageKind::Command(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> Record {
        let payload = json!({"k": "v"}).as_object().cloned().unwrap_or_default();
        Record::new(payload, crate::record::RecordMetadata::new("src", "origin"))
    }

    #[test]
    fn data_message_carries_record() {
        let msg = Message::data(sample_record());
        assert!(matches!(msg.kind, MessageKind::Data(_)));
        assert!(msg.reply_to.is_none());
    }

    #[test]
    fn reply_channel_is_single_use() {
        let (msg, rx) = Message::command("ping").with_reply();
        let reply_to = msg.reply_to.unwrap();

        let result = reply_to.send(Message::command("pong"));
        assert!(result.is_ok());

        // the oneshot receiver observes exactly the one reply
        let received = rx.try_recv();
        assert!(received.is_ok());
    }

    #[test]
    fn reply_send_after_receiver_dropped_returns_message() {
        let (msg, rx) = Message::command("ping").with_reply();
        drop(rx);
        let reply_to = msg.reply_to.unwrap();
        let result = reply_to.send(Message::command("pong"));
        assert!(result.is_err());
    }

    #[test]
    fn lifecycle_events_carry_child_name() {
        let event = LifecycleEvent::ChildFailed {
            name: "worker-1".to_string(),
            cause: "panic".to_string(),
        };
        match event {
            LifecycleEvent::ChildFailed { name, .. } => assert_eq!(name, "worker-1"),
            LifecycleEvent::ChildTerminated { .. } => unreachable!(),
        }
    }
}
