//! A cloneable handle to a spawned actor (spec §3: "Actor reference
//! (path, local name, weak mailbox pointer, weak system pointer)").

// Layer 1: Standard library imports
use std::sync::{Arc, Weak};
use std::time::Duration;

// Layer 2: Third-party crate imports
use thiserror::Error;
use tokio::sync::oneshot;

// Layer 3: Internal module imports
use crate::system::ActorSystem;
use pipeline_core::{ActorPath, Mailbox, Message, MessageKind};

/// Failures from [`ActorRef::tell`] or [`ActorRef::ask`].
#[derive(Debug, Error)]
pub enum ActorRefError {
    /// The actor (or the system that owned it) is gone.
    #[error("actor {0} is no longer running")]
    Gone(ActorPath),
    /// The mailbox rejected the push (closed, or full under drop-newest).
    #[error("mailbox push failed: {0}")]
    Mailbox(#[from] pipeline_core::MailboxError),
    /// An `ask` call's reply channel was dropped before a reply arrived.
    #[error("no reply received for ask to {0}")]
    NoReply(ActorPath),
    /// An `ask` call exceeded its caller-supplied timeout.
    #[error("ask to {0} timed out")]
    TimedOut(ActorPath),
}

/// A cheaply cloneable reference to a running (or since-stopped) actor.
///
/// Holds weak pointers so that references handed out to peers never keep
/// a stopped actor's mailbox or the owning system alive on their own.
#[derive(Clone)]
pub struct ActorRef {
    path: ActorPath,
    mailbox: Weak<Mailbox<Message>>,
    system: Weak<ActorSystem>,
}

impl ActorRef {
    pub(crate) fn new(path: ActorPath, mailbox: &Arc<Mailbox<Message>>, system: &Arc<ActorSystem>) -> Self {
        Self {
            path,
            mailbox: Arc::downgrade(mailbox),
            system: Arc::downgrade(system),
        }
    }

    /// This actor's path.
    pub fn path(&self) -> &ActorPath {
        &self.path
    }

    /// Upgrades the weak system pointer, if the system is still alive.
    pub fn system(&self) -> Option<Arc<ActorSystem>> {
        self.system.upgrade()
    }

    /// Fire-and-forget send (spec §4.3: "enqueues and returns the enqueue
    /// error, if any").
    pub async fn tell(&self, kind: MessageKind, sender: Option<ActorPath>) -> Result<(), ActorRefError> {
        let mailbox = self.mailbox.upgrade().ok_or_else(|| ActorRefError::Gone(self.path.clone()))?;
        let mut message = Message::new(kind);
        if let Some(sender) = sender {
            message = message.with_sender(sender);
        }
        mailbox.push(message).await?;
        Ok(())
    }

    /// Request/response send (spec §4.3: "allocates a capacity-1 reply
    /// channel, attaches it to the message, enqueues, and blocks on reply
    /// receipt or caller-supplied cancellation").
    pub async fn ask(
        &self,
        kind: MessageKind,
        sender: Option<ActorPath>,
        timeout: Option<Duration>,
    ) -> Result<Message, ActorRefError> {
        let mailbox = self.mailbox.upgrade().ok_or_else(|| ActorRefError::Gone(self.path.clone()))?;
        let mut message = Message::new(kind);
        if let Some(sender) = sender {
            message = message.with_sender(sender);
        }
        let (message, rx) = message.with_reply();
        mailbox.push(message).await?;

        match timeout {
            Some(duration) => match tokio::time::timeout(duration, rx).await {
                Ok(Ok(reply)) => Ok(reply),
                Ok(Err(_)) => Err(ActorRefError::NoReply(self.path.clone())),
                Err(_) => Err(ActorRefError::TimedOut(self.path.clone())),
            },
            None => rx.await.map_err(|_: oneshot::error::RecvError| ActorRefError::NoReply(self.path.clone())),
        }
    }
}

impl std::fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorRef").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::OverflowPolicy;

    #[tokio::test]
    async fn tell_delivers_into_the_mailbox() {
        let mailbox = Arc::new(Mailbox::new(4, OverflowPolicy::Backpressure));
        // No system needed for a direct tell/ask exercise; use a dummy weak ref.
        let actor_ref = ActorRef {
            path: ActorPath::root("test"),
            mailbox: Arc::downgrade(&mailbox),
            system: Weak::new(),
        };

        actor_ref.tell(MessageKind::Command("ping".to_string()), None).await.unwrap();
        let received = mailbox.pop().await.unwrap();
        assert!(matches!(received.kind, MessageKind::Command(ref c) if c == "ping"));
    }

    #[tokio::test]
    async fn ask_without_a_reply_times_out() {
        let mailbox = Arc::new(Mailbox::new(4, OverflowPolicy::Backpressure));
        let actor_ref = ActorRef {
            path: ActorPath::root("test"),
            mailbox: Arc::downgrade(&mailbox),
            system: Weak::new(),
        };

        let result = actor_ref
            .ask(MessageKind::Command("ping".to_string()), None, Some(Duration::from_millis(20)))
            .await;
        assert!(matches!(result, Err(ActorRefError::TimedOut(_))));
    }

    #[tokio::test]
    async fn tell_against_a_dropped_mailbox_reports_gone() {
        let mailbox = Arc::new(Mailbox::new(4, OverflowPolicy::Backpressure));
        let actor_ref = ActorRef {
            path: ActorPath::root("test"),
            mailbox: Arc::downgrade(&mailbox),
            system: Weak::new(),
        };
        drop(mailbox);

        let result = actor_ref.tell(MessageKind::Command("ping".to_string()), None).await;
        assert!(matches!(result, Err(ActorRefError::Gone(_))));
    }
}
