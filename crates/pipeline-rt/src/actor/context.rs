//! Per-message actor context (spec §4.3): "Self reference, Parent
//! reference (may be absent at the root), Children snapshot, Spawn,
//! Stop, Watch/Unwatch, System accessor, Logger, and checkpoint
//! save/load by actor path."

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use crate::actor::actor_ref::ActorRef;
use crate::actor::props::Props;
use crate::system::{ActorSystem, SystemError};
use pipeline_contracts::{CheckpointData, CheckpointError, Checkpointer, Logger};
use pipeline_core::{ActorPath, Message, ReplyChannel};

/// Context handed to every `Actor` method. Cheap to clone: everything
/// behind an `Arc`, except the per-message pending reply slot which is
/// itself an `Arc<Mutex<..>>` so clones observe the same slot.
#[derive(Clone)]
pub struct ActorContext {
    self_ref: ActorRef,
    parent: Option<ActorRef>,
    system: Arc<ActorSystem>,
    checkpointer: Arc<dyn Checkpointer>,
    pending_reply: Arc<Mutex<Option<ReplyChannel>>>,
}

impl ActorContext {
    pub(crate) fn new(
        self_ref: ActorRef,
        parent: Option<ActorRef>,
        system: Arc<ActorSystem>,
        checkpointer: Arc<dyn Checkpointer>,
        pending_reply: Option<ReplyChannel>,
    ) -> Self {
        Self {
            self_ref,
            parent,
            system,
            checkpointer,
            pending_reply: Arc::new(Mutex::new(pending_reply)),
        }
    }

    /// This actor's own reference.
    pub fn this(&self) -> &ActorRef {
        &self.self_ref
    }

    /// The parent's reference, absent at the root.
    pub fn parent(&self) -> Option<&ActorRef> {
        self.parent.as_ref()
    }

    /// A snapshot of this actor's current children.
    pub fn children(&self) -> Vec<ActorRef> {
        self.system.children(self.self_ref.path())
    }

    /// Spawns a child of this actor.
    pub fn spawn(&self, props: Props) -> Result<ActorRef, SystemError> {
        self.system.spawn(props, Some(self.self_ref.path().clone()))
    }

    /// Stops a visible actor (this actor's own subtree).
    pub async fn stop(&self, path: &ActorPath) -> Result<(), SystemError> {
        self.system.stop(path).await
    }

    /// Registers the caller's interest in `target`'s termination. Watching
    /// the same target twice is a no-op (spec §4.3: "Watch/Unwatch are
    /// idempotent").
    pub fn watch(&self, target: &ActorPath) {
        self.system.watch(self.self_ref.path().clone(), target.clone());
    }

    /// Removes a prior [`ActorContext::watch`] registration. A no-op if
    /// there was none.
    pub fn unwatch(&self, target: &ActorPath) {
        self.system.unwatch(self.self_ref.path(), target);
    }

    /// The owning system.
    pub fn system(&self) -> &Arc<ActorSystem> {
        &self.system
    }

    /// The configured logger.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        self.system.logger()
    }

    /// Saves a checkpoint keyed by this actor's path.
    pub async fn checkpoint(&self, data: CheckpointData) -> Result<(), CheckpointError> {
        self.checkpointer.save(self.self_ref.path().as_str(), data).await
    }

    /// Loads the checkpoint keyed by this actor's path.
    pub async fn get_checkpoint(&self) -> Result<CheckpointData, CheckpointError> {
        self.checkpointer.load(self.self_ref.path().as_str()).await
    }

    /// Sends `reply` via the stashed Ask reply channel, if the message
    /// being handled carried one and it hasn't been used yet. A no-op
    /// (returning `Ok`) when there was no reply channel to begin with.
    pub fn reply(&self, reply: Message) -> Result<(), Message> {
        match self.pending_reply.lock().take() {
            Some(channel) => channel.send(reply),
            None => Ok(()),
        }
    }

    /// Takes the still-unused reply channel, if any. Called by the actor
    /// loop after `receive` returns, to deliver the default empty reply
    /// spec §4.3 requires so Ask callers never hang.
    pub(crate) fn take_pending_reply(&self) -> Option<ReplyChannel> {
        self.pending_reply.lock().take()
    }
}
