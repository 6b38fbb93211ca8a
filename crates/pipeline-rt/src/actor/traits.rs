//! The `Actor` trait (spec §4.3): "an actor must expose: `Receive(context,
//! message)`, pre-start hook, post-stop hook, pre-restart and post-restart
//! hooks (invoked with the failure cause, may fail themselves)."

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::actor::context::ActorContext;
use crate::actor::error::ActorError;
use pipeline_core::Message;

/// A unit of isolated, message-driven computation.
///
/// Object-safe by design (`async_trait`, no associated types): the
/// runtime holds heterogeneous actors as `Box<dyn Actor>` in one
/// path-keyed registry, the same shape `pipeline-contracts` uses for
/// `Source`/`Sink`/`Stage`.
#[async_trait]
pub trait Actor: Send + Sync {
    /// Called once before the first message is processed. An error here
    /// is treated the same as a `receive` failure but bypasses the normal
    /// loop entirely — no messages are processed.
    async fn pre_start(&mut self, _ctx: &ActorContext) -> Result<(), ActorError> {
        Ok(())
    }

    /// Handles one message. A returned error triggers a `ChildFailed`
    /// lifecycle notification to the parent.
    async fn receive(&mut self, ctx: &ActorContext, message: Message) -> Result<(), ActorError>;

    /// Called once after the actor stops, whether voluntarily or as part
    /// of a supervised restart's teardown.
    async fn post_stop(&mut self, _ctx: &ActorContext) -> Result<(), ActorError> {
        Ok(())
    }

    /// Called on a fresh instance (from `Props::factory`) before it takes
    /// over from a failed predecessor, with the failure's rendered cause.
    async fn pre_restart(&mut self, _ctx: &ActorContext, _cause: &str) -> Result<(), ActorError> {
        Ok(())
    }

    /// Called after a restarted instance has taken over, with the same
    /// cause passed to `pre_restart`.
    async fn post_restart(&mut self, _ctx: &ActorContext, _cause: &str) -> Result<(), ActorError> {
        Ok(())
    }
}
