//! The context threaded through `Source`/`Stage`/`Sink` calls.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio_util::sync::CancellationToken;

// Layer 3: Internal module imports
use crate::logger::{Logger, TracingLogger};

/// Per-call context: a cancellation signal and a logger handle.
///
/// Spec §5: "Each processor and each actor system carries a cancellation
/// signal. Cancellation is observed at every suspension point." Sources,
/// stages, and sinks observe it the same way: by checking
/// [`OpContext::is_cancelled`] at their own suspension points, since
/// cancellation is cooperative, not preemptive (spec §5).
#[derive(Clone)]
pub struct OpContext {
    cancellation: CancellationToken,
    logger: Arc<dyn Logger>,
}

impl OpContext {
    /// Builds a context with the given cancellation token and logger.
    pub fn new(cancellation: CancellationToken, logger: Arc<dyn Logger>) -> Self {
        Self {
            cancellation,
            logger,
        }
    }

    /// Builds a context with a fresh, never-cancelled token and the
    /// default [`TracingLogger`] — convenient for tests and simple
    /// binaries.
    pub fn new_default() -> Self {
        Self::new(CancellationToken::new(), Arc::new(TracingLogger))
    }

    /// The cancellation token for this run.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// The logger for this run.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Derives a child context with the same logger but a token linked to
    /// (cancelled whenever) this context's token.
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            logger: Arc::clone(&self.logger),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_not_cancelled() {
        let ctx = OpContext::new_default();
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn cancelling_parent_cancels_child() {
        let ctx = OpContext::new_default();
        let child = ctx.child();
        ctx.cancellation().cancel();
        assert!(child.is_cancelled());
    }
}
