//! The stream processor's state machine (spec §4.5).
//!
//! "Transitions use compare-and-swap on an atomic state field; spurious
//! transitions fail loudly."

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicU8, Ordering};

/// A stream processor's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Created,
    Running,
    Paused,
    Stopping,
    Stopped,
    Failed,
}

impl ProcessorState {
    fn to_code(self) -> u8 {
        match self {
            ProcessorState::Created => 0,
            ProcessorState::Running => 1,
            ProcessorState::Paused => 2,
            ProcessorState::Stopping => 3,
            ProcessorState::Stopped => 4,
            ProcessorState::Failed => 5,
        }
    }

    fn from_code(code: u8) -> Self {
        match code {
            0 => ProcessorState::Created,
            1 => ProcessorState::Running,
            2 => ProcessorState::Paused,
            3 => ProcessorState::Stopping,
            4 => ProcessorState::Stopped,
            _ => ProcessorState::Failed,
        }
    }
}

/// An atomic holder for [`ProcessorState`], with CAS-based transitions
/// that reject spurious moves rather than silently clamping them.
pub struct AtomicState(AtomicU8);

impl AtomicState {
    pub fn new(initial: ProcessorState) -> Self {
        Self(AtomicU8::new(initial.to_code()))
    }

    pub fn get(&self) -> ProcessorState {
        ProcessorState::from_code(self.0.load(Ordering::SeqCst))
    }

    /// Transitions from any of `from` to `to`. Returns `true` iff the
    /// current state was one of `from` and the swap succeeded.
    pub fn transition(&self, from: &[ProcessorState], to: ProcessorState) -> bool {
        let current = self.0.load(Ordering::SeqCst);
        if !from.iter().any(|state| state.to_code() == current) {
            return false;
        }
        self.0
            .compare_exchange(current, to.to_code(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn set(&self, to: ProcessorState) {
        self.0.store(to.to_code(), Ordering::SeqCst);
    }
}
