//! One-shot cleanup state machine.
//!
//! ```text
//! Disarmed --Install--> Armed --Signal--> Firing --CleanupDone--> Terminated
//! ```
//!
//! Only the first signal moves `Armed` to `Firing`. Any later signal finds the
//! machine in `Firing` or `Terminated`, performs no cleanup and falls through
//! to the default disposition.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of the interruption path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CleanupState {
    /// No handler installed.
    Disarmed = 0,
    /// Handler installed, waiting for a signal.
    Armed = 1,
    /// A signal was received and cleanup is running.
    Firing = 2,
    /// Cleanup finished; the signal is being re-delivered.
    Terminated = 3,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupEvent {
    /// The handler was installed.
    Install,
    /// A cleanup signal was delivered.
    Signal,
    /// Terminal restoration and scrubbing completed.
    CleanupDone,
}

impl CleanupState {
    /// Next state for `event`, or `None` if the event is not accepted here.
    pub fn on(self, event: CleanupEvent) -> Option<Self> {
        use CleanupEvent::*;
        use CleanupState::*;

        match (self, event) {
            (Disarmed, Install) | (Armed, Install) => Some(Armed),
            (Armed, Signal) => Some(Firing),
            (Firing, CleanupDone) => Some(Terminated),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Armed,
            2 => Self::Firing,
            3 => Self::Terminated,
            _ => Self::Disarmed,
        }
    }
}

/// Atomic holder for a [`CleanupState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(CleanupState::Disarmed as u8))
    }

    pub(crate) fn get(&self) -> CleanupState {
        CleanupState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Applies `event` atomically.
    ///
    /// Returns the new state, or the unchanged current state if the event was
    /// rejected. Lock-free, so usable from a signal handler.
    pub(crate) fn apply(&self, event: CleanupEvent) -> Result<CleanupState, CleanupState> {
        let mut current = self.get();
        loop {
            let next = current.on(event).ok_or(current)?;
            match self.0.compare_exchange(
                current as u8,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(next),
                Err(actual) => current = CleanupState::from_u8(actual),
            }
        }
    }
}
