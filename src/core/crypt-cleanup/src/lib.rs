//! # Crypt Cleanup
//!
//! Interruption path for the passphrase session.
//!
//! A single process-wide [`SecurityContext`] records which locked buffers and
//! which terminal are live. When `SIGINT`, `SIGTERM` or `SIGQUIT` arrives the
//! handler restores the terminal, zeroes every live buffer and re-raises the
//! signal with its default disposition, so the exit status still reports the
//! signal.
//!
//! ## Handler operations
//!
//! The handler only performs atomic loads and stores, volatile stores,
//! `tcsetattr`, `write`, `signal` and `raise`, all of which are
//! async-signal-safe. Mappings are not unmapped from the handler; the kernel
//! reclaims the already-zeroed pages when the process dies.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod guard;
pub mod handler;
pub mod state;

pub use context::{BufferSlot, SecurityContext};
pub use error::CleanupError;
pub use guard::{GuardedBuffer, GuardedTerminal};
pub use handler::{install, CLEANUP_SIGNALS};
pub use state::{CleanupEvent, CleanupState};
