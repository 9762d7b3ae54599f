//! # Crypt Memory
//!
//! Locked memory regions for passphrase and randomness material.
//!
//! This crate provides:
//! - Page-backed buffers pinned in RAM with `mlock` (never swapped to disk)
//! - Scrubbing that the optimizer cannot elide
//! - A raw scrubbing entry point usable from a signal handler

#![warn(missing_docs)]

pub mod error;
pub mod locked;

pub use error::MemoryError;
pub use locked::{scrub_raw, LockedBuffer};
