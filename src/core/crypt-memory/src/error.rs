//! Locked memory error types.

use std::io;

use thiserror::Error;

/// Errors that can occur while acquiring locked memory.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// A zero-sized region was requested.
    #[error("locked buffer size must be > 0")]
    ZeroSize,

    /// The requested size overflows once rounded up to whole pages.
    #[error("locked buffer of {0} bytes is too large")]
    TooLarge(usize),

    /// The anonymous mapping could not be created.
    #[error("failed to map {size} bytes")]
    Allocation {
        /// Size of the mapping that was attempted.
        size: usize,
        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// The mapping could not be pinned in RAM.
    #[error("failed to lock {size} bytes in memory")]
    Lock {
        /// Size of the mapping that was attempted.
        size: usize,
        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },
}
