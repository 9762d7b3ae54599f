//! Provider error types.

use thiserror::Error;

/// Errors reported by a hash provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The prefix does not name a supported algorithm.
    #[error("unsupported hash prefix: {0}")]
    UnsupportedPrefix(String),

    /// The rounds value is out of range for the selected algorithm.
    #[error("invalid rounds {rounds}: {reason}")]
    InvalidRounds {
        /// Requested rounds.
        rounds: u64,
        /// Why the value was rejected.
        reason: String,
    },

    /// The setting string could not be parsed.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    /// Not enough randomness was supplied for a salt.
    #[error("insufficient entropy: need {needed} bytes, got {got}")]
    InsufficientEntropy {
        /// Bytes required.
        needed: usize,
        /// Bytes supplied.
        got: usize,
    },

    /// The result does not fit into the caller's buffer.
    #[error("output buffer too small: need {needed} bytes, have {capacity}")]
    OutputTooSmall {
        /// Bytes required, including the terminating NUL.
        needed: usize,
        /// Bytes available.
        capacity: usize,
    },

    /// The underlying algorithm failed.
    #[error("hashing failed: {0}")]
    Hash(String),
}
