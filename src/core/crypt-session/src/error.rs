//! Session error types.

use std::io;

use thiserror::Error;

use crypt_memory::MemoryError;
use crypt_provider::ProviderError;
use crypt_terminal::TerminalError;

/// Failures of the randomness source.
#[derive(Debug, Error)]
pub enum EntropyError {
    /// The operating system generator failed.
    #[error("os random source failed")]
    Os(#[from] rand::Error),
}

/// Fatal session errors.
///
/// Rejected passphrases are not errors; they are reported on the error
/// stream and the session continues.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The provider and the storage layout disagree.
    #[error("configuration error: {0}")]
    Config(String),

    /// Locked memory could not be acquired.
    #[error("failed to acquire locked memory")]
    Memory(#[from] MemoryError),

    /// The randomness buffer could not be refilled.
    #[error("failed to refill the randomness buffer")]
    Entropy(#[from] EntropyError),

    /// Reading input or writing output failed.
    #[error("i/o error")]
    Io(#[from] io::Error),

    /// The terminal mode could not be changed.
    #[error("failed to change terminal mode")]
    Terminal(#[from] TerminalError),

    /// The provider failed; `diagnostic` is the text it left behind.
    #[error("hash provider failed: {diagnostic}")]
    Provider {
        /// Underlying provider error; its text is `diagnostic`.
        error: ProviderError,
        /// Diagnostic read back from the provider's output region.
        diagnostic: String,
    },
}
