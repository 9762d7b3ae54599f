//! Cleanup error types.

use std::io;

use thiserror::Error;

/// Errors that can occur while setting up the interruption path.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// `sigaction` refused the handler.
    #[error("failed to install handler for signal {signal}")]
    Install {
        /// Signal number.
        signal: i32,
        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// A terminal snapshot was already recorded for this context.
    #[error("a terminal is already tracked")]
    TerminalAlreadyTracked,
}
