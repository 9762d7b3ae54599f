//! Terminal error types.

use std::io;

use thiserror::Error;

/// Errors that can occur while driving the controlling terminal.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Standard input is not an interactive terminal.
    #[error("standard input is not a terminal")]
    NotATerminal,

    /// The terminal device could not be opened.
    #[error("failed to open {path}")]
    Open {
        /// Device path.
        path: &'static str,
        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// The current terminal mode could not be read.
    #[error("failed to read terminal attributes")]
    GetAttributes(#[source] io::Error),

    /// A terminal mode could not be applied.
    #[error("failed to set terminal attributes")]
    SetAttributes(#[source] io::Error),
}
