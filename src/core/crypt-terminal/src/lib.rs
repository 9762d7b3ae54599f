//! # Crypt Terminal
//!
//! Controlling-terminal access for passphrase prompts.
//!
//! The terminal mode is captured once when the terminal is opened and
//! reapplied on every exit path. While a passphrase is typed only the `ECHO`
//! flag is cleared; every other mode bit is left untouched.

#![warn(missing_docs)]

pub mod error;
pub mod input;
pub mod tty;

pub use error::TerminalError;
pub use input::{read_byte_into, RawStdin};
pub use tty::{restore_raw, stdin_is_terminal, Terminal, TerminalSnapshot};
