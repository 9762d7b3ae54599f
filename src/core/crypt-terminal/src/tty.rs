//! Controlling terminal with saved mode.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::os::fd::{AsRawFd, RawFd};

use tracing::{debug, warn};

use crate::error::TerminalError;
use crate::input::read_byte_into;

/// Device used for prompts and interactive reads.
const TTY_PATH: &str = "/dev/tty";

/// Terminal mode captured before any change was made.
#[derive(Clone, Copy)]
pub struct TerminalSnapshot {
    termios: libc::termios,
}

impl TerminalSnapshot {
    /// The same mode with only character echo disabled.
    pub fn without_echo(&self) -> libc::termios {
        let mut config = self.termios;
        config.c_lflag &= !libc::ECHO;
        config
    }

    /// Raw mode as captured.
    #[inline]
    pub fn as_termios(&self) -> &libc::termios {
        &self.termios
    }
}

impl std::fmt::Debug for TerminalSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSnapshot")
            .field("c_lflag", &self.termios.c_lflag)
            .finish_non_exhaustive()
    }
}

/// The controlling terminal, opened read/write.
///
/// Dropping the terminal restores the captured mode before closing the
/// device.
pub struct Terminal {
    file: File,
    snapshot: TerminalSnapshot,
}

impl Terminal {
    /// Opens the controlling terminal if standard input is interactive.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::NotATerminal`] when standard input is not a
    /// terminal; callers fall back to reading standard input without prompts.
    pub fn open() -> Result<Self, TerminalError> {
        if !stdin_is_terminal() {
            return Err(TerminalError::NotATerminal);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(TTY_PATH)
            .map_err(|source| TerminalError::Open {
                path: TTY_PATH,
                source,
            })?;

        Self::from_file(file)
    }

    /// Wraps an already-open terminal device and captures its mode.
    pub fn from_file(file: File) -> Result<Self, TerminalError> {
        let fd = file.as_raw_fd();
        if unsafe { libc::isatty(fd) } != 1 {
            return Err(TerminalError::NotATerminal);
        }

        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
            return Err(TerminalError::GetAttributes(io::Error::last_os_error()));
        }

        debug!(fd, "captured terminal mode");

        Ok(Self {
            file,
            snapshot: TerminalSnapshot { termios },
        })
    }

    /// The mode captured when the terminal was opened.
    #[inline]
    pub fn snapshot(&self) -> &TerminalSnapshot {
        &self.snapshot
    }

    /// Raw descriptor of the terminal device.
    #[inline]
    pub fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// Disables character echo, leaving all other mode bits as captured.
    pub fn suppress_echo(&self) -> Result<(), TerminalError> {
        apply(self.fd(), &self.snapshot.without_echo())
    }

    /// Reapplies the captured mode.
    pub fn restore(&self) -> Result<(), TerminalError> {
        apply(self.fd(), &self.snapshot.termios)
    }

    /// Writes `text` to the terminal and flushes it.
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        self.file.write_all(text.as_bytes())?;
        self.file.flush()
    }

    /// Terminates the current line; the operator's Enter was not echoed.
    pub fn newline(&mut self) -> io::Result<()> {
        self.prompt("\n")
    }

    /// Reads one byte from the terminal into `dest`.
    ///
    /// Returns `false` at end of stream.
    pub fn read_byte_into(&mut self, dest: &mut u8) -> io::Result<bool> {
        read_byte_into(&mut self.file, dest)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(error = %e, "failed to restore terminal mode");
        }
    }
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("fd", &self.fd())
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

/// Reapplies `snapshot` on `fd` using only `tcsetattr`.
///
/// Async-signal-safe. Returns false if the call failed.
pub fn restore_raw(fd: RawFd, snapshot: &TerminalSnapshot) -> bool {
    unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &snapshot.termios) == 0 }
}

/// Whether standard input is an interactive terminal.
pub fn stdin_is_terminal() -> bool {
    io::stdin().is_terminal()
}

fn apply(fd: RawFd, termios: &libc::termios) -> Result<(), TerminalError> {
    if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, termios) } != 0 {
        return Err(TerminalError::SetAttributes(io::Error::last_os_error()));
    }
    Ok(())
}
