//! RAII wrappers that keep the [`SecurityContext`] in step with live
//! resources.
//!
//! Registration happens only after a resource is fully initialized, and
//! deregistration happens before it is torn down, so the handler never sees a
//! half-built or already-freed resource.

use std::io;
use std::ops::{Deref, DerefMut};

use tracing::{trace, warn};

use crypt_memory::{LockedBuffer, MemoryError};
use crypt_terminal::{Terminal, TerminalError};

use crate::context::{BufferSlot, SecurityContext};
use crate::error::CleanupError;

/// A [`LockedBuffer`] tracked in a [`SecurityContext`] slot.
///
/// Dropping it scrubs the buffer, removes it from the context and then
/// releases the mapping.
#[derive(Debug)]
pub struct GuardedBuffer<'ctx> {
    context: &'ctx SecurityContext,
    slot: BufferSlot,
    buffer: LockedBuffer,
}

impl<'ctx> GuardedBuffer<'ctx> {
    /// Acquires a locked buffer of `len` bytes and tracks it under `slot`.
    pub fn acquire(
        context: &'ctx SecurityContext,
        slot: BufferSlot,
        len: usize,
    ) -> Result<Self, MemoryError> {
        let buffer = LockedBuffer::acquire(len)?;
        context.track_buffer(slot, &buffer);
        trace!(?slot, len, "tracking locked buffer");

        Ok(Self {
            context,
            slot,
            buffer,
        })
    }

    /// Slot this buffer is tracked under.
    #[inline]
    pub fn slot(&self) -> BufferSlot {
        self.slot
    }
}

impl Deref for GuardedBuffer<'_> {
    type Target = LockedBuffer;

    fn deref(&self) -> &LockedBuffer {
        &self.buffer
    }
}

impl DerefMut for GuardedBuffer<'_> {
    fn deref_mut(&mut self) -> &mut LockedBuffer {
        &mut self.buffer
    }
}

impl Drop for GuardedBuffer<'_> {
    fn drop(&mut self) {
        self.buffer.scrub();
        self.context.untrack_buffer(self.slot);
        trace!(slot = ?self.slot, "untracked locked buffer");
    }
}

/// A [`Terminal`] tracked in a [`SecurityContext`].
///
/// Echo changes are mirrored into the context so the handler knows whether
/// the operator's line still needs terminating. Dropping it restores the
/// terminal before removing it from the context.
#[derive(Debug)]
pub struct GuardedTerminal<'ctx> {
    context: &'ctx SecurityContext,
    terminal: Terminal,
}

impl<'ctx> GuardedTerminal<'ctx> {
    /// Tracks `terminal` and its captured mode in `context`.
    pub fn new(context: &'ctx SecurityContext, terminal: Terminal) -> Result<Self, CleanupError> {
        context.track_terminal(&terminal)?;
        Ok(Self { context, terminal })
    }

    /// Disables echo for the next read.
    pub fn suppress_echo(&self) -> Result<(), TerminalError> {
        self.context.set_echo_suppressed(true);
        self.terminal.suppress_echo()
    }

    /// Reapplies the captured mode.
    pub fn restore(&self) -> Result<(), TerminalError> {
        self.terminal.restore()?;
        self.context.set_echo_suppressed(false);
        Ok(())
    }

    /// Writes a prompt to the terminal.
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        self.terminal.prompt(text)
    }

    /// Terminates the current line.
    pub fn newline(&mut self) -> io::Result<()> {
        self.terminal.newline()
    }

    /// Reads one byte into `dest`; `false` at end of stream.
    pub fn read_byte_into(&mut self, dest: &mut u8) -> io::Result<bool> {
        self.terminal.read_byte_into(dest)
    }
}

impl Drop for GuardedTerminal<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(error = %e, "failed to restore terminal mode");
        }
        self.context.untrack_terminal();
    }
}
