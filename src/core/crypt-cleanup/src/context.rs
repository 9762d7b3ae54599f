//! Process-wide record of live sensitive resources.
//!
//! Every field starts out "not present" (null pointer, fd `-1`), so a handler
//! that fires before initialization finishes simply skips the missing pieces.

use std::os::fd::RawFd;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicPtr, AtomicUsize, Ordering};
use std::sync::OnceLock;

use crypt_memory::{scrub_raw, LockedBuffer};
use crypt_terminal::{restore_raw, Terminal, TerminalSnapshot};

use crate::error::CleanupError;
use crate::state::{CleanupEvent, CleanupState, StateCell};

/// Which locked buffer a descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSlot {
    /// Passphrase, setting and hash output storage.
    Passphrase,
    /// Per-iteration randomness.
    Entropy,
}

impl BufferSlot {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        match self {
            Self::Passphrase => 0,
            Self::Entropy => 1,
        }
    }
}

/// Pointer and length of a tracked buffer.
///
/// The length is published before the pointer and the pointer is retracted
/// before the length, so a non-null pointer always pairs with a valid length.
#[derive(Debug)]
struct BufferDescriptor {
    ptr: AtomicPtr<u8>,
    len: AtomicUsize,
}

impl BufferDescriptor {
    const fn empty() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            len: AtomicUsize::new(0),
        }
    }

    fn publish(&self, ptr: *mut u8, len: usize) {
        self.len.store(len, Ordering::Release);
        self.ptr.store(ptr, Ordering::Release);
    }

    fn retract(&self) {
        self.ptr.store(ptr::null_mut(), Ordering::Release);
        self.len.store(0, Ordering::Release);
    }

    fn is_present(&self) -> bool {
        !self.ptr.load(Ordering::Acquire).is_null()
    }

    fn scrub(&self) {
        let ptr = self.ptr.load(Ordering::Acquire);
        if ptr.is_null() {
            return;
        }
        let len = self.len.load(Ordering::Acquire);
        unsafe { scrub_raw(ptr, len) };
    }
}

#[derive(Debug)]
struct TerminalDescriptor {
    fd: AtomicI32,
    snapshot: OnceLock<TerminalSnapshot>,
    echo_suppressed: AtomicBool,
}

impl TerminalDescriptor {
    const fn empty() -> Self {
        Self {
            fd: AtomicI32::new(-1),
            snapshot: OnceLock::new(),
            echo_suppressed: AtomicBool::new(false),
        }
    }

    fn restore(&self) {
        let fd = self.fd.load(Ordering::Acquire);
        if fd < 0 {
            return;
        }

        if let Some(snapshot) = self.snapshot.get() {
            restore_raw(fd, snapshot);
        }

        if self.echo_suppressed.swap(false, Ordering::AcqRel) {
            unsafe { libc::write(fd, b"\n".as_ptr().cast(), 1) };
        }
    }
}

/// Live sensitive resources, consulted by the signal handler.
#[derive(Debug)]
pub struct SecurityContext {
    state: StateCell,
    buffers: [BufferDescriptor; BufferSlot::COUNT],
    terminal: TerminalDescriptor,
}

static GLOBAL: SecurityContext = SecurityContext::new();

impl SecurityContext {
    /// Creates an empty context with nothing tracked.
    pub const fn new() -> Self {
        Self {
            state: StateCell::new(),
            buffers: [BufferDescriptor::empty(), BufferDescriptor::empty()],
            terminal: TerminalDescriptor::empty(),
        }
    }

    /// The instance the installed signal handler consults.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Current state of the cleanup state machine.
    pub fn state(&self) -> CleanupState {
        self.state.get()
    }

    /// Moves the context to [`CleanupState::Armed`].
    ///
    /// Returns false if the context has already fired.
    pub fn arm(&self) -> bool {
        self.state.apply(CleanupEvent::Install).is_ok()
    }

    /// Records `buffer` under `slot`.
    pub fn track_buffer(&self, slot: BufferSlot, buffer: &LockedBuffer) {
        self.buffers[slot.index()].publish(buffer.as_mut_ptr(), buffer.len());
    }

    /// Forgets the buffer under `slot`. Must happen before it is unmapped.
    pub fn untrack_buffer(&self, slot: BufferSlot) {
        self.buffers[slot.index()].retract();
    }

    /// Whether a buffer is recorded under `slot`.
    pub fn is_tracked(&self, slot: BufferSlot) -> bool {
        self.buffers[slot.index()].is_present()
    }

    /// Records the terminal and its captured mode.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::TerminalAlreadyTracked`] if a terminal mode was
    /// recorded before; the snapshot is write-once.
    pub fn track_terminal(&self, terminal: &Terminal) -> Result<(), CleanupError> {
        self.terminal
            .snapshot
            .set(*terminal.snapshot())
            .map_err(|_| CleanupError::TerminalAlreadyTracked)?;
        self.terminal.echo_suppressed.store(false, Ordering::Release);
        self.terminal.fd.store(terminal.fd(), Ordering::Release);
        Ok(())
    }

    /// Forgets the terminal descriptor. Must happen before the device closes.
    pub fn untrack_terminal(&self) {
        self.terminal.fd.store(-1, Ordering::Release);
        self.terminal.echo_suppressed.store(false, Ordering::Release);
    }

    /// Descriptor of the tracked terminal, if any.
    pub fn terminal_fd(&self) -> Option<RawFd> {
        let fd = self.terminal.fd.load(Ordering::Acquire);
        (fd >= 0).then_some(fd)
    }

    /// Records whether echo is currently suppressed.
    pub fn set_echo_suppressed(&self, suppressed: bool) {
        self.terminal
            .echo_suppressed
            .store(suppressed, Ordering::Release);
    }

    /// Whether echo is recorded as suppressed.
    pub fn echo_suppressed(&self) -> bool {
        self.terminal.echo_suppressed.load(Ordering::Acquire)
    }

    /// Restores the terminal and zeroes every tracked buffer.
    ///
    /// Runs at most once per context: returns false without touching anything
    /// if the context is not armed or has already fired.
    /// Async-signal-safe.
    pub fn fire(&self) -> bool {
        if self.state.apply(CleanupEvent::Signal).is_err() {
            return false;
        }

        self.terminal.restore();
        for descriptor in &self.buffers {
            descriptor.scrub();
        }

        let _ = self.state.apply(CleanupEvent::CleanupDone);
        true
    }
}

impl Default for SecurityContext {
    fn default() -> Self {
        Self::new()
    }
}
