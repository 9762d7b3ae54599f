//! Page-backed buffers pinned in RAM.
//!
//! A [`LockedBuffer`] owns a private anonymous mapping that is `mlock`ed for
//! its whole lifetime. The contents are zeroed on creation, on every call to
//! [`LockedBuffer::scrub`] and once more before the mapping is returned to the
//! system.

use std::io;
use std::ptr::{self, NonNull};
use std::sync::atomic::{compiler_fence, Ordering};

use tracing::{debug, trace, warn};
use zeroize::Zeroize;

use crate::error::MemoryError;

/// Fallback when `sysconf` cannot report the page size.
const DEFAULT_PAGE_SIZE: usize = 4096;

/// A fixed-capacity byte region that is never swapped out.
pub struct LockedBuffer {
    ptr: NonNull<u8>,
    len: usize,
    mapped_len: usize,
}

// The mapping is exclusively owned by this value.
unsafe impl Send for LockedBuffer {}

impl LockedBuffer {
    /// Maps, pins and zeroes a region of at least `len` bytes.
    ///
    /// The mapping is rounded up to whole pages; only the first `len` bytes
    /// are exposed.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::Allocation`] if the mapping fails and
    /// [`MemoryError::Lock`] if it cannot be pinned. In the latter case the
    /// mapping is released before returning.
    pub fn acquire(len: usize) -> Result<Self, MemoryError> {
        if len == 0 {
            return Err(MemoryError::ZeroSize);
        }

        let page = page_size();
        let mapped_len = len
            .checked_add(page - 1)
            .map(|n| n / page * page)
            .ok_or(MemoryError::TooLarge(len))?;

        let raw = unsafe {
            libc::mmap(
                ptr::null_mut(),
                mapped_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if raw == libc::MAP_FAILED {
            return Err(MemoryError::Allocation {
                size: mapped_len,
                source: io::Error::last_os_error(),
            });
        }

        let Some(ptr) = NonNull::new(raw.cast::<u8>()) else {
            return Err(MemoryError::Allocation {
                size: mapped_len,
                source: io::Error::from(io::ErrorKind::OutOfMemory),
            });
        };

        exclude_from_core_dumps(raw, mapped_len);

        if unsafe { libc::mlock(raw, mapped_len) } != 0 {
            let source = io::Error::last_os_error();
            unsafe { libc::munmap(raw, mapped_len) };
            return Err(MemoryError::Lock {
                size: mapped_len,
                source,
            });
        }

        let mut buffer = Self {
            ptr,
            len,
            mapped_len,
        };
        buffer.scrub();

        debug!(len, mapped_len, "acquired locked buffer");

        Ok(buffer)
    }

    /// Number of usable bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; zero-sized buffers cannot be acquired.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read-only view of the usable bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Mutable view of the usable bytes.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Raw base pointer, for registration with the cleanup path.
    #[inline]
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Overwrites every usable byte with zero.
    pub fn scrub(&mut self) {
        self.as_mut_slice().zeroize();
    }

    /// Returns true if every usable byte is zero.
    pub fn is_zeroed(&self) -> bool {
        self.as_slice().iter().all(|&b| b == 0)
    }

    /// Scrubs, unpins and unmaps the region.
    ///
    /// Equivalent to dropping the buffer.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LockedBuffer {
    fn drop(&mut self) {
        self.scrub();

        let raw = self.ptr.as_ptr().cast::<libc::c_void>();
        unsafe {
            if libc::munlock(raw, self.mapped_len) != 0 {
                warn!(error = %io::Error::last_os_error(), "munlock failed");
            }
            if libc::munmap(raw, self.mapped_len) != 0 {
                warn!(error = %io::Error::last_os_error(), "munmap failed");
            }
        }

        trace!(len = self.len, "released locked buffer");
    }
}

impl std::fmt::Debug for LockedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedBuffer")
            .field("len", &self.len)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Zeroes `len` bytes starting at `ptr` with volatile stores.
///
/// Performs no allocation, locking or I/O, so it may be called from a signal
/// handler. A null `ptr` is a no-op.
///
/// # Safety
///
/// `ptr` must be null or valid for writes of `len` bytes.
pub unsafe fn scrub_raw(ptr: *mut u8, len: usize) {
    if ptr.is_null() {
        return;
    }

    for offset in 0..len {
        unsafe { ptr::write_volatile(ptr.add(offset), 0) };
    }
    compiler_fence(Ordering::SeqCst);
}

fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        size as usize
    }
}

#[cfg(target_os = "linux")]
fn exclude_from_core_dumps(raw: *mut libc::c_void, len: usize) {
    if unsafe { libc::madvise(raw, len, libc::MADV_DONTDUMP) } != 0 {
        debug!(error = %io::Error::last_os_error(), "madvise(MADV_DONTDUMP) failed");
    }
}

#[cfg(not(target_os = "linux"))]
fn exclude_from_core_dumps(_raw: *mut libc::c_void, _len: usize) {}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_exposes_requested_length() {
        let buffer = LockedBuffer::acquire(1024).unwrap();
        assert_eq!(buffer.len(), 1024);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_acquire_rounds_mapping_to_pages() {
        let buffer = LockedBuffer::acquire(1).unwrap();
        assert_eq!(buffer.mapped_len % page_size(), 0);
        assert!(buffer.mapped_len >= 1);
    }

    #[test]
    fn test_acquire_zero_size_fails() {
        let result = LockedBuffer::acquire(0);
        assert!(matches!(result, Err(MemoryError::ZeroSize)));
    }

    #[test]
    fn test_acquire_overflowing_size_fails() {
        let result = LockedBuffer::acquire(usize::MAX);
        assert!(matches!(result, Err(MemoryError::TooLarge(_))));
    }

    #[test]
    fn test_new_buffer_is_zeroed() {
        let buffer = LockedBuffer::acquire(512).unwrap();
        assert!(buffer.is_zeroed());
    }

    #[test]
    fn test_scrub_clears_contents() {
        let mut buffer = LockedBuffer::acquire(64).unwrap();
        buffer.as_mut_slice().copy_from_slice(&[0xA5; 64]);
        assert!(!buffer.is_zeroed());

        buffer.scrub();
        assert!(buffer.is_zeroed());

        // Scrubbing is repeatable.
        buffer.as_mut_slice()[10] = 1;
        buffer.scrub();
        assert!(buffer.is_zeroed());
    }

    #[test]
    fn test_scrub_raw_clears_region() {
        let mut buffer = LockedBuffer::acquire(32).unwrap();
        buffer.as_mut_slice().fill(0xFF);

        unsafe { scrub_raw(buffer.as_mut_ptr(), buffer.len()) };
        assert!(buffer.is_zeroed());
    }

    #[test]
    fn test_scrub_raw_null_is_noop() {
        unsafe { scrub_raw(ptr::null_mut(), 128) };
    }

    #[test]
    fn test_release_consumes_buffer() {
        let mut buffer = LockedBuffer::acquire(16).unwrap();
        buffer.as_mut_slice().fill(7);
        buffer.release();
    }

    #[test]
    fn test_debug_redacted() {
        let mut buffer = LockedBuffer::acquire(8).unwrap();
        buffer.as_mut_slice().copy_from_slice(b"hunter2!");
        let debug_str = format!("{:?}", buffer);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("hunter2"));
    }
}
