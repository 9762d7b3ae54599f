//! Unbuffered byte-at-a-time input.
//!
//! Passphrase bytes go straight from the kernel into the caller's locked
//! memory; nothing here keeps a userspace copy.

use std::io::{self, Read};

/// Standard input read directly from file descriptor 0.
///
/// Unlike [`std::io::Stdin`] this does not buffer, so no passphrase bytes
/// linger in an unlocked heap buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdin;

impl Read for RawStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

/// Reads exactly one byte from `reader` into `dest`.
///
/// Retries when the read is interrupted by a signal. Returns `false` at end of
/// stream, leaving `dest` untouched.
pub fn read_byte_into<R: Read + ?Sized>(reader: &mut R, dest: &mut u8) -> io::Result<bool> {
    loop {
        match reader.read(std::slice::from_mut(dest)) {
            Ok(0) => return Ok(false),
            Ok(_) => return Ok(true),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Fails with `Interrupted` a fixed number of times before delegating.
    struct Flaky<R> {
        interruptions: usize,
        inner: R,
    }

    impl<R: Read> Read for Flaky<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interruptions > 0 {
                self.interruptions -= 1;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.inner.read(buf)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_reads_single_bytes_in_order() {
        let mut reader = Cursor::new(b"ab".to_vec());
        let mut byte = 0u8;

        assert!(read_byte_into(&mut reader, &mut byte).unwrap());
        assert_eq!(byte, b'a');
        assert!(read_byte_into(&mut reader, &mut byte).unwrap());
        assert_eq!(byte, b'b');
        assert!(!read_byte_into(&mut reader, &mut byte).unwrap());
    }

    #[test]
    fn test_end_of_stream_leaves_dest_untouched() {
        let mut reader = Cursor::new(Vec::new());
        let mut byte = 0x42u8;

        assert!(!read_byte_into(&mut reader, &mut byte).unwrap());
        assert_eq!(byte, 0x42);
    }

    #[test]
    fn test_retries_on_interrupted() {
        let mut reader = Flaky {
            interruptions: 3,
            inner: Cursor::new(b"x".to_vec()),
        };
        let mut byte = 0u8;

        assert!(read_byte_into(&mut reader, &mut byte).unwrap());
        assert_eq!(byte, b'x');
    }

    #[test]
    fn test_propagates_other_errors() {
        let mut byte = 0u8;
        let err = read_byte_into(&mut Broken, &mut byte).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
