//! Locked storage laid out like `struct crypt_data`.
//!
//! ```text
//! +-----------------+----------------+----------------+
//! | input (512)     | setting (384)  | output (384)   |
//! +-----------------+----------------+----------------+
//! ```
//!
//! The passphrase, the generated setting and the final hash (or a provider
//! diagnostic) all live inside one locked mapping.

use crypt_cleanup::{BufferSlot, GuardedBuffer, SecurityContext};
use crypt_memory::MemoryError;
use crypt_provider::{MAX_PASSPHRASE_SIZE, OUTPUT_SIZE};

/// Size of the passphrase region, including the terminating NUL.
pub const INPUT_SIZE: usize = MAX_PASSPHRASE_SIZE;

/// Size of the setting region.
pub const SETTING_SIZE: usize = OUTPUT_SIZE;

/// Total size of the passphrase storage.
pub const STORAGE_SIZE: usize = INPUT_SIZE + SETTING_SIZE + OUTPUT_SIZE;

/// Size of the randomness buffer refilled every iteration.
pub const ENTROPY_SIZE: usize = 1024;

/// Mutable views of the three storage regions.
#[derive(Debug)]
pub struct Regions<'a> {
    /// Passphrase bytes, NUL-terminated.
    pub input: &'a mut [u8],
    /// Setting produced by the provider.
    pub setting: &'a mut [u8],
    /// Hash or diagnostic produced by the provider.
    pub output: &'a mut [u8],
}

/// Passphrase storage tracked as [`BufferSlot::Passphrase`].
#[derive(Debug)]
pub struct CryptStorage<'ctx> {
    buffer: GuardedBuffer<'ctx>,
}

impl<'ctx> CryptStorage<'ctx> {
    /// Acquires zeroed locked storage and registers it with `context`.
    pub fn acquire(context: &'ctx SecurityContext) -> Result<Self, MemoryError> {
        let buffer = GuardedBuffer::acquire(context, BufferSlot::Passphrase, STORAGE_SIZE)?;
        Ok(Self { buffer })
    }

    /// Splits the storage into its regions.
    pub fn regions(&mut self) -> Regions<'_> {
        let (input, rest) = self.buffer.as_mut_slice().split_at_mut(INPUT_SIZE);
        let (setting, output) = rest.split_at_mut(SETTING_SIZE);
        Regions {
            input,
            setting,
            output,
        }
    }

    /// Zeroes every region.
    pub fn scrub(&mut self) {
        self.buffer.scrub();
    }

    /// Whether every byte is zero.
    pub fn is_zeroed(&self) -> bool {
        self.buffer.is_zeroed()
    }
}
