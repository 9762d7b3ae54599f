//! Randomness sources for salt material.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::EntropyError;

/// Fills buffers with unpredictable bytes.
pub trait EntropySource {
    /// Overwrites all of `dest`.
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// The operating system's generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng.try_fill_bytes(dest)?;
        Ok(())
    }
}
