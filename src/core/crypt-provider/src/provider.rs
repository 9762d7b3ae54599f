//! Hash provider trait and C-string helpers.

use crate::error::ProviderError;

/// A password-hashing engine.
///
/// Implementations write NUL-terminated text into `out` and return its
/// length without the terminator. On failure they leave a NUL-terminated
/// diagnostic in `out` instead.
pub trait HashProvider {
    /// Longest setting `generate_setting` can produce, including the NUL.
    fn max_setting_len(&self) -> usize;

    /// Generates an algorithm-selection and salt string.
    ///
    /// `prefix` selects the algorithm (`None` = provider default), `rounds`
    /// its cost (`0` = provider default) and `entropy` supplies salt bytes.
    fn generate_setting(
        &self,
        prefix: Option<&str>,
        rounds: u64,
        entropy: &[u8],
        out: &mut [u8],
    ) -> Result<usize, ProviderError>;

    /// Hashes `passphrase` with a setting produced by `generate_setting` or
    /// a complete hash string. `setting` may carry a trailing NUL.
    fn hash(&self, passphrase: &[u8], setting: &[u8], out: &mut [u8])
        -> Result<usize, ProviderError>;
}

/// Copies `text` into `out` followed by a NUL byte.
///
/// # Errors
///
/// Returns [`ProviderError::OutputTooSmall`] if `text` and the terminator do
/// not fit; `out` is left untouched in that case.
pub fn write_c_str(out: &mut [u8], text: &str) -> Result<usize, ProviderError> {
    let bytes = text.as_bytes();
    if bytes.len() >= out.len() {
        return Err(ProviderError::OutputTooSmall {
            needed: bytes.len() + 1,
            capacity: out.len(),
        });
    }

    out[..bytes.len()].copy_from_slice(bytes);
    out[bytes.len()] = 0;
    Ok(bytes.len())
}

/// Bytes of `buf` before the first NUL (all of `buf` if there is none).
pub fn read_c_str(buf: &[u8]) -> &[u8] {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    &buf[..end]
}

/// Leaves `error` as a NUL-terminated diagnostic in `out`, truncated to fit.
pub(crate) fn write_diagnostic(out: &mut [u8], error: &ProviderError) {
    let Some(room) = out.len().checked_sub(1) else {
        return;
    };

    let message = error.to_string();
    let len = message.len().min(room);
    out[..len].copy_from_slice(&message.as_bytes()[..len]);
    out[len] = 0;
}
