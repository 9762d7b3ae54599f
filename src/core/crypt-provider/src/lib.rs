//! # Crypt Provider
//!
//! Hash provider interface and its crypt(5)-compatible implementation.
//!
//! A provider exposes two operations:
//! - `generate_setting(prefix, rounds)`: algorithm selection plus salt
//! - `hash(passphrase, setting)`: the final hash string
//!
//! Both write NUL-terminated text into caller-owned buffers, so the caller
//! decides where results (and failure diagnostics) live.
//!
//! Supported prefixes: `$2a$`, `$2b$`, `$2x$`, `$2y$` (bcrypt) and
//! `$argon2id$`, `$argon2i$`, `$argon2d$` (Argon2).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod argon;
mod blowfish;
pub mod crypt;
pub mod error;
pub mod provider;

pub use blowfish::BcryptVariant;
pub use crypt::{CryptProvider, Scheme, DEFAULT_PREFIX};
pub use error::ProviderError;
pub use provider::{read_c_str, write_c_str, HashProvider};

/// Largest passphrase, including the terminating NUL.
pub const MAX_PASSPHRASE_SIZE: usize = 512;

/// Capacity of the setting and hash output regions.
pub const OUTPUT_SIZE: usize = 384;

/// Largest setting any provider may generate, including the terminating NUL.
pub const SETTING_OUTPUT_SIZE: usize = 192;

/// Bytes of entropy consumed as salt per generated setting.
pub const SALT_SIZE: usize = 16;
