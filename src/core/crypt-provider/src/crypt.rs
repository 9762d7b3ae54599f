//! Prefix dispatch for the shipped provider.

use argon2::Algorithm;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::blowfish::{self, BcryptVariant};
use crate::error::ProviderError;
use crate::provider::{read_c_str, write_c_str, write_diagnostic, HashProvider};
use crate::{argon, SALT_SIZE, SETTING_OUTPUT_SIZE};

/// Prefix used when none is given: the strongest supported method.
pub const DEFAULT_PREFIX: &str = "$argon2id$";

/// A hashing method selected by a crypt(5) prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// bcrypt in one of its revisions.
    Bcrypt(BcryptVariant),
    /// Argon2 in one of its variants.
    Argon2(Algorithm),
}

impl Scheme {
    /// Resolves a prefix such as `$2b$`, `$2b` or `argon2id`.
    pub fn from_prefix(prefix: &str) -> Result<Self, ProviderError> {
        Self::from_ident(prefix.trim_matches('$'))
            .ok_or_else(|| ProviderError::UnsupportedPrefix(prefix.to_string()))
    }

    /// Resolves the method named by the first field of a setting.
    pub fn from_setting(setting: &str) -> Result<Self, ProviderError> {
        let ident = setting
            .strip_prefix('$')
            .and_then(|rest| rest.split('$').next())
            .ok_or_else(|| ProviderError::InvalidSetting("missing leading '$'".to_string()))?;

        Self::from_ident(ident).ok_or_else(|| ProviderError::UnsupportedPrefix(format!("${}$", ident)))
    }

    fn from_ident(ident: &str) -> Option<Self> {
        if let Some(variant) = BcryptVariant::from_ident(ident) {
            return Some(Self::Bcrypt(variant));
        }

        match ident {
            "argon2id" => Some(Self::Argon2(Algorithm::Argon2id)),
            "argon2i" => Some(Self::Argon2(Algorithm::Argon2i)),
            "argon2d" => Some(Self::Argon2(Algorithm::Argon2d)),
            _ => None,
        }
    }

    fn generate_setting(
        self,
        rounds: u64,
        salt: &[u8; SALT_SIZE],
    ) -> Result<Zeroizing<String>, ProviderError> {
        match self {
            Self::Bcrypt(variant) => blowfish::generate_setting(variant, rounds, salt),
            Self::Argon2(algorithm) => argon::generate_setting(algorithm, rounds, salt),
        }
    }

    fn hash(self, passphrase: &[u8], setting: &str) -> Result<Zeroizing<String>, ProviderError> {
        match self {
            Self::Bcrypt(variant) => blowfish::hash(variant, passphrase, setting),
            Self::Argon2(_) => argon::hash(passphrase, setting),
        }
    }
}

/// crypt(3)-style provider backed by the `bcrypt` and `argon2` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptProvider;

impl CryptProvider {
    /// Creates the provider.
    pub fn new() -> Self {
        Self
    }
}

impl HashProvider for CryptProvider {
    fn max_setting_len(&self) -> usize {
        SETTING_OUTPUT_SIZE
    }

    fn generate_setting(
        &self,
        prefix: Option<&str>,
        rounds: u64,
        entropy: &[u8],
        out: &mut [u8],
    ) -> Result<usize, ProviderError> {
        let prefix = prefix.unwrap_or(DEFAULT_PREFIX);

        let result = Scheme::from_prefix(prefix)
            .and_then(|scheme| {
                debug!(?scheme, rounds, "generating setting");
                scheme.generate_setting(rounds, salt_from(entropy)?)
            })
            .and_then(|setting| write_c_str(out, &setting));

        result.map_err(|e| {
            write_diagnostic(out, &e);
            e
        })
    }

    fn hash(
        &self,
        passphrase: &[u8],
        setting: &[u8],
        out: &mut [u8],
    ) -> Result<usize, ProviderError> {
        let result = std::str::from_utf8(read_c_str(setting))
            .map_err(|_| ProviderError::InvalidSetting("setting is not valid UTF-8".to_string()))
            .and_then(|setting| {
                let scheme = Scheme::from_setting(setting)?;
                trace!(?scheme, "hashing passphrase");
                scheme.hash(passphrase, setting)
            })
            .and_then(|hashed| write_c_str(out, &hashed));

        result.map_err(|e| {
            write_diagnostic(out, &e);
            e
        })
    }
}

fn salt_from(entropy: &[u8]) -> Result<&[u8; SALT_SIZE], ProviderError> {
    entropy
        .get(..SALT_SIZE)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(ProviderError::InsufficientEntropy {
            needed: SALT_SIZE,
            got: entropy.len(),
        })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::OUTPUT_SIZE;

    fn entropy(fill: u8) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = fill.wrapping_add(i as u8);
        }
        bytes
    }

    fn setting(prefix: Option<&str>, rounds: u64, fill: u8) -> Vec<u8> {
        let mut out = [0u8; OUTPUT_SIZE];
        let len = CryptProvider
            .generate_setting(prefix, rounds, &entropy(fill), &mut out)
            .unwrap();
        out[..=len].to_vec()
    }

    fn hash(passphrase: &[u8], setting: &[u8]) -> String {
        let mut out = [0u8; OUTPUT_SIZE];
        let len = CryptProvider.hash(passphrase, setting, &mut out).unwrap();
        String::from_utf8(out[..len].to_vec()).unwrap()
    }

    #[test]
    fn test_prefix_spellings() {
        let expected = Scheme::Bcrypt(BcryptVariant::TwoB);
        assert_eq!(Scheme::from_prefix("$2b$").unwrap(), expected);
        assert_eq!(Scheme::from_prefix("$2b").unwrap(), expected);
        assert_eq!(Scheme::from_prefix("2b").unwrap(), expected);
        assert_eq!(
            Scheme::from_prefix("$argon2i$").unwrap(),
            Scheme::Argon2(Algorithm::Argon2i)
        );
    }

    #[test]
    fn test_unsupported_prefix_leaves_diagnostic() {
        let mut out = [0u8; OUTPUT_SIZE];
        let result = CryptProvider.generate_setting(Some("$1$"), 0, &entropy(0), &mut out);

        assert!(matches!(result, Err(ProviderError::UnsupportedPrefix(_))));
        assert_eq!(read_c_str(&out), b"unsupported hash prefix: $1$");
    }

    #[test]
    fn test_default_prefix_is_argon2id() {
        let setting = setting(None, 0, 0);
        assert!(setting.starts_with(b"$argon2id$"));
    }

    #[test]
    fn test_insufficient_entropy() {
        let mut out = [0u8; OUTPUT_SIZE];
        let result = CryptProvider.generate_setting(Some("$2b$"), 4, &[0u8; 8], &mut out);
        assert!(matches!(
            result,
            Err(ProviderError::InsufficientEntropy { needed: 16, got: 8 })
        ));
    }

    #[test]
    fn test_output_too_small() {
        let mut out = [0u8; 8];
        let result = CryptProvider.generate_setting(Some("$2b$"), 4, &entropy(0), &mut out);
        assert!(matches!(result, Err(ProviderError::OutputTooSmall { .. })));
        assert_eq!(out[7], 0, "diagnostic must be NUL-terminated");
    }

    #[test]
    fn test_settings_follow_entropy() {
        assert_ne!(setting(Some("$2b$"), 4, 1), setting(Some("$2b$"), 4, 2));
        assert_eq!(setting(Some("$2b$"), 4, 1), setting(Some("$2b$"), 4, 1));
    }

    #[test]
    fn test_bcrypt_end_to_end() {
        let setting = setting(Some("$2b$"), 4, 9);
        assert!(setting.starts_with(b"$2b$04$"));

        let hashed = hash(b"hunter2", &setting);
        assert!(hashed.starts_with("$2b$04$"));
        assert!(hashed.as_bytes().starts_with(read_c_str(&setting)));
    }

    #[test]
    fn test_hash_deterministic_for_fixed_setting() {
        for (prefix, rounds) in [("$2b$", 4), ("$argon2id$", 1)] {
            let setting = setting(Some(prefix), rounds, 3);
            assert_eq!(hash(b"hunter2", &setting), hash(b"hunter2", &setting));
            assert_ne!(hash(b"hunter2", &setting), hash(b"hunter3", &setting));
        }
    }

    #[test]
    fn test_full_hash_accepted_as_setting() {
        for prefix in ["$2y$", "$argon2d$"] {
            let setting = setting(Some(prefix), 4, 5);
            let hashed = hash(b"correct horse", &setting);
            assert_eq!(hash(b"correct horse", hashed.as_bytes()), hashed);
        }
    }

    #[test]
    fn test_hash_rejects_unknown_setting() {
        let mut out = [0u8; OUTPUT_SIZE];
        let result = CryptProvider.hash(b"pw", b"$5$rounds=1000$abc\0", &mut out);
        assert!(matches!(result, Err(ProviderError::UnsupportedPrefix(_))));
        assert!(!read_c_str(&out).is_empty());
    }

    #[test]
    fn test_intermediate_strings_are_zeroizing() {
        let salt = [0x11u8; SALT_SIZE];
        for (prefix, rounds) in [("$2b$", 4), ("$argon2i$", 1)] {
            let scheme = Scheme::from_prefix(prefix).unwrap();

            let setting: Zeroizing<String> = scheme.generate_setting(rounds, &salt).unwrap();
            let hashed: Zeroizing<String> = scheme.hash(b"hunter2", &setting).unwrap();

            assert!(hashed.starts_with(setting.as_str()));
        }
    }

    #[test]
    fn test_max_setting_len_covers_generated_settings() {
        let setting = setting(Some("$argon2id$"), u64::from(u32::MAX), 0);
        assert!(setting.len() <= CryptProvider.max_setting_len());
    }
}
