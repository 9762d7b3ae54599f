//! bcrypt (`$2a$`, `$2b$`, `$2x$`, `$2y$`).
//!
//! Setting format: `$2b$<cost:02>$<22 chars of salt>`; a complete hash is
//! accepted as a setting as well, since its first 29 characters are one.

use base64::alphabet;
use base64::engine::general_purpose::NO_PAD;
use base64::engine::GeneralPurpose;
use base64::Engine;
use zeroize::Zeroizing;

use crate::error::ProviderError;
use crate::SALT_SIZE;

/// bcrypt's own base64 alphabet (`./A-Za-z0-9`), unpadded.
const BCRYPT_BASE64: GeneralPurpose = GeneralPurpose::new(&alphabet::BCRYPT, NO_PAD);

/// Encoded length of a 16 byte salt.
const ENCODED_SALT_LEN: usize = 22;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// bcrypt revisions, as spelled in the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcryptVariant {
    /// `$2a$`
    TwoA,
    /// `$2b$`
    TwoB,
    /// `$2x$`
    TwoX,
    /// `$2y$`
    TwoY,
}

impl BcryptVariant {
    pub(crate) fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "2a" => Some(Self::TwoA),
            "2b" => Some(Self::TwoB),
            "2x" => Some(Self::TwoX),
            "2y" => Some(Self::TwoY),
            _ => None,
        }
    }

    /// Identifier between the leading `$` signs.
    pub fn ident(self) -> &'static str {
        match self {
            Self::TwoA => "2a",
            Self::TwoB => "2b",
            Self::TwoX => "2x",
            Self::TwoY => "2y",
        }
    }

    fn version(self) -> bcrypt::Version {
        match self {
            Self::TwoA => bcrypt::Version::TwoA,
            Self::TwoB => bcrypt::Version::TwoB,
            Self::TwoX => bcrypt::Version::TwoX,
            Self::TwoY => bcrypt::Version::TwoY,
        }
    }
}

fn cost_from_rounds(rounds: u64) -> Result<u32, ProviderError> {
    if rounds == 0 {
        return Ok(bcrypt::DEFAULT_COST);
    }

    u32::try_from(rounds)
        .ok()
        .filter(|cost| (MIN_COST..=MAX_COST).contains(cost))
        .ok_or_else(|| ProviderError::InvalidRounds {
            rounds,
            reason: format!("bcrypt cost must be between {} and {}", MIN_COST, MAX_COST),
        })
}

pub(crate) fn generate_setting(
    variant: BcryptVariant,
    rounds: u64,
    salt: &[u8; SALT_SIZE],
) -> Result<Zeroizing<String>, ProviderError> {
    let cost = cost_from_rounds(rounds)?;
    let encoded = Zeroizing::new(BCRYPT_BASE64.encode(salt));

    Ok(Zeroizing::new(format!(
        "${}${:02}${}",
        variant.ident(),
        cost,
        encoded.as_str()
    )))
}

pub(crate) fn hash(
    variant: BcryptVariant,
    passphrase: &[u8],
    setting: &str,
) -> Result<Zeroizing<String>, ProviderError> {
    let (cost, salt) = parse_setting(setting)?;

    let parts = bcrypt::hash_with_salt(passphrase, cost, *salt)
        .map_err(|e| ProviderError::Hash(e.to_string()))?;

    Ok(Zeroizing::new(parts.format_for_version(variant.version())))
}

fn parse_setting(setting: &str) -> Result<(u32, Zeroizing<[u8; SALT_SIZE]>), ProviderError> {
    let invalid = |reason: &str| ProviderError::InvalidSetting(reason.to_string());

    let mut fields = setting
        .strip_prefix('$')
        .ok_or_else(|| invalid("missing leading '$'"))?
        .split('$');

    let _ident = fields.next();
    let cost = fields
        .next()
        .and_then(|c| c.parse::<u32>().ok())
        .ok_or_else(|| invalid("missing or malformed bcrypt cost"))?;
    let salt_and_hash = fields.next().ok_or_else(|| invalid("missing bcrypt salt"))?;
    if fields.next().is_some() {
        return Err(invalid("unexpected trailing field"));
    }

    let encoded = salt_and_hash
        .get(..ENCODED_SALT_LEN)
        .ok_or_else(|| invalid("bcrypt salt too short"))?;
    let decoded = Zeroizing::new(
        BCRYPT_BASE64
            .decode(encoded)
            .map_err(|e| ProviderError::InvalidSetting(format!("bcrypt salt: {}", e)))?,
    );
    let salt: [u8; SALT_SIZE] = decoded
        .as_slice()
        .try_into()
        .map_err(|_| invalid("bcrypt salt has wrong length"))?;

    Ok((cost, Zeroizing::new(salt)))
}
