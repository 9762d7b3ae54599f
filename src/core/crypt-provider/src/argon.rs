//! Argon2 (`$argon2id$`, `$argon2i$`, `$argon2d$`).
//!
//! Settings are PHC strings without the hash field, e.g.
//! `$argon2id$v=19$m=19456,t=2,p=1$<salt>`. `rounds` maps to the time cost.

use argon2::password_hash::{PasswordHash, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use crate::error::ProviderError;
use crate::SALT_SIZE;

pub(crate) fn generate_setting(
    algorithm: Algorithm,
    rounds: u64,
    salt: &[u8; SALT_SIZE],
) -> Result<Zeroizing<String>, ProviderError> {
    let invalid_rounds = |reason: String| ProviderError::InvalidRounds { rounds, reason };

    let t_cost = if rounds == 0 {
        Params::DEFAULT_T_COST
    } else {
        u32::try_from(rounds).map_err(|_| invalid_rounds("exceeds 32 bits".to_string()))?
    };

    let params = Params::new(Params::DEFAULT_M_COST, t_cost, Params::DEFAULT_P_COST, None)
        .map_err(|e| invalid_rounds(e.to_string()))?;

    let salt = SaltString::encode_b64(salt).map_err(|e| ProviderError::Hash(e.to_string()))?;

    Ok(Zeroizing::new(format!(
        "${}$v={}$m={},t={},p={}${}",
        algorithm.as_str(),
        Version::V0x13 as u32,
        params.m_cost(),
        params.t_cost(),
        params.p_cost(),
        salt.as_str()
    )))
}

pub(crate) fn hash(
    passphrase: &[u8],
    setting: &str,
) -> Result<Zeroizing<String>, ProviderError> {
    let parsed = PasswordHash::new(setting).map_err(invalid_setting)?;
    let algorithm = Algorithm::try_from(parsed.algorithm).map_err(invalid_setting)?;
    let version = parsed
        .version
        .map(Version::try_from)
        .transpose()
        .map_err(invalid_setting)?
        .unwrap_or_default();
    let params = Params::try_from(&parsed).map_err(invalid_setting)?;
    let salt = parsed
        .salt
        .ok_or_else(|| ProviderError::InvalidSetting("missing salt".to_string()))?;

    let hashed = Argon2::default()
        .hash_password_customized(
            passphrase,
            Some(algorithm.ident()),
            Some(version as u32),
            params,
            salt,
        )
        .map_err(|e| ProviderError::Hash(e.to_string()))?;

    Ok(Zeroizing::new(hashed.to_string()))
}

fn invalid_setting(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::InvalidSetting(e.to_string())
}
