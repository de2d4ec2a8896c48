//! Argon2id password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

/// Work factor used when hashing passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashStrength {
    /// Library defaults, for production.
    #[default]
    Standard,
    /// Minimal parameters for test runs. Not secure.
    Fast,
}

impl HashStrength {
    fn hasher(self) -> Result<Argon2<'static>, PasswordHashError> {
        match self {
            Self::Standard => Ok(Argon2::default()),
            Self::Fast => {
                let params = Params::new(1024, 1, 1, None)
                    .map_err(|err| PasswordHashError::Parameters(err.to_string()))?;
                Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
            }
        }
    }
}

/// Failure raised while hashing a password.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    #[error("invalid hashing parameters: {0}")]
    Parameters(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash `plaintext` into a PHC string with a fresh random salt.
pub fn hash_password(plaintext: &str, strength: HashStrength) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = strength
        .hasher()?
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|err| PasswordHashError::Hash(err.to_string()))?;
    Ok(hash.to_string())
}

/// Check `plaintext` against a stored PHC string.
///
/// The parameters are read back from the hash itself, so hashes produced with
/// either [`HashStrength`] verify. Malformed hashes never verify.
#[must_use]
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
