/*!
 * Password-based key derivation
 *
 * The extended key store never hashes passwords itself. It consumes a
 * [`KeyDerivationEngine`], which must be deterministic: the same
 * `(password, salt)` pair always yields the same bytes. The derived-key
 * cache relies on that property.
 */

mod argon;
mod pbkdf;

pub use argon::Argon2Deriver;
pub use pbkdf::Pbkdf2Deriver;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::secure_memory::SecureBytes;

#[cfg(test)]
mod tests;

/// A slow, deterministic password-based key derivation function
pub trait KeyDerivationEngine: Send + Sync {
    /// Derive key bytes from a password and salt
    fn derive_key(&self, password: &str, salt: &[u8]) -> KeyStoreResult<SecureBytes>;

    /// Generate a fresh random salt of [`salt_length`](Self::salt_length) bytes
    fn generate_random_salt(&self) -> KeyStoreResult<Vec<u8>> {
        random_bytes(self.salt_length())
    }

    /// Salt length in bytes
    fn salt_length(&self) -> usize;

    /// Derived key length in bytes
    fn key_length(&self) -> usize;
}

/// Generates cryptographically secure random bytes from the OS RNG
pub fn random_bytes(length: usize) -> KeyStoreResult<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| KeyStoreError::RandomGenerationError {
            cause: e.to_string(),
            error_code: error_codes::RNG_FAILED,
        })?;
    Ok(bytes)
}

pub(crate) fn check_salt(salt: &[u8], minimum: usize) -> KeyStoreResult<()> {
    if salt.len() < minimum {
        return Err(KeyStoreError::derivation_error(
            "derive_key",
            &format!("salt must be at least {} bytes, got {}", minimum, salt.len()),
            error_codes::INVALID_SALT,
        ));
    }
    Ok(())
}
