use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use super::{check_salt, KeyDerivationEngine};
use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::secure_memory::SecureBytes;

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 32_000;
/// Default salt length in bytes (256 bits)
pub const DEFAULT_SALT_LENGTH: usize = 32;
/// Default derived key length in bytes (128 bits)
pub const DEFAULT_KEY_LENGTH: usize = 16;

/// PBKDF2-HMAC-SHA256 over the UTF-8 bytes of the password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pbkdf2Deriver {
    iterations: u32,
    salt_length: usize,
    key_length: usize,
}

impl Default for Pbkdf2Deriver {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            salt_length: DEFAULT_SALT_LENGTH,
            key_length: DEFAULT_KEY_LENGTH,
        }
    }
}

impl Pbkdf2Deriver {
    /// Create a deriver with explicit parameters
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any parameter is zero.
    pub fn new(iterations: u32, salt_length: usize, key_length: usize) -> KeyStoreResult<Self> {
        if iterations == 0 || salt_length == 0 || key_length == 0 {
            return Err(KeyStoreError::configuration_error(
                "primitives.pbkdfderivation",
                "iterations, salt length and key length must be positive",
                error_codes::INCONSISTENT_POLICY,
            ));
        }
        Ok(Self {
            iterations,
            salt_length,
            key_length,
        })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl KeyDerivationEngine for Pbkdf2Deriver {
    fn derive_key(&self, password: &str, salt: &[u8]) -> KeyStoreResult<SecureBytes> {
        check_salt(salt, 1)?;

        let mut key = SecureBytes::from(vec![0u8; self.key_length]);
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, key.as_bytes_mut());
        Ok(key)
    }

    fn salt_length(&self) -> usize {
        self.salt_length
    }

    fn key_length(&self) -> usize {
        self.key_length
    }
}
