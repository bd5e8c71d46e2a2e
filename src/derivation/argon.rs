use argon2::{Argon2, ParamsBuilder};

use super::{check_salt, KeyDerivationEngine};
use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::secure_memory::SecureBytes;

/// Argon2 rejects salts shorter than this
const MIN_SALT_LEN: usize = 8;

/// Argon2id (v0x13) key derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Deriver {
    /// Memory cost (in KB)
    memory_cost: u32,
    /// Time cost (iterations)
    time_cost: u32,
    /// Parallelism factor
    parallelism: u32,
    salt_length: usize,
    key_length: usize,
}

impl Default for Argon2Deriver {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
            salt_length: 32,
            key_length: 16,
        }
    }
}

impl Argon2Deriver {
    /// Create a deriver with explicit cost parameters
    ///
    /// # Errors
    ///
    /// Returns a configuration error if Argon2 rejects the parameters or the
    /// salt is shorter than the 8 bytes Argon2 requires.
    pub fn new(
        memory_cost: u32,
        time_cost: u32,
        parallelism: u32,
        salt_length: usize,
        key_length: usize,
    ) -> KeyStoreResult<Self> {
        let deriver = Self {
            memory_cost,
            time_cost,
            parallelism,
            salt_length,
            key_length,
        };
        deriver.hasher().map_err(|e| {
            KeyStoreError::configuration_error(
                "primitives.pbkdfderivation",
                &e.to_string(),
                error_codes::INCONSISTENT_POLICY,
            )
        })?;
        if salt_length < MIN_SALT_LEN {
            return Err(KeyStoreError::configuration_error(
                "primitives.pbkdfderivation",
                &format!("Argon2 salt must be at least {} bytes", MIN_SALT_LEN),
                error_codes::INCONSISTENT_POLICY,
            ));
        }
        Ok(deriver)
    }

    /// Low-resource mode for constrained environments
    pub fn low_resource() -> Self {
        Self {
            memory_cost: 19456, // 19 MB
            time_cost: 2,
            parallelism: 1,
            ..Self::default()
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>, argon2::Error> {
        let mut builder = ParamsBuilder::new();
        builder
            .m_cost(self.memory_cost)
            .t_cost(self.time_cost)
            .p_cost(self.parallelism)
            .output_len(self.key_length);
        let params = builder.build()?;

        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }
}

impl KeyDerivationEngine for Argon2Deriver {
    fn derive_key(&self, password: &str, salt: &[u8]) -> KeyStoreResult<SecureBytes> {
        check_salt(salt, MIN_SALT_LEN)?;

        let argon2 = self.hasher().map_err(|e| {
            KeyStoreError::derivation_error(
                "derive_key",
                &format!("Failed to build Argon2 parameters: {}", e),
                error_codes::DERIVATION_FAILED,
            )
        })?;

        let mut key = SecureBytes::from(vec![0u8; self.key_length]);
        argon2
            .hash_password_into(password.as_bytes(), salt, key.as_bytes_mut())
            .map_err(|e| {
                KeyStoreError::derivation_error(
                    "derive_key",
                    &format!("Failed to derive key: {}", e),
                    error_codes::DERIVATION_FAILED,
                )
            })?;
        Ok(key)
    }

    fn salt_length(&self) -> usize {
        self.salt_length
    }

    fn key_length(&self) -> usize {
        self.key_length
    }
}
