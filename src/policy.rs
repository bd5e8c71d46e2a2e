/*!
 * Extended key store configuration
 *
 * An [`ExtendedKeyStorePolicy`] names the collaborators an extended key store
 * is built from: the platform credential store kind, the password-based key
 * derivation parameters, the secret-key algorithm and the AEAD cipher. It is
 * usually read from a properties file:
 *
 * ```text
 * extended.keystore.p12=SOFTWARE_V1
 * primitives.pbkdfderivation.p12=PBKDF2_32000_SHA256_256_KL128
 * symmetric.encryptionsecretkey=AES_128
 * symmetric.cipher=AES_WITH_GCM_AND_NOPADDING_96_128
 * primitives.pbkdfderivation.minpasswordlength=16
 * primitives.pbkdfderivation.maxpasswordlength=1000
 * ```
 *
 * Missing or blank properties fall back to the defaults shown above.
 */

use std::collections::HashMap;

use crate::derivation::{Argon2Deriver, KeyDerivationEngine, Pbkdf2Deriver};
use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::key_management::PasswordPolicy;
use crate::platform::{CredentialStoreProvider, SoftwareCredentialStoreProvider, SOFTWARE_STORE_KIND};
use crate::symmetric::{AesGcmCipher, AuthenticatedCipher, ChaCha20Poly1305Cipher};

pub const STORE_KIND_PROPERTY: &str = "extended.keystore.p12";
pub const PBKDF_PROPERTY: &str = "primitives.pbkdfderivation.p12";
pub const SECRET_KEY_PROPERTY: &str = "symmetric.encryptionsecretkey";
pub const CIPHER_PROPERTY: &str = "symmetric.cipher";
pub const MIN_PASSWORD_LENGTH_PROPERTY: &str = "primitives.pbkdfderivation.minpasswordlength";
pub const MAX_PASSWORD_LENGTH_PROPERTY: &str = "primitives.pbkdfderivation.maxpasswordlength";

const DEFAULT_PBKDF: &str = "PBKDF2_32000_SHA256_256_KL128";
const DEFAULT_SECRET_KEY: &str = "AES_128";
const DEFAULT_CIPHER: &str = "AES_WITH_GCM_AND_NOPADDING_96_128";
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 16;
const DEFAULT_MAX_PASSWORD_LENGTH: usize = 1000;

/// Password-based key derivation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PbkdfParameters {
    /// PBKDF2-HMAC-SHA256
    Pbkdf2 {
        iterations: u32,
        salt_length: usize,
        key_length: usize,
    },
    /// Argon2id v0x13
    Argon2id {
        memory_cost: u32,
        time_cost: u32,
        parallelism: u32,
        salt_length: usize,
        key_length: usize,
    },
}

impl PbkdfParameters {
    /// Parse a name such as `PBKDF2_32000_SHA256_256_KL128` or
    /// `ARGON2ID_65536_3_4_256_KL128`
    ///
    /// Legacy PBKDF2 names carry a provider token before the key length
    /// (`PBKDF2_32000_SHA256_256_BC_KL128`); it is ignored.
    pub fn parse(name: &str) -> KeyStoreResult<Self> {
        let tokens: Vec<&str> = name.trim().split('_').collect();
        let unknown = || unknown_value(PBKDF_PROPERTY, name);

        let key_bits = tokens
            .last()
            .and_then(|t| t.strip_prefix("KL"))
            .ok_or_else(unknown)?;
        let key_length = bits_to_bytes(key_bits).ok_or_else(unknown)?;

        match tokens[0] {
            "PBKDF2" if tokens.len() >= 5 && tokens[2] == "SHA256" => Ok(Self::Pbkdf2 {
                iterations: tokens[1].parse().map_err(|_| unknown())?,
                salt_length: bits_to_bytes(tokens[3]).ok_or_else(unknown)?,
                key_length,
            }),
            "ARGON2ID" if tokens.len() == 6 => Ok(Self::Argon2id {
                memory_cost: tokens[1].parse().map_err(|_| unknown())?,
                time_cost: tokens[2].parse().map_err(|_| unknown())?,
                parallelism: tokens[3].parse().map_err(|_| unknown())?,
                salt_length: bits_to_bytes(tokens[4]).ok_or_else(unknown)?,
                key_length,
            }),
            _ => Err(unknown()),
        }
    }

    pub fn key_length(&self) -> usize {
        match self {
            Self::Pbkdf2 { key_length, .. } | Self::Argon2id { key_length, .. } => *key_length,
        }
    }

    pub fn salt_length(&self) -> usize {
        match self {
            Self::Pbkdf2 { salt_length, .. } | Self::Argon2id { salt_length, .. } => *salt_length,
        }
    }
}

/// AEAD cipher suites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSuite {
    /// AES-GCM, 96-bit IV, 128-bit tag
    AesGcm,
    /// ChaCha20-Poly1305, 96-bit nonce, 128-bit tag
    ChaCha20Poly1305,
}

impl CipherSuite {
    pub fn parse(name: &str) -> KeyStoreResult<Self> {
        match name.trim() {
            "AES_WITH_GCM_AND_NOPADDING_96_128" => Ok(Self::AesGcm),
            "CHACHA20_POLY1305_96_128" => Ok(Self::ChaCha20Poly1305),
            other => Err(unknown_value(CIPHER_PROPERTY, other)),
        }
    }

    /// Instantiate the cipher
    pub fn cipher(&self) -> Box<dyn AuthenticatedCipher> {
        match self {
            Self::AesGcm => Box::new(AesGcmCipher::new()),
            Self::ChaCha20Poly1305 => Box::new(ChaCha20Poly1305Cipher::new()),
        }
    }
}

/// Algorithm and size of stored secret keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKeySpec {
    pub algorithm: String,
    /// Key length in bytes
    pub key_length: usize,
}

impl SecretKeySpec {
    pub fn parse(name: &str) -> KeyStoreResult<Self> {
        let key_length = match name.trim() {
            "AES_128" => 16,
            "AES_256" => 32,
            other => return Err(unknown_value(SECRET_KEY_PROPERTY, other)),
        };
        Ok(Self {
            algorithm: "AES".to_string(),
            key_length,
        })
    }
}

/// Configuration of an extended key store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedKeyStorePolicy {
    pub store_kind: String,
    pub pbkdf: PbkdfParameters,
    pub secret_key: SecretKeySpec,
    pub cipher: CipherSuite,
    pub min_password_length: usize,
    pub max_password_length: usize,
}

impl Default for ExtendedKeyStorePolicy {
    fn default() -> Self {
        Self {
            store_kind: SOFTWARE_STORE_KIND.to_string(),
            pbkdf: PbkdfParameters::Pbkdf2 {
                iterations: 32_000,
                salt_length: 32,
                key_length: 16,
            },
            secret_key: SecretKeySpec {
                algorithm: "AES".to_string(),
                key_length: 16,
            },
            cipher: CipherSuite::AesGcm,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            max_password_length: DEFAULT_MAX_PASSWORD_LENGTH,
        }
    }
}

impl ExtendedKeyStorePolicy {
    /// Build a policy from a property map
    ///
    /// Properties that are missing or blank take their default value;
    /// unrelated properties are ignored.
    pub fn from_properties(properties: &HashMap<String, String>) -> KeyStoreResult<Self> {
        let value = |name: &str, default: &str| -> String {
            match properties.get(name).map(|v| v.trim()) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => default.to_string(),
            }
        };

        let store_kind = value(STORE_KIND_PROPERTY, SOFTWARE_STORE_KIND);
        if store_kind != SOFTWARE_STORE_KIND {
            return Err(unknown_value(STORE_KIND_PROPERTY, &store_kind));
        }

        let policy = Self {
            store_kind,
            pbkdf: PbkdfParameters::parse(&value(PBKDF_PROPERTY, DEFAULT_PBKDF))?,
            secret_key: SecretKeySpec::parse(&value(SECRET_KEY_PROPERTY, DEFAULT_SECRET_KEY))?,
            cipher: CipherSuite::parse(&value(CIPHER_PROPERTY, DEFAULT_CIPHER))?,
            min_password_length: parse_length(
                MIN_PASSWORD_LENGTH_PROPERTY,
                &value(MIN_PASSWORD_LENGTH_PROPERTY, &DEFAULT_MIN_PASSWORD_LENGTH.to_string()),
            )?,
            max_password_length: parse_length(
                MAX_PASSWORD_LENGTH_PROPERTY,
                &value(MAX_PASSWORD_LENGTH_PROPERTY, &DEFAULT_MAX_PASSWORD_LENGTH.to_string()),
            )?,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Build a policy from the text of a properties file
    pub fn from_properties_str(text: &str) -> KeyStoreResult<Self> {
        Self::from_properties(&parse_properties(text))
    }

    /// Check that the configured primitives fit together
    pub fn validate(&self) -> KeyStoreResult<()> {
        if self.min_password_length == 0 || self.min_password_length > self.max_password_length {
            return Err(KeyStoreError::configuration_error(
                MIN_PASSWORD_LENGTH_PROPERTY,
                &format!(
                    "password length range [{}, {}] is empty",
                    self.min_password_length, self.max_password_length
                ),
                error_codes::INCONSISTENT_POLICY,
            ));
        }

        if self.pbkdf.key_length() != self.secret_key.key_length {
            return Err(KeyStoreError::configuration_error(
                PBKDF_PROPERTY,
                &format!(
                    "derived key length {} does not match secret key length {}",
                    self.pbkdf.key_length(),
                    self.secret_key.key_length
                ),
                error_codes::INCONSISTENT_POLICY,
            ));
        }

        let cipher = self.cipher.cipher();
        if !cipher.supported_key_lengths().contains(&self.pbkdf.key_length()) {
            return Err(KeyStoreError::configuration_error(
                CIPHER_PROPERTY,
                &format!(
                    "{} does not accept {}-byte keys",
                    cipher.name(),
                    self.pbkdf.key_length()
                ),
                error_codes::INCONSISTENT_POLICY,
            ));
        }

        Ok(())
    }

    /// Instantiate the configured key derivation engine
    pub fn key_derivation_engine(&self) -> KeyStoreResult<Box<dyn KeyDerivationEngine>> {
        Ok(match self.pbkdf {
            PbkdfParameters::Pbkdf2 {
                iterations,
                salt_length,
                key_length,
            } => Box::new(Pbkdf2Deriver::new(iterations, salt_length, key_length)?),
            PbkdfParameters::Argon2id {
                memory_cost,
                time_cost,
                parallelism,
                salt_length,
                key_length,
            } => Box::new(Argon2Deriver::new(
                memory_cost,
                time_cost,
                parallelism,
                salt_length,
                key_length,
            )?),
        })
    }

    /// Instantiate the configured AEAD cipher
    pub fn authenticated_cipher(&self) -> Box<dyn AuthenticatedCipher> {
        self.cipher.cipher()
    }

    /// Instantiate the provider of platform credential stores
    pub fn credential_store_provider(&self) -> KeyStoreResult<Box<dyn CredentialStoreProvider>> {
        match self.store_kind.as_str() {
            SOFTWARE_STORE_KIND => Ok(Box::new(SoftwareCredentialStoreProvider::new())),
            other => Err(unknown_value(STORE_KIND_PROPERTY, other)),
        }
    }

    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy::new(self.min_password_length, self.max_password_length)
    }
}

/// Parse Java-style properties text (`key=value` or `key: value` lines)
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let split = line.find(|c: char| c == '=' || c == ':')?;
            let (key, value) = line.split_at(split);
            Some((key.trim().to_string(), value[1..].trim().to_string()))
        })
        .collect()
}

fn bits_to_bytes(bits: &str) -> Option<usize> {
    let bits: usize = bits.parse().ok()?;
    if bits == 0 || bits % 8 != 0 {
        return None;
    }
    Some(bits / 8)
}

fn parse_length(property: &str, value: &str) -> KeyStoreResult<usize> {
    value.parse().map_err(|_| unknown_value(property, value))
}

fn unknown_value(property: &str, value: &str) -> KeyStoreError {
    KeyStoreError::configuration_error(
        property,
        &format!("illegal property value '{}'", value),
        error_codes::UNKNOWN_PROPERTY_VALUE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = ExtendedKeyStorePolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy, ExtendedKeyStorePolicy::from_properties(&HashMap::new()).unwrap());
        assert_eq!(policy.pbkdf.salt_length(), 32);
        assert_eq!(policy.pbkdf.key_length(), 16);
    }

    #[test]
    fn test_pbkdf_names() {
        assert_eq!(
            PbkdfParameters::parse("PBKDF2_32000_SHA256_256_BC_KL128").unwrap(),
            PbkdfParameters::Pbkdf2 {
                iterations: 32_000,
                salt_length: 32,
                key_length: 16
            }
        );
        assert_eq!(
            PbkdfParameters::parse("PBKDF2_1_SHA256_128_KL256").unwrap(),
            PbkdfParameters::Pbkdf2 {
                iterations: 1,
                salt_length: 16,
                key_length: 32
            }
        );
        assert_eq!(
            PbkdfParameters::parse("ARGON2ID_65536_3_4_256_KL128").unwrap(),
            PbkdfParameters::Argon2id {
                memory_cost: 65536,
                time_cost: 3,
                parallelism: 4,
                salt_length: 32,
                key_length: 16
            }
        );

        for bad in [
            "",
            "PBKDF2",
            "PBKDF2_32000_SHA1_256_KL128",
            "PBKDF2_x_SHA256_256_KL128",
            "PBKDF2_1_SHA256_255_KL128",
            "SCRYPT_1_2_3_KL128",
        ] {
            let err = PbkdfParameters::parse(bad).unwrap_err();
            assert_eq!(err.error_code(), error_codes::UNKNOWN_PROPERTY_VALUE, "{}", bad);
        }
    }

    #[test]
    fn test_properties_text() {
        let text = "\
# extended key store
extended.keystore.p12=SOFTWARE_V1
primitives.pbkdfderivation.p12 = PBKDF2_1000_SHA256_256_KL256
! secret keys
symmetric.encryptionsecretkey: AES_256
symmetric.cipher=CHACHA20_POLY1305_96_128
primitives.pbkdfderivation.minpasswordlength=
primitives.pbkdfderivation.maxpasswordlength=64
unrelated.property=whatever
";
        let policy = ExtendedKeyStorePolicy::from_properties_str(text).unwrap();
        assert_eq!(policy.cipher, CipherSuite::ChaCha20Poly1305);
        assert_eq!(policy.secret_key.key_length, 32);
        assert_eq!(policy.min_password_length, 16);
        assert_eq!(policy.max_password_length, 64);
        assert_eq!(policy.key_derivation_engine().unwrap().key_length(), 32);
        assert_eq!(policy.password_policy(), PasswordPolicy::new(16, 64));
    }

    #[test]
    fn test_unknown_values() {
        let mut props = HashMap::new();
        props.insert(CIPHER_PROPERTY.to_string(), "DES_CBC".to_string());
        let err = ExtendedKeyStorePolicy::from_properties(&props).unwrap_err();
        assert_eq!(err.error_code(), error_codes::UNKNOWN_PROPERTY_VALUE);

        let mut props = HashMap::new();
        props.insert(STORE_KIND_PROPERTY.to_string(), "PKCS12_SUN_JSSE".to_string());
        assert!(ExtendedKeyStorePolicy::from_properties(&props).is_err());

        let mut props = HashMap::new();
        props.insert(MAX_PASSWORD_LENGTH_PROPERTY.to_string(), "lots".to_string());
        assert!(ExtendedKeyStorePolicy::from_properties(&props).is_err());
    }

    #[test]
    fn test_inconsistent_policies() {
        // Derived key shorter than the secret key
        let mut props = HashMap::new();
        props.insert(SECRET_KEY_PROPERTY.to_string(), "AES_256".to_string());
        let err = ExtendedKeyStorePolicy::from_properties(&props).unwrap_err();
        assert_eq!(err.error_code(), error_codes::INCONSISTENT_POLICY);

        // ChaCha20-Poly1305 needs 32-byte keys
        let mut props = HashMap::new();
        props.insert(CIPHER_PROPERTY.to_string(), "CHACHA20_POLY1305_96_128".to_string());
        let err = ExtendedKeyStorePolicy::from_properties(&props).unwrap_err();
        assert_eq!(err.error_code(), error_codes::INCONSISTENT_POLICY);

        let policy = ExtendedKeyStorePolicy {
            min_password_length: 20,
            max_password_length: 10,
            ..ExtendedKeyStorePolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_collaborators() {
        let policy = ExtendedKeyStorePolicy::default();
        assert_eq!(policy.credential_store_provider().unwrap().kind(), SOFTWARE_STORE_KIND);
        assert_eq!(policy.authenticated_cipher().name(), "AES/GCM/NoPadding");
        assert_eq!(policy.key_derivation_engine().unwrap().salt_length(), 32);
    }
}
