/*!
 * Extended Key Store
 *
 * A password-protected store for three kinds of key material:
 *
 * - secret (symmetric) keys, sealed with an AEAD cipher
 * - ElGamal private keys, sealed the same way
 * - private keys with certificate chains, kept in a platform credential store
 *
 * Every entry is protected by a key derived from its own password with a
 * slow password-based KDF. Derived keys are cached per password and shared
 * between entries for as long as any of them still uses that password.
 *
 * Stores persist as a ZIP container or as an equivalent JSON document.
 */

/// Password-based key derivation
pub mod derivation;

/// ElGamal private key types
pub mod elgamal;

/// Common error types for the key store
pub mod error;

/// The extended key store, its cache and its persisted forms
pub mod key_management;

/// Secret key, private key and certificate types
pub mod keys;

/// Platform credential stores holding private keys and certificate chains
pub mod platform;

/// Policy-driven configuration
pub mod policy;

/// Secure memory handling utilities
pub mod secure_memory;

/// Authenticated symmetric ciphers
pub mod symmetric;

pub use error::{KeyStoreError, KeyStoreResult};
pub use key_management::{ExtendedKeyStore, ExtendedKeyStoreGenerator};
pub use policy::ExtendedKeyStorePolicy;

/// The types most callers need to create, fill and persist a store
pub mod prelude {
    pub use crate::derivation::{Argon2Deriver, KeyDerivationEngine, Pbkdf2Deriver};
    pub use crate::elgamal::{ElGamalPrivateKey, ZpSubgroup};
    pub use crate::key_management::{derive_password, ExtendedKeyStore, ExtendedKeyStoreGenerator};
    pub use crate::keys::{Certificate, PrivateKey, SecretKey};
    pub use crate::platform::SoftwareCredentialStoreProvider;
    pub use crate::policy::{ExtendedKeyStorePolicy, SecretKeySpec};
    pub use crate::secure_memory::SecureBytes;
    pub use crate::symmetric::{AesGcmCipher, AuthenticatedCipher, ChaCha20Poly1305Cipher};
    pub use crate::{KeyStoreError, KeyStoreResult};
}
