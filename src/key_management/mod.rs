/*!
 * Password-derived extended key store
 *
 * This module implements the extended key store, its derived-key cache and
 * its persisted forms. Keys are derived from entry passwords with a slow
 * password-based KDF; the cache keeps each derived key for as long as some
 * entry (or the container itself) still depends on its password.
 */

mod cache;
pub mod container;
mod generator;
mod password;
mod storage;
mod validation;


pub use cache::{CacheOwner, DerivedKeyCache, Password};
pub use container::ContainerContents;
pub use generator::ExtendedKeyStoreGenerator;
pub use password::{derive_password, PRINTABLE_RADIX};
pub use storage::ExtendedKeyStore;
pub use validation::{
    validate_alias, validate_certificate_chain, validate_key_material, PasswordPolicy,
    MAX_ALIAS_LENGTH, MIN_ALIAS_LENGTH,
};
