/*!
 * Platform credential stores
 *
 * Private-key entries (a private key together with its certificate chain)
 * are not encrypted by the extended key store itself. They are handed to a
 * [`PlatformCredentialStore`], a password-protected container whose
 * serialized form the extended key store treats as opaque bytes.
 */

mod software;

pub use software::{SoftwareCredentialStore, SoftwareCredentialStoreProvider, SOFTWARE_STORE_KIND};

use crate::error::KeyStoreResult;
use crate::keys::{Certificate, PrivateKey};

#[cfg(test)]
mod tests;

/// A password-protected store of private-key entries
pub trait PlatformCredentialStore: Send {
    /// Replace the contents of this store with a previously serialized one
    ///
    /// # Errors
    ///
    /// Fails with a store access error when `password` does not open `data`.
    fn load(&mut self, data: &[u8], password: &str) -> KeyStoreResult<()>;

    /// Serialize the whole store, protected by `password`
    fn serialize(&self, password: &str) -> KeyStoreResult<Vec<u8>>;

    /// Recover the private key stored under `alias`
    ///
    /// Returns `Ok(None)` if there is no such entry.
    fn get_key(&self, alias: &str, password: &str) -> KeyStoreResult<Option<PrivateKey>>;

    /// Certificate chain stored with `alias`, if any
    fn get_certificate_chain(&self, alias: &str) -> KeyStoreResult<Option<Vec<Certificate>>>;

    /// Add or replace a private-key entry
    fn set_key_entry(
        &mut self,
        alias: &str,
        key: &PrivateKey,
        password: &str,
        chain: &[Certificate],
    ) -> KeyStoreResult<()>;

    /// All aliases held by the store
    fn aliases(&self) -> KeyStoreResult<Vec<String>>;

    /// Whether `alias` names a symmetric (secret key) entry
    fn is_symmetric_entry(&self, alias: &str) -> KeyStoreResult<bool>;
}

/// Creates empty platform credential stores
pub trait CredentialStoreProvider: Send + Sync {
    /// A new, empty store
    fn create(&self) -> KeyStoreResult<Box<dyn PlatformCredentialStore>>;

    /// Identifier of the store kind, as used in configuration
    fn kind(&self) -> &str;
}
