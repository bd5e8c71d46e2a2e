use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::secure_memory::SecureBytes;

/// A password held by the key store, wiped on drop
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    pub fn new(password: &str) -> Self {
        Self(password.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Password {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Password {
    fn from(password: &str) -> Self {
        Self::new(password)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// The logical slot whose password binding the cache tracks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheOwner {
    /// The container password used by `store` / `to_json`
    Store,
    PrivateKey(String),
    SecretKey(String),
    ElGamalPrivateKey(String),
}

struct CacheRecord {
    key: SecureBytes,
    count: usize,
}

/// Reference-counted cache of derived keys
///
/// Each owner is bound to at most one password. A derived key stays cached
/// while at least one owner is bound to its password and is dropped (and
/// wiped) when the last one lets go.
///
/// The cache has no interior locking; one instance must not be used from
/// several threads at once.
#[derive(Default)]
pub struct DerivedKeyCache {
    owners: HashMap<CacheOwner, Password>,
    records: HashMap<Password, CacheRecord>,
}

impl DerivedKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached key for `password`, if any owner holds it
    pub fn get(&self, password: &str) -> Option<&SecureBytes> {
        self.records.get(password).map(|record| &record.key)
    }

    /// Bind `owner` to `password`
    ///
    /// Re-binding an owner to the password it already holds changes nothing.
    /// Otherwise the previous binding is released first. If the password is
    /// already cached the existing bytes are kept and `key` is ignored.
    pub fn put(&mut self, owner: CacheOwner, password: &str, key: &SecureBytes) {
        if self
            .owners
            .get(&owner)
            .map_or(false, |bound| bound.as_str() == password)
        {
            return;
        }

        if let Some(previous) = self.owners.remove(&owner) {
            self.release(&previous);
        }

        match self.records.get_mut(password) {
            Some(record) => record.count += 1,
            None => {
                self.records.insert(
                    Password::new(password),
                    CacheRecord {
                        key: key.clone(),
                        count: 1,
                    },
                );
            }
        }
        self.owners.insert(owner, Password::new(password));
    }

    /// Release whatever password `owner` is bound to
    pub fn remove(&mut self, owner: &CacheOwner) {
        if let Some(previous) = self.owners.remove(owner) {
            self.release(&previous);
        }
    }

    pub fn put_for_store(&mut self, password: &str, key: &SecureBytes) {
        self.put(CacheOwner::Store, password, key);
    }

    pub fn put_for_private_key(&mut self, alias: &str, password: &str, key: &SecureBytes) {
        self.put(CacheOwner::PrivateKey(alias.to_string()), password, key);
    }

    pub fn put_for_secret_key(&mut self, alias: &str, password: &str, key: &SecureBytes) {
        self.put(CacheOwner::SecretKey(alias.to_string()), password, key);
    }

    pub fn put_for_elgamal_private_key(&mut self, alias: &str, password: &str, key: &SecureBytes) {
        self.put(CacheOwner::ElGamalPrivateKey(alias.to_string()), password, key);
    }

    pub fn remove_for_private_key(&mut self, alias: &str) {
        self.remove(&CacheOwner::PrivateKey(alias.to_string()));
    }

    pub fn remove_for_secret_key(&mut self, alias: &str) {
        self.remove(&CacheOwner::SecretKey(alias.to_string()));
    }

    pub fn remove_for_elgamal_private_key(&mut self, alias: &str) {
        self.remove(&CacheOwner::ElGamalPrivateKey(alias.to_string()));
    }

    /// Number of owners currently bound to `password`
    pub fn reference_count(&self, password: &str) -> usize {
        self.records.get(password).map_or(0, |record| record.count)
    }

    /// Number of distinct cached passwords
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn release(&mut self, password: &Password) {
        let evict = match self.records.get_mut(password.as_str()) {
            Some(record) => {
                record.count -= 1;
                record.count == 0
            }
            None => false,
        };
        if evict {
            self.records.remove(password.as_str());
        }
    }
}

impl fmt::Debug for DerivedKeyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeyCache")
            .field("owners", &self.owners.len())
            .field("passwords", &self.records.len())
            .finish()
    }
}
