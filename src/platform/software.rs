use aes_gcm::Aes256Gcm;
use hkdf::Hkdf;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{CredentialStoreProvider, PlatformCredentialStore};
use crate::derivation::random_bytes;
use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::keys::{Certificate, PrivateKey, SecretKey};
use crate::secure_memory::SecureBytes;
use crate::symmetric::{open, seal};

/// Version of the serialized store format
const FORMAT_VERSION: u8 = 1;

/// Magic prefix of a serialized store
const MAGIC: &[u8; 4] = b"XKS1";

const SALT_LENGTH: usize = 16;
const WRAPPING_KEY_LENGTH: usize = 32;

const STORE_INFO: &[u8] = b"xkeystore/software-store";
const ENTRY_INFO: &[u8] = b"xkeystore/software-entry";

const ALGORITHM: &str = "AES-256-GCM";

/// Kind identifier used in configuration
pub const SOFTWARE_STORE_KIND: &str = "SOFTWARE_V1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum EntryKind {
    PrivateKey,
    Symmetric,
}

/// A single sealed entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    alias: String,
    kind: EntryKind,
    /// Algorithm of the protected key
    algorithm: String,
    /// Salt for the entry wrapping key
    salt: Vec<u8>,
    /// Encoded key, sealed under the entry password
    sealed_key: Vec<u8>,
    chain: Vec<Certificate>,
    /// Created timestamp (seconds since epoch)
    created_at: i64,
}

/// Serialized store contents, before sealing
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u8,
    entries: Vec<StoredEntry>,
}

/// Software implementation of [`PlatformCredentialStore`]
///
/// Every entry is sealed with AES-256-GCM under a key expanded with
/// HKDF-SHA256 from the entry password and a per-entry salt. The serialized
/// form is `MAGIC ‖ salt ‖ AES-256-GCM(bincode(entries))`, keyed the same
/// way from the store password.
#[derive(Debug, Default, Clone)]
pub struct SoftwareCredentialStore {
    entries: Vec<StoredEntry>,
}

impl SoftwareCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a symmetric entry
    ///
    /// The extended key store never writes these; stores produced by older
    /// tooling may still contain them.
    pub fn set_symmetric_entry(
        &mut self,
        alias: &str,
        key: &SecretKey,
        password: &str,
    ) -> KeyStoreResult<()> {
        let entry = seal_entry(
            alias,
            EntryKind::Symmetric,
            key.algorithm(),
            key.encoded(),
            password,
            Vec::new(),
        )?;
        self.upsert(entry);
        Ok(())
    }

    /// Number of entries in the store
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, alias: &str) -> Option<&StoredEntry> {
        self.entries.iter().find(|e| e.alias == alias)
    }

    fn upsert(&mut self, entry: StoredEntry) {
        match self.entries.iter_mut().find(|e| e.alias == entry.alias) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

fn wrapping_key(password: &str, salt: &[u8], info: &[u8]) -> KeyStoreResult<SecureBytes> {
    let hk = Hkdf::<Sha256>::new(Some(salt), password.as_bytes());
    let mut okm = SecureBytes::from(vec![0u8; WRAPPING_KEY_LENGTH]);
    hk.expand(info, okm.as_bytes_mut()).map_err(|e| {
        KeyStoreError::derivation_error(
            "hkdf_expand",
            &e.to_string(),
            error_codes::DERIVATION_FAILED,
        )
    })?;
    Ok(okm)
}

fn seal_entry(
    alias: &str,
    kind: EntryKind,
    algorithm: &str,
    encoded: &[u8],
    password: &str,
    chain: Vec<Certificate>,
) -> KeyStoreResult<StoredEntry> {
    let salt = random_bytes(SALT_LENGTH)?;
    let key = wrapping_key(password, &salt, ENTRY_INFO)?;
    let sealed_key = seal::<Aes256Gcm>(key.as_bytes(), encoded, ALGORITHM)?;

    Ok(StoredEntry {
        alias: alias.to_string(),
        kind,
        algorithm: algorithm.to_string(),
        salt,
        sealed_key,
        chain,
        created_at: chrono::Utc::now().timestamp(),
    })
}

impl PlatformCredentialStore for SoftwareCredentialStore {
    fn load(&mut self, data: &[u8], password: &str) -> KeyStoreResult<()> {
        let header = MAGIC.len() + SALT_LENGTH;
        if data.len() < header || data[..MAGIC.len()] != MAGIC[..] {
            return Err(KeyStoreError::access_error(
                "load",
                "data is not a serialized software credential store",
                None,
                error_codes::STORE_LOAD_FAILED,
            ));
        }

        let salt = &data[MAGIC.len()..header];
        let key = wrapping_key(password, salt, STORE_INFO)?;
        let plaintext = open::<Aes256Gcm>(key.as_bytes(), &data[header..], ALGORITHM).map_err(|_| {
            KeyStoreError::access_error(
                "load",
                "store password is incorrect or the store data is corrupted",
                None,
                error_codes::STORE_LOAD_FAILED,
            )
        })?;

        let file: StoreFile = bincode::deserialize(plaintext.as_bytes()).map_err(|e| {
            KeyStoreError::access_error(
                "load",
                &format!("failed to decode store contents: {}", e),
                None,
                error_codes::STORE_LOAD_FAILED,
            )
        })?;
        if file.version != FORMAT_VERSION {
            return Err(KeyStoreError::access_error(
                "load",
                &format!("unsupported store format version {}", file.version),
                None,
                error_codes::STORE_LOAD_FAILED,
            ));
        }

        debug!("Loaded software credential store with {} entries", file.entries.len());
        self.entries = file.entries;
        Ok(())
    }

    fn serialize(&self, password: &str) -> KeyStoreResult<Vec<u8>> {
        let file = StoreFile {
            version: FORMAT_VERSION,
            entries: self.entries.clone(),
        };
        let encoded = SecureBytes::from(bincode::serialize(&file).map_err(|e| {
            KeyStoreError::access_error(
                "serialize",
                &e.to_string(),
                None,
                error_codes::STORE_SERIALIZATION_FAILED,
            )
        })?);

        let salt = random_bytes(SALT_LENGTH)?;
        let key = wrapping_key(password, &salt, STORE_INFO)?;
        let sealed = seal::<Aes256Gcm>(key.as_bytes(), encoded.as_bytes(), ALGORITHM)?;

        let mut output = Vec::with_capacity(MAGIC.len() + SALT_LENGTH + sealed.len());
        output.extend_from_slice(MAGIC);
        output.extend_from_slice(&salt);
        output.extend_from_slice(&sealed);
        Ok(output)
    }

    fn get_key(&self, alias: &str, password: &str) -> KeyStoreResult<Option<PrivateKey>> {
        let entry = match self.find(alias) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        if entry.kind != EntryKind::PrivateKey {
            return Err(KeyStoreError::access_error(
                "get_key",
                "entry is not a private key entry",
                Some(alias),
                error_codes::ENTRY_RETRIEVAL_FAILED,
            ));
        }

        let key = wrapping_key(password, &entry.salt, ENTRY_INFO)?;
        let encoded = open::<Aes256Gcm>(key.as_bytes(), &entry.sealed_key, ALGORITHM).map_err(|_| {
            KeyStoreError::access_error(
                "get_key",
                "cannot recover key: wrong password or corrupted entry",
                Some(alias),
                error_codes::ENTRY_RETRIEVAL_FAILED,
            )
        })?;
        Ok(Some(PrivateKey::new(&entry.algorithm, encoded.as_bytes())))
    }

    fn get_certificate_chain(&self, alias: &str) -> KeyStoreResult<Option<Vec<Certificate>>> {
        Ok(self
            .find(alias)
            .filter(|e| e.kind == EntryKind::PrivateKey)
            .map(|e| e.chain.clone()))
    }

    fn set_key_entry(
        &mut self,
        alias: &str,
        key: &PrivateKey,
        password: &str,
        chain: &[Certificate],
    ) -> KeyStoreResult<()> {
        let entry = seal_entry(
            alias,
            EntryKind::PrivateKey,
            key.algorithm(),
            key.encoded(),
            password,
            chain.to_vec(),
        )
        .map_err(|e| {
            KeyStoreError::access_error(
                "set_key_entry",
                &e.to_string(),
                Some(alias),
                error_codes::ENTRY_STORAGE_FAILED,
            )
        })?;
        self.upsert(entry);
        Ok(())
    }

    fn aliases(&self) -> KeyStoreResult<Vec<String>> {
        Ok(self.entries.iter().map(|e| e.alias.clone()).collect())
    }

    fn is_symmetric_entry(&self, alias: &str) -> KeyStoreResult<bool> {
        Ok(self
            .find(alias)
            .map(|e| e.kind == EntryKind::Symmetric)
            .unwrap_or(false))
    }
}

/// Provider of empty [`SoftwareCredentialStore`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareCredentialStoreProvider;

impl SoftwareCredentialStoreProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialStoreProvider for SoftwareCredentialStoreProvider {
    fn create(&self) -> KeyStoreResult<Box<dyn PlatformCredentialStore>> {
        Ok(Box::new(SoftwareCredentialStore::new()))
    }

    fn kind(&self) -> &str {
        SOFTWARE_STORE_KIND
    }
}
