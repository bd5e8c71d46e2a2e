use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use log::{debug, warn};
use subtle::ConstantTimeEq;

use super::cache::DerivedKeyCache;
use super::container::{self, ContainerContents};
use super::password::derive_password;
use super::validation::{
    validate_alias, validate_certificate_chain, validate_key_material, validate_not_blank,
    PasswordPolicy,
};
use crate::derivation::KeyDerivationEngine;
use crate::elgamal::ElGamalPrivateKey;
use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::keys::{Certificate, PrivateKey, SecretKey};
use crate::platform::{CredentialStoreProvider, PlatformCredentialStore};
use crate::policy::SecretKeySpec;
use crate::secure_memory::SecureBytes;
use crate::symmetric::AuthenticatedCipher;

const PRIVATE_KEY_ALIAS: &str = "Private key alias";
const SECRET_KEY_ALIAS: &str = "Secret key alias";
const ELGAMAL_PRIVATE_KEY_ALIAS: &str = "ElGamal private key alias";

/// Collaborators shared by every store a generator produces
#[derive(Clone)]
pub(crate) struct StoreSettings {
    pub(crate) deriver: Arc<dyn KeyDerivationEngine>,
    pub(crate) cipher: Arc<dyn AuthenticatedCipher>,
    pub(crate) provider: Arc<dyn CredentialStoreProvider>,
    pub(crate) secret_key: SecretKeySpec,
    pub(crate) passwords: PasswordPolicy,
}

/// A password-protected store of private keys, secret keys and ElGamal
/// private keys
///
/// Secret keys and ElGamal keys are sealed here with the configured AEAD
/// cipher under a key derived from the entry password. Private keys and
/// their certificate chains live in the platform credential store, under a
/// printable form of the derived key.
///
/// Instances come from an
/// [`ExtendedKeyStoreGenerator`](super::ExtendedKeyStoreGenerator). There is
/// no internal locking: callers sharing one store between threads must
/// serialize access themselves.
pub struct ExtendedKeyStore {
    salt: Vec<u8>,
    platform: Box<dyn PlatformCredentialStore>,
    secret_map: HashMap<String, Vec<u8>>,
    elgamal_map: HashMap<String, Vec<u8>>,
    private_aliases: Vec<String>,
    secret_aliases: Vec<String>,
    elgamal_aliases: Vec<String>,
    cache: DerivedKeyCache,
    settings: StoreSettings,
}

impl ExtendedKeyStore {
    /// An empty store with a fresh random salt
    pub(crate) fn create(settings: StoreSettings) -> KeyStoreResult<Self> {
        let salt = settings.deriver.generate_random_salt()?;
        let platform = settings.provider.create().map_err(|e| {
            access_failure("create", e, None, error_codes::STORE_CREATION_FAILED)
        })?;

        debug!("Created empty extended key store");
        Ok(Self::assemble(salt, platform, settings))
    }

    /// Rebuild a store from parsed container contents
    ///
    /// A serialized platform store is opened with the printable form of the
    /// key derived from `password`.
    pub(crate) fn from_contents(
        settings: StoreSettings,
        contents: ContainerContents,
        password: &str,
    ) -> KeyStoreResult<Self> {
        validate_not_blank(password, "Key store password", error_codes::INVALID_PASSWORD)?;

        container::check_salt_length(&contents.salt, settings.deriver.salt_length())?;

        let mut platform = settings
            .provider
            .create()
            .map_err(|e| access_failure("load", e, None, error_codes::STORE_CREATION_FAILED))?;
        let mut store_key = None;
        if let Some(bytes) = &contents.store {
            let key = settings.deriver.derive_key(password, &contents.salt)?;
            platform
                .load(bytes, &derive_password(key.as_bytes()))
                .map_err(|e| access_failure("load", e, None, error_codes::STORE_LOAD_FAILED))?;
            store_key = Some(key);
        }

        let mut store = Self::assemble(contents.salt, platform, settings);
        for (alias, sealed) in contents.secrets {
            push_alias(&mut store.secret_aliases, &alias);
            store.secret_map.insert(alias, sealed);
        }
        for (alias, sealed) in contents.elgamal_keys {
            push_alias(&mut store.elgamal_aliases, &alias);
            store.elgamal_map.insert(alias, sealed);
        }

        let platform_aliases = store
            .platform
            .aliases()
            .map_err(|e| access_failure("load", e, None, error_codes::STORE_LOAD_FAILED))?;
        for alias in platform_aliases {
            let symmetric = store
                .platform
                .is_symmetric_entry(&alias)
                .map_err(|e| {
                    access_failure("load", e, Some(alias.as_str()), error_codes::STORE_LOAD_FAILED)
                })?;
            if symmetric {
                warn!("Platform store holds legacy symmetric entry '{}'", alias);
                push_alias(&mut store.secret_aliases, &alias);
            } else {
                push_alias(&mut store.private_aliases, &alias);
            }
        }

        if let Some(key) = store_key {
            store.cache.put_for_store(password, &key);
        }

        debug!(
            "Loaded extended key store: {} private keys, {} secret keys, {} ElGamal keys",
            store.private_aliases.len(),
            store.secret_aliases.len(),
            store.elgamal_aliases.len()
        );
        Ok(store)
    }

    fn assemble(
        salt: Vec<u8>,
        platform: Box<dyn PlatformCredentialStore>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            salt,
            platform,
            secret_map: HashMap::new(),
            elgamal_map: HashMap::new(),
            private_aliases: Vec::new(),
            secret_aliases: Vec::new(),
            elgamal_aliases: Vec::new(),
            cache: DerivedKeyCache::new(),
            settings,
        }
    }

    /// Derive (or fetch from the cache) the key for `password`
    fn derive_key(&self, password: &str) -> KeyStoreResult<SecureBytes> {
        match self.cache.get(password) {
            Some(key) => Ok(key.clone()),
            None => self.settings.deriver.derive_key(password, &self.salt),
        }
    }

    fn open_entry(
        &self,
        operation: &str,
        alias: &str,
        sealed: &[u8],
        key: &SecureBytes,
    ) -> KeyStoreResult<SecureBytes> {
        self.settings
            .cipher
            .decrypt(key.as_bytes(), sealed)
            .map_err(|e| {
                if e.is_tamper() {
                    warn!("{}: authentication failed for '{}'", operation, alias);
                }
                e
            })
    }

    /// A decrypted entry must start with its own alias
    fn check_alias_prefix(
        operation: &str,
        alias: &str,
        plaintext: &SecureBytes,
    ) -> KeyStoreResult<()> {
        let prefix_matches = plaintext
            .as_bytes()
            .get(..alias.len())
            .map_or(false, |prefix| bool::from(prefix.ct_eq(alias.as_bytes())));
        if !prefix_matches {
            warn!("{}: decrypted alias mismatch for '{}'", operation, alias);
            return Err(KeyStoreError::tamper_error(
                operation,
                "Data was tampered",
                error_codes::DECRYPTED_ALIAS_MISMATCH,
            ));
        }
        Ok(())
    }

    fn seal_entry(&self, alias: &str, payload: &[u8], key: &SecureBytes) -> KeyStoreResult<Vec<u8>> {
        let mut plaintext = SecureBytes::with_capacity(alias.len() + payload.len());
        plaintext.extend_from_slice(alias.as_bytes());
        plaintext.extend_from_slice(payload);
        self.settings.cipher.encrypt(key.as_bytes(), plaintext.as_bytes())
    }

    /// Secret key stored under `alias`
    ///
    /// Returns `Ok(None)` when there is no such entry.
    ///
    /// # Errors
    ///
    /// A wrong password, or a sealed entry that does not decrypt to exactly
    /// the alias followed by a key of the configured length, is reported as a
    /// [`KeyStoreError::TamperError`].
    pub fn get_secret_key_entry(&mut self, alias: &str, password: &str) -> KeyStoreResult<Option<SecretKey>> {
        validate_not_blank(alias, SECRET_KEY_ALIAS, error_codes::INVALID_ALIAS)?;
        validate_not_blank(password, "Secret key password", error_codes::INVALID_PASSWORD)?;

        let sealed = match self.secret_map.get(alias) {
            Some(sealed) if !sealed.is_empty() => sealed,
            _ => return Ok(None),
        };

        let key = self.derive_key(password)?;
        let plaintext = self.open_entry("get_secret_key_entry", alias, sealed, &key)?;

        let expected = alias.len() + self.settings.secret_key.key_length;
        if plaintext.len() != expected {
            warn!("get_secret_key_entry: decrypted length mismatch for '{}'", alias);
            return Err(KeyStoreError::tamper_error(
                "get_secret_key_entry",
                "Data was tampered",
                error_codes::DECRYPTED_LENGTH_MISMATCH,
            ));
        }
        Self::check_alias_prefix("get_secret_key_entry", alias, &plaintext)?;

        self.cache.put_for_secret_key(alias, password, &key);
        Ok(Some(SecretKey::new(
            &self.settings.secret_key.algorithm,
            &plaintext.as_bytes()[alias.len()..],
        )))
    }

    /// Private key stored under `alias` in the platform credential store
    pub fn get_private_key_entry(&mut self, alias: &str, password: &str) -> KeyStoreResult<Option<PrivateKey>> {
        validate_not_blank(alias, PRIVATE_KEY_ALIAS, error_codes::INVALID_ALIAS)?;
        validate_not_blank(password, "Private key password", error_codes::INVALID_PASSWORD)?;

        let key = self.derive_key(password)?;
        let printable = derive_password(key.as_bytes());
        let private_key = self.platform.get_key(alias, &printable).map_err(|e| {
            access_failure(
                "get_private_key_entry",
                e,
                Some(alias),
                error_codes::ENTRY_RETRIEVAL_FAILED,
            )
        })?;

        if private_key.is_some() {
            self.cache.put_for_private_key(alias, password, &key);
        }
        Ok(private_key)
    }

    /// ElGamal private key stored under `alias`
    ///
    /// Returns `Ok(None)` when there is no such entry.
    pub fn get_elgamal_private_key_entry(
        &mut self,
        alias: &str,
        password: &str,
    ) -> KeyStoreResult<Option<ElGamalPrivateKey>> {
        validate_not_blank(alias, ELGAMAL_PRIVATE_KEY_ALIAS, error_codes::INVALID_ALIAS)?;
        validate_not_blank(password, "ElGamal private key password", error_codes::INVALID_PASSWORD)?;

        let sealed = match self.elgamal_map.get(alias) {
            Some(sealed) if !sealed.is_empty() => sealed,
            _ => return Ok(None),
        };

        let key = self.derive_key(password)?;
        let plaintext = self.open_entry("get_elgamal_private_key_entry", alias, sealed, &key)?;
        Self::check_alias_prefix("get_elgamal_private_key_entry", alias, &plaintext)?;

        let json = std::str::from_utf8(&plaintext.as_bytes()[alias.len()..]).map_err(|_| {
            KeyStoreError::format_error(
                "ElGamal private key is not valid UTF-8",
                error_codes::MALFORMED_JSON,
            )
        })?;
        let private_key = ElGamalPrivateKey::from_json(json)?;

        self.cache.put_for_elgamal_private_key(alias, password, &key);
        Ok(Some(private_key))
    }

    /// Certificate chain stored with a private key
    pub fn get_certificate_chain(&self, alias: &str) -> KeyStoreResult<Option<Vec<Certificate>>> {
        validate_not_blank(alias, "Certificate chain alias", error_codes::INVALID_ALIAS)?;

        self.platform.get_certificate_chain(alias).map_err(|e| {
            access_failure(
                "get_certificate_chain",
                e,
                Some(alias),
                error_codes::ENTRY_RETRIEVAL_FAILED,
            )
        })
    }

    /// Store a private key and its certificate chain (leaf first)
    pub fn set_private_key_entry(
        &mut self,
        alias: &str,
        key: &PrivateKey,
        password: &str,
        chain: &[Certificate],
    ) -> KeyStoreResult<()> {
        validate_alias(alias, PRIVATE_KEY_ALIAS)?;
        validate_key_material(key.encoded(), "Private key content")?;
        self.settings.passwords.check(password, "Private key password")?;
        validate_certificate_chain(chain)?;

        let derived = self.derive_key(password)?;
        let printable = derive_password(derived.as_bytes());
        self.platform
            .set_key_entry(alias, key, &printable, chain)
            .map_err(|e| {
                access_failure(
                    "set_private_key_entry",
                    e,
                    Some(alias),
                    error_codes::ENTRY_STORAGE_FAILED,
                )
            })?;

        push_alias(&mut self.private_aliases, alias);
        self.cache.put_for_private_key(alias, password, &derived);
        debug!("Stored private key entry '{}' ({} certificates)", alias, chain.len());
        Ok(())
    }

    /// Seal and store a secret key
    pub fn set_secret_key_entry(
        &mut self,
        alias: &str,
        secret_key: &SecretKey,
        password: &str,
    ) -> KeyStoreResult<()> {
        validate_alias(alias, SECRET_KEY_ALIAS)?;
        validate_key_material(secret_key.encoded(), "Secret key content")?;
        let expected = self.settings.secret_key.key_length;
        if secret_key.encoded().len() != expected {
            return Err(KeyStoreError::validation_error(
                "Secret key content",
                &format!("{} bytes", expected),
                &format!("{} bytes", secret_key.encoded().len()),
                error_codes::INVALID_KEY,
            ));
        }
        self.settings.passwords.check(password, "Secret key password")?;

        let derived = self.derive_key(password)?;
        let sealed = self.seal_entry(alias, secret_key.encoded(), &derived)?;

        self.secret_map.insert(alias.to_string(), sealed);
        push_alias(&mut self.secret_aliases, alias);
        self.cache.put_for_secret_key(alias, password, &derived);
        debug!("Stored secret key entry '{}'", alias);
        Ok(())
    }

    /// Seal and store an ElGamal private key
    pub fn set_elgamal_private_key_entry(
        &mut self,
        alias: &str,
        key: &ElGamalPrivateKey,
        password: &str,
    ) -> KeyStoreResult<()> {
        validate_alias(alias, ELGAMAL_PRIVATE_KEY_ALIAS)?;
        self.settings.passwords.check(password, "ElGamal private key password")?;

        let json = SecureBytes::from(key.to_json()?.into_bytes());
        let derived = self.derive_key(password)?;
        let sealed = self.seal_entry(alias, json.as_bytes(), &derived)?;

        self.elgamal_map.insert(alias.to_string(), sealed);
        push_alias(&mut self.elgamal_aliases, alias);
        self.cache.put_for_elgamal_private_key(alias, password, &derived);
        debug!("Stored ElGamal private key entry '{}'", alias);
        Ok(())
    }

    pub fn secret_key_aliases(&self) -> Vec<String> {
        self.secret_aliases.clone()
    }

    pub fn private_key_aliases(&self) -> Vec<String> {
        self.private_aliases.clone()
    }

    pub fn elgamal_private_key_aliases(&self) -> Vec<String> {
        self.elgamal_aliases.clone()
    }

    /// Salt used for every key derivation in this store
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Collect everything that gets persisted, sealing the platform store
    /// under `password`
    fn persisted_contents(&self, password: &str) -> KeyStoreResult<(ContainerContents, SecureBytes)> {
        self.settings.passwords.check(password, "Key store password")?;

        let key = self.derive_key(password)?;
        let platform_bytes = self
            .platform
            .serialize(&derive_password(key.as_bytes()))
            .map_err(|e| access_failure("store", e, None, error_codes::STORE_SERIALIZATION_FAILED))?;

        let mut contents = ContainerContents {
            salt: self.salt.clone(),
            store: Some(platform_bytes),
            ..ContainerContents::default()
        };
        for alias in &self.secret_aliases {
            if let Some(sealed) = self.secret_map.get(alias) {
                contents.add_secret(alias, sealed.clone());
            }
        }
        for alias in &self.elgamal_aliases {
            if let Some(sealed) = self.elgamal_map.get(alias) {
                contents.add_elgamal_key(alias, sealed.clone());
            }
        }
        Ok((contents, key))
    }

    /// Write the binary container to `output`
    ///
    /// The container is fully built before anything is written. `output` is
    /// flushed but not closed.
    pub fn store<W: Write>(&mut self, output: &mut W, password: &str) -> KeyStoreResult<()> {
        let (contents, key) = self.persisted_contents(password)?;
        let bytes = container::write_container(&contents)?;

        output.write_all(&bytes)?;
        output.flush()?;

        self.cache.put_for_store(password, &key);
        debug!(
            "Stored extended key store ({} bytes, {} secret keys, {} ElGamal keys)",
            bytes.len(),
            contents.secrets.len(),
            contents.elgamal_keys.len()
        );
        Ok(())
    }

    /// Render the JSON form of the store
    pub fn to_json(&mut self, password: &str) -> KeyStoreResult<String> {
        let (contents, key) = self.persisted_contents(password)?;
        let json = container::write_json(&contents)?;

        self.cache.put_for_store(password, &key);
        Ok(json)
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &DerivedKeyCache {
        &self.cache
    }
}

fn push_alias(aliases: &mut Vec<String>, alias: &str) {
    if !aliases.iter().any(|existing| existing == alias) {
        aliases.push(alias.to_string());
    }
}

/// Report a platform store failure as an access error, keeping access errors
/// raised by the platform store as they are
fn access_failure(
    operation: &str,
    error: KeyStoreError,
    alias: Option<&str>,
    error_code: u32,
) -> KeyStoreError {
    match error {
        KeyStoreError::KeyStoreAccessError { .. } => error,
        other => KeyStoreError::access_error(operation, &other.to_string(), alias, error_code),
    }
}

impl std::fmt::Debug for ExtendedKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedKeyStore")
            .field("private_aliases", &self.private_aliases)
            .field("secret_aliases", &self.secret_aliases)
            .field("elgamal_aliases", &self.elgamal_aliases)
            .field("cache", &self.cache)
            .finish()
    }
}
