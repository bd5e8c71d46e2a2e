use std::io::Read;
use std::sync::Arc;

use log::info;

use super::container::{self, ContainerContents};
use super::storage::{ExtendedKeyStore, StoreSettings};
use super::validation::PasswordPolicy;
use crate::derivation::KeyDerivationEngine;
use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::platform::CredentialStoreProvider;
use crate::policy::{ExtendedKeyStorePolicy, SecretKeySpec};
use crate::symmetric::AuthenticatedCipher;

/// Factory for [`ExtendedKeyStore`]s sharing one set of collaborators
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use xkeystore::derivation::Pbkdf2Deriver;
/// use xkeystore::key_management::ExtendedKeyStoreGenerator;
/// use xkeystore::keys::SecretKey;
/// use xkeystore::platform::SoftwareCredentialStoreProvider;
/// use xkeystore::policy::SecretKeySpec;
/// use xkeystore::symmetric::AesGcmCipher;
///
/// let generator = ExtendedKeyStoreGenerator::new(
///     Arc::new(Pbkdf2Deriver::new(1000, 32, 16).unwrap()),
///     Arc::new(AesGcmCipher::new()),
///     Arc::new(SoftwareCredentialStoreProvider::new()),
///     SecretKeySpec::parse("AES_128").unwrap(),
/// )
/// .unwrap();
///
/// let mut store = generator.create().unwrap();
/// let key = SecretKey::new("AES", &[7u8; 16]);
/// store.set_secret_key_entry("k1", &key, "0123456789ABCDEF").unwrap();
///
/// let mut container = Vec::new();
/// store.store(&mut container, "container-pw-0123456789012345").unwrap();
///
/// let mut reloaded = generator
///     .load(&mut container.as_slice(), "container-pw-0123456789012345")
///     .unwrap();
/// let recovered = reloaded.get_secret_key_entry("k1", "0123456789ABCDEF").unwrap();
/// assert_eq!(recovered.unwrap().encoded(), &[7u8; 16]);
/// ```
#[derive(Clone)]
pub struct ExtendedKeyStoreGenerator {
    settings: StoreSettings,
}

impl ExtendedKeyStoreGenerator {
    /// Build a generator from explicit collaborators
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when the derived key length does not
    /// match `secret_key` or is not a key size `cipher` accepts.
    pub fn new(
        deriver: Arc<dyn KeyDerivationEngine>,
        cipher: Arc<dyn AuthenticatedCipher>,
        provider: Arc<dyn CredentialStoreProvider>,
        secret_key: SecretKeySpec,
    ) -> KeyStoreResult<Self> {
        let key_length = deriver.key_length();
        if key_length != secret_key.key_length
            || !cipher.supported_key_lengths().contains(&key_length)
        {
            return Err(KeyStoreError::configuration_error(
                "primitives.pbkdfderivation",
                &format!(
                    "{}-byte derived keys do not fit {} with {}-byte secret keys",
                    key_length,
                    cipher.name(),
                    secret_key.key_length
                ),
                error_codes::INCONSISTENT_POLICY,
            ));
        }

        Ok(Self {
            settings: StoreSettings {
                deriver,
                cipher,
                provider,
                secret_key,
                passwords: PasswordPolicy::default(),
            },
        })
    }

    /// Build a generator from configuration
    pub fn from_policy(policy: &ExtendedKeyStorePolicy) -> KeyStoreResult<Self> {
        policy.validate()?;

        let generator = Self::new(
            Arc::from(policy.key_derivation_engine()?),
            Arc::from(policy.authenticated_cipher()),
            Arc::from(policy.credential_store_provider()?),
            policy.secret_key.clone(),
        )?
        .with_password_policy(policy.password_policy());

        info!(
            "Extended key store generator ready: store {}, {:?}, {:?}",
            policy.store_kind, policy.pbkdf, policy.cipher
        );
        Ok(generator)
    }

    /// Replace the password length bounds applied to writes
    pub fn with_password_policy(mut self, passwords: PasswordPolicy) -> Self {
        self.settings.passwords = passwords;
        self
    }

    /// An empty store with a fresh salt
    pub fn create(&self) -> KeyStoreResult<ExtendedKeyStore> {
        ExtendedKeyStore::create(self.settings.clone())
    }

    /// Load a binary container
    ///
    /// `password` is the container password given to
    /// [`ExtendedKeyStore::store`]. The reader is read to its end and left
    /// open.
    pub fn load<R: Read>(&self, reader: &mut R, password: &str) -> KeyStoreResult<ExtendedKeyStore> {
        let contents = container::read_container(reader)?;
        ExtendedKeyStore::from_contents(self.settings.clone(), contents, password)
    }

    /// Load the JSON form produced by [`ExtendedKeyStore::to_json`]
    pub fn load_from_json(&self, json: &str, password: &str) -> KeyStoreResult<ExtendedKeyStore> {
        let contents = container::read_json(json)?;
        ExtendedKeyStore::from_contents(self.settings.clone(), contents, password)
    }

    /// Like [`load_from_json`](Self::load_from_json), reading the document
    /// from `reader`
    pub fn load_from_json_reader<R: Read>(
        &self,
        reader: &mut R,
        password: &str,
    ) -> KeyStoreResult<ExtendedKeyStore> {
        let mut json = String::new();
        reader.read_to_string(&mut json)?;
        self.load_from_json(&json, password)
    }

    /// Convert a binary container to its JSON form without opening it
    ///
    /// No password is needed: sealed entries and the platform store are
    /// copied as they are.
    pub fn format_key_store_to_json<R: Read>(&self, reader: &mut R) -> KeyStoreResult<String> {
        let contents: ContainerContents = container::read_container(reader)?;

        container::check_salt_length(&contents.salt, self.settings.deriver.salt_length())?;
        container::write_json(&contents)
    }
}

impl std::fmt::Debug for ExtendedKeyStoreGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedKeyStoreGenerator")
            .field("cipher", &self.settings.cipher.name())
            .field("secret_key", &self.settings.secret_key)
            .field("passwords", &self.settings.passwords)
            .finish()
    }
}
