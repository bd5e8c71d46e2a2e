use aes_gcm::{Aes128Gcm, Aes256Gcm};

use super::{open, seal, AuthenticatedCipher};
use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::secure_memory::SecureBytes;

/// AES-GCM with a 96-bit IV and a 128-bit tag
///
/// The key length picks the variant: 16 bytes for AES-128-GCM, 32 bytes for
/// AES-256-GCM.
///
/// # Examples
///
/// ```
/// use xkeystore::symmetric::{AesGcmCipher, AuthenticatedCipher};
///
/// let cipher = AesGcmCipher::new();
/// let key = [0x42; 16];
///
/// let sealed = cipher.encrypt(&key, b"Secret message").unwrap();
/// assert_eq!(sealed.len(), 12 + 14 + 16);
///
/// let opened = cipher.decrypt(&key, &sealed).unwrap();
/// assert_eq!(opened.as_bytes(), b"Secret message");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    pub fn new() -> Self {
        Self
    }
}

const KEY_LENGTHS: &[usize] = &[16, 32];

impl AuthenticatedCipher for AesGcmCipher {
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> KeyStoreResult<Vec<u8>> {
        match key.len() {
            16 => seal::<Aes128Gcm>(key, plaintext, "AES-128-GCM"),
            32 => seal::<Aes256Gcm>(key, plaintext, "AES-256-GCM"),
            other => Err(invalid_key_size(other)),
        }
    }

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> KeyStoreResult<SecureBytes> {
        match key.len() {
            16 => open::<Aes128Gcm>(key, ciphertext, "AES-128-GCM"),
            32 => open::<Aes256Gcm>(key, ciphertext, "AES-256-GCM"),
            other => Err(invalid_key_size(other)),
        }
    }

    fn supported_key_lengths(&self) -> &'static [usize] {
        KEY_LENGTHS
    }

    fn name(&self) -> &'static str {
        "AES/GCM/NoPadding"
    }
}

fn invalid_key_size(actual: usize) -> KeyStoreError {
    KeyStoreError::cipher_error(
        "AES-GCM",
        &format!("key must be 16 or 32 bytes, got {}", actual),
        error_codes::INVALID_KEY_SIZE,
    )
}
