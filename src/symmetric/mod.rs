/*!
 * Authenticated symmetric encryption
 *
 * Entry payloads are protected with an AEAD cipher. Every implementation in
 * this module produces the same layout:
 *
 * ```text
 * IV (12 bytes) ‖ ciphertext ‖ authentication tag (16 bytes)
 * ```
 *
 * A fresh random IV is drawn for every encryption.
 */

mod aes;
mod chacha;

pub use self::aes::AesGcmCipher;
pub use self::chacha::ChaCha20Poly1305Cipher;

use aes_gcm::aead::{Aead, KeyInit, Nonce};

use crate::derivation::random_bytes;
use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::secure_memory::SecureBytes;

#[cfg(test)]
mod tests;

/// IV (nonce) length in bytes
pub const IV_LENGTH: usize = 12;

/// Authentication tag length in bytes
pub const TAG_LENGTH: usize = 16;

/// An authenticated cipher operating on `IV ‖ ciphertext ‖ tag` blobs
pub trait AuthenticatedCipher: Send + Sync {
    /// Encrypt `plaintext` under `key`
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> KeyStoreResult<Vec<u8>>;

    /// Verify and decrypt `ciphertext` under `key`
    ///
    /// # Errors
    ///
    /// A failed authentication tag or a truncated blob is reported as a
    /// [`KeyStoreError::TamperError`].
    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> KeyStoreResult<SecureBytes>;

    /// Key lengths in bytes this cipher accepts
    fn supported_key_lengths(&self) -> &'static [usize];

    /// Human-readable algorithm name
    fn name(&self) -> &'static str;
}

fn init_cipher<A: KeyInit>(key: &[u8], algorithm: &str) -> KeyStoreResult<A> {
    A::new_from_slice(key).map_err(|_| {
        KeyStoreError::cipher_error(
            algorithm,
            &format!("invalid key size of {} bytes", key.len()),
            error_codes::INVALID_KEY_SIZE,
        )
    })
}

pub(crate) fn seal<A: Aead + KeyInit>(
    key: &[u8],
    plaintext: &[u8],
    algorithm: &str,
) -> KeyStoreResult<Vec<u8>> {
    let cipher: A = init_cipher(key, algorithm)?;
    let iv = random_bytes(IV_LENGTH)?;

    let ciphertext = cipher
        .encrypt(Nonce::<A>::from_slice(&iv), plaintext)
        .map_err(|e| {
            KeyStoreError::cipher_error(
                algorithm,
                &format!("encryption failed: {}", e),
                error_codes::ENCRYPTION_FAILED,
            )
        })?;

    let mut output = Vec::with_capacity(IV_LENGTH + ciphertext.len());
    output.extend_from_slice(&iv);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

pub(crate) fn open<A: Aead + KeyInit>(
    key: &[u8],
    blob: &[u8],
    algorithm: &str,
) -> KeyStoreResult<SecureBytes> {
    let cipher: A = init_cipher(key, algorithm)?;

    if blob.len() < IV_LENGTH + TAG_LENGTH {
        return Err(KeyStoreError::tamper_error(
            algorithm,
            &format!(
                "ciphertext of {} bytes is shorter than IV and tag",
                blob.len()
            ),
            error_codes::CIPHERTEXT_TOO_SHORT,
        ));
    }

    let (iv, ciphertext) = blob.split_at(IV_LENGTH);
    cipher
        .decrypt(Nonce::<A>::from_slice(iv), ciphertext)
        .map(SecureBytes::from)
        .map_err(|_| {
            KeyStoreError::tamper_error(
                algorithm,
                "authentication tag verification failed",
                error_codes::AUTHENTICATION_TAG_MISMATCH,
            )
        })
}
