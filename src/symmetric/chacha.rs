use chacha20poly1305::ChaCha20Poly1305;

use super::{open, seal, AuthenticatedCipher};
use crate::error::KeyStoreResult;
use crate::secure_memory::SecureBytes;

const ALGORITHM: &str = "ChaCha20-Poly1305";

/// ChaCha20-Poly1305 (RFC 8439) with a 32-byte key
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaCha20Poly1305Cipher;

impl ChaCha20Poly1305Cipher {
    pub fn new() -> Self {
        Self
    }
}

impl AuthenticatedCipher for ChaCha20Poly1305Cipher {
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> KeyStoreResult<Vec<u8>> {
        seal::<ChaCha20Poly1305>(key, plaintext, ALGORITHM)
    }

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> KeyStoreResult<SecureBytes> {
        open::<ChaCha20Poly1305>(key, ciphertext, ALGORITHM)
    }

    fn supported_key_lengths(&self) -> &'static [usize] {
        &[32]
    }

    fn name(&self) -> &'static str {
        ALGORITHM
    }
}
