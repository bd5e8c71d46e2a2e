//! Secure Memory Handling Utilities
//!
//! Containers for derived keys, decrypted payloads and other sensitive bytes
//! handled by the key store. Contents are zeroed when the container is
//! dropped and are never printed by `Debug`.

use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A byte container for sensitive data that is zeroed on drop.
///
/// Derived keys kept by the [`DerivedKeyCache`](crate::key_management::DerivedKeyCache)
/// and plaintexts assembled before encryption live in this type, so that
/// they do not outlive their owner in memory.
///
/// # Example
///
/// ```
/// use xkeystore::secure_memory::SecureBytes;
///
/// let key = SecureBytes::new(&[0x01, 0x02, 0x03, 0x04]);
/// assert_eq!(key.len(), 4);
/// assert_eq!(format!("{:?}", key), "SecureBytes([REDACTED; 4])");
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureBytes {
    bytes: Vec<u8>,
}

impl SecureBytes {
    /// Create a new SecureBytes holding a copy of `data`
    pub fn new(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
        }
    }

    /// Create an empty SecureBytes with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Get a reference to the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get a mutable reference to the underlying bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Append data to the end of the buffer
    ///
    /// The buffer is grown without leaving an unzeroed copy of the old
    /// contents behind.
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        let required = self.bytes.len() + data.len();
        if required > self.bytes.capacity() {
            let mut grown = Vec::with_capacity(required.max(self.bytes.capacity() * 2));
            grown.extend_from_slice(&self.bytes);
            self.bytes.zeroize();
            self.bytes = grown;
        }
        self.bytes.extend_from_slice(data);
    }

    /// Consume the container and return the contained bytes
    ///
    /// The caller becomes responsible for zeroing the returned vector.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Clear the buffer, zeroing all data
    pub fn clear(&mut self) {
        self.bytes.zeroize();
        self.bytes.clear();
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBytes([REDACTED; {}])", self.bytes.len())
    }
}

/// Constant-time equality; lengths are not secret.
impl PartialEq for SecureBytes {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.len() == other.bytes.len() && bool::from(self.bytes.ct_eq(&other.bytes))
    }
}

impl Eq for SecureBytes {}

impl From<Vec<u8>> for SecureBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for SecureBytes {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl AsRef<[u8]> for SecureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Run `f` over a sensitive value and zero the value afterwards
///
/// # Example
///
/// ```
/// use xkeystore::secure_memory::with_secure_scope;
///
/// let mut scratch = vec![7u8; 16];
/// let sum: u32 = with_secure_scope(&mut scratch, |data| data.iter().map(|b| *b as u32).sum());
/// assert_eq!(sum, 112);
/// assert!(scratch.iter().all(|b| *b == 0));
/// ```
pub fn with_secure_scope<T, F, R>(data: &mut T, f: F) -> R
where
    T: Zeroize,
    F: FnOnce(&mut T) -> R,
{
    let result = f(data);
    data.zeroize();
    result
}
