/*!
 * Key and certificate value types
 *
 * These are the values callers hand to, and get back from, the extended key
 * store. Secret material is zeroed on drop.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A raw symmetric key tagged with its algorithm name (for example `"AES"`)
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    algorithm: String,
    encoded: Vec<u8>,
}

impl SecretKey {
    pub fn new(algorithm: &str, encoded: &[u8]) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            encoded: encoded.to_vec(),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The raw key bytes
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("algorithm", &self.algorithm)
            .field("encoded", &format_args!("[REDACTED; {}]", self.encoded.len()))
            .finish()
    }
}

/// An asymmetric private key in its encoded form (for example PKCS#8 DER)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    algorithm: String,
    encoded: Vec<u8>,
}

impl PrivateKey {
    pub fn new(algorithm: &str, encoded: &[u8]) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            encoded: encoded.to_vec(),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm)
            .field("encoded", &format_args!("[REDACTED; {}]", self.encoded.len()))
            .finish()
    }
}

/// A certificate in its encoded form (for example X.509 DER)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    encoded: Vec<u8>,
}

impl Certificate {
    pub fn new(encoded: &[u8]) -> Self {
        Self {
            encoded: encoded.to_vec(),
        }
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}
