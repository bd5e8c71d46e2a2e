/*!
 * ElGamal private key value type
 *
 * The key store treats ElGamal private keys as opaque values with a stable
 * JSON form:
 *
 * ```text
 * {"privateKey":{"zpSubgroup":{"g":"<b64>","p":"<b64>","q":"<b64>"},"exponents":["<b64>",...]}}
 * ```
 *
 * Every integer is carried as the base64 of its big-endian bytes.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{error_codes, KeyStoreError, KeyStoreResult};

/// The Zp subgroup (generator `g`, modulus `p`, order `q`) a key belongs to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZpSubgroup {
    #[serde(with = "b64")]
    g: Vec<u8>,
    #[serde(with = "b64")]
    p: Vec<u8>,
    #[serde(with = "b64")]
    q: Vec<u8>,
}

impl ZpSubgroup {
    pub fn new(g: &[u8], p: &[u8], q: &[u8]) -> Self {
        Self {
            g: g.to_vec(),
            p: p.to_vec(),
            q: q.to_vec(),
        }
    }

    pub fn g(&self) -> &[u8] {
        &self.g
    }

    pub fn p(&self) -> &[u8] {
        &self.p
    }

    pub fn q(&self) -> &[u8] {
        &self.q
    }
}

/// An ElGamal private key: a list of exponents in a Zp subgroup
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ElGamalPrivateKey {
    #[zeroize(skip)]
    #[serde(rename = "zpSubgroup")]
    zp_subgroup: ZpSubgroup,
    #[serde(with = "b64_list")]
    exponents: Vec<Vec<u8>>,
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "privateKey")]
    private_key: T,
}

impl ElGamalPrivateKey {
    /// Create a key from its exponents (big-endian bytes) and subgroup
    ///
    /// # Errors
    ///
    /// Returns a validation error if the exponent list is empty or contains
    /// an empty exponent.
    pub fn new(exponents: Vec<Vec<u8>>, zp_subgroup: ZpSubgroup) -> KeyStoreResult<Self> {
        if exponents.is_empty() {
            return Err(KeyStoreError::validation_error(
                "List of ElGamal private key exponents",
                "at least one exponent",
                "0 exponents",
                error_codes::INVALID_KEY,
            ));
        }
        if exponents.iter().any(|e| e.is_empty()) {
            return Err(KeyStoreError::validation_error(
                "ElGamal private key exponent",
                "non-empty value",
                "empty value",
                error_codes::INVALID_KEY,
            ));
        }
        Ok(Self {
            zp_subgroup,
            exponents,
        })
    }

    pub fn exponents(&self) -> &[Vec<u8>] {
        &self.exponents
    }

    pub fn zp_subgroup(&self) -> &ZpSubgroup {
        &self.zp_subgroup
    }

    /// Serialize to the JSON form stored inside encrypted entries
    pub fn to_json(&self) -> KeyStoreResult<String> {
        serde_json::to_string(&Envelope { private_key: self })
            .map_err(|e| KeyStoreError::SerializationError(e.to_string()))
    }

    /// Parse the JSON form produced by [`to_json`](Self::to_json)
    pub fn from_json(json: &str) -> KeyStoreResult<Self> {
        let envelope: Envelope<ElGamalPrivateKey> = serde_json::from_str(json)?;
        let Envelope { private_key } = envelope;
        if private_key.exponents.is_empty() {
            return Err(KeyStoreError::format_error(
                "ElGamal private key has no exponents",
                error_codes::MALFORMED_JSON,
            ));
        }
        Ok(private_key)
    }
}

impl fmt::Debug for ElGamalPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElGamalPrivateKey")
            .field("zp_subgroup", &self.zp_subgroup)
            .field("exponents", &format_args!("[REDACTED; {}]", self.exponents.len()))
            .finish()
    }
}

mod b64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::decode(encoded).map_err(serde::de::Error::custom)
    }
}

mod b64_list {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&base64::encode(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let encoded = Vec::<String>::deserialize(deserializer)?;
        encoded
            .iter()
            .map(|e| base64::decode(e).map_err(serde::de::Error::custom))
            .collect()
    }
}
