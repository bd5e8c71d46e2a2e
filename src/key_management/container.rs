//! Persisted forms of an extended key store
//!
//! The binary container is a ZIP archive with one part per item:
//!
//! | Part | Count | Content |
//! |---|---|---|
//! | `SALT` | 1 | derivation salt |
//! | `SECRET.<alias>` | 0..n | sealed secret key |
//! | `ELGAMAL.<alias>` | 0..n | sealed ElGamal private key |
//! | `STORE` | 0..1 | serialized platform credential store |
//!
//! The JSON form carries the same items base64-encoded:
//! `{"salt", "secrets", "egPrivKeys", "store"}`.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use log::debug;
use serde::{Deserialize, Serialize};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::validation::validate_alias;
use crate::error::{error_codes, KeyStoreError, KeyStoreResult};

const SALT_PART: &str = "SALT";
const SECRET_PART: &str = "SECRET";
const ELGAMAL_PART: &str = "ELGAMAL";
const STORE_PART: &str = "STORE";

/// Largest decompressed part accepted when reading a container
pub const MAX_PART_SIZE: u64 = 64 * 1024 * 1024;

/// Raw contents of a persisted extended key store
///
/// Sealed entries are kept in the order they appear so that listing and
/// re-serializing are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerContents {
    pub salt: Vec<u8>,
    pub secrets: Vec<(String, Vec<u8>)>,
    pub elgamal_keys: Vec<(String, Vec<u8>)>,
    /// Serialized platform credential store; `None` means a fresh one
    pub store: Option<Vec<u8>>,
}

impl ContainerContents {
    pub fn add_secret(&mut self, alias: &str, sealed: Vec<u8>) {
        upsert(&mut self.secrets, alias, sealed);
    }

    pub fn add_elgamal_key(&mut self, alias: &str, sealed: Vec<u8>) {
        upsert(&mut self.elgamal_keys, alias, sealed);
    }
}

fn upsert(entries: &mut Vec<(String, Vec<u8>)>, alias: &str, data: Vec<u8>) {
    match entries.iter_mut().find(|(existing, _)| existing == alias) {
        Some(entry) => entry.1 = data,
        None => entries.push((alias.to_string(), data)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartKind {
    Salt,
    Secret,
    ElGamal,
    Store,
}

/// Split a part name into its kind and optional alias
fn parse_part_name(name: &str) -> KeyStoreResult<(PartKind, Option<&str>)> {
    let (kind, alias) = match name.split_once('.') {
        Some((kind, alias)) => (kind, Some(alias)),
        None => (name, None),
    };

    let kind = match kind.to_ascii_uppercase().as_str() {
        SALT_PART => PartKind::Salt,
        SECRET_PART => PartKind::Secret,
        ELGAMAL_PART => PartKind::ElGamal,
        STORE_PART => PartKind::Store,
        _ => {
            return Err(KeyStoreError::format_error(
                &format!("Unknown entry type '{}'", kind),
                error_codes::UNKNOWN_ENTRY_TYPE,
            ))
        }
    };
    Ok((kind, alias.filter(|a| !a.is_empty())))
}

fn require_alias<'a>(alias: Option<&'a str>, name: &str) -> KeyStoreResult<&'a str> {
    let alias = alias.ok_or_else(|| {
        KeyStoreError::format_error(
            &format!("entry '{}' has no alias", name),
            error_codes::MISSING_ALIAS,
        )
    })?;
    check_stored_alias(alias, name)?;
    Ok(alias)
}

/// Persisted aliases obey the same rules as aliases given to a setter
fn check_stored_alias(alias: &str, name: &str) -> KeyStoreResult<()> {
    validate_alias(alias, name).map_err(|e| {
        KeyStoreError::format_error(
            &format!("entry '{}' has an invalid alias: {}", name, e),
            error_codes::INVALID_ALIAS_IN_CONTAINER,
        )
    })
}

fn missing_salt() -> KeyStoreError {
    KeyStoreError::format_error(
        "There was a problem reading the store. Salt was not initialized.",
        error_codes::MISSING_SALT,
    )
}

/// Reject a salt whose length differs from what the deriver produces
pub(crate) fn check_salt_length(salt: &[u8], expected: usize) -> KeyStoreResult<()> {
    if salt.len() != expected {
        return Err(KeyStoreError::format_error(
            &format!(
                "salt of {} bytes does not match the configured length of {}",
                salt.len(),
                expected
            ),
            error_codes::MALFORMED_CONTAINER,
        ));
    }
    Ok(())
}

/// Parse a binary container
///
/// The reader is consumed to its end but not closed.
///
/// # Errors
///
/// Fails with a format error on an unknown part, a part that needs an alias
/// and has none or has an invalid one, a part larger than
/// [`MAX_PART_SIZE`] once decompressed, or a missing or empty `SALT`. Nothing is returned unless
/// every part parsed.
pub fn read_container<R: Read>(reader: &mut R) -> KeyStoreResult<ContainerContents> {
    read_container_with_limit(reader, MAX_PART_SIZE)
}

/// [`read_container`] with an explicit cap on the decompressed size of each
/// part
pub(crate) fn read_container_with_limit<R: Read>(
    reader: &mut R,
    max_part_size: u64,
) -> KeyStoreResult<ContainerContents> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut contents = ContainerContents::default();
    let mut salt = None;

    for index in 0..archive.len() {
        let mut part = archive.by_index(index)?;
        let name = part.name().to_string();
        let (kind, alias) = parse_part_name(&name)?;

        if part.size() > max_part_size {
            return Err(part_too_large(&name, max_part_size));
        }
        let mut data = Vec::new();
        (&mut part)
            .take(max_part_size + 1)
            .read_to_end(&mut data)
            .map_err(|e| {
                KeyStoreError::format_error(
                    &format!("cannot read entry '{}': {}", name, e),
                    error_codes::MALFORMED_CONTAINER,
                )
            })?;
        // The declared size may lie
        if data.len() as u64 > max_part_size {
            return Err(part_too_large(&name, max_part_size));
        }

        match kind {
            PartKind::Salt => salt = Some(data),
            PartKind::Secret => contents.add_secret(require_alias(alias, &name)?, data),
            PartKind::ElGamal => contents.add_elgamal_key(require_alias(alias, &name)?, data),
            PartKind::Store => contents.store = Some(data).filter(|d| !d.is_empty()),
        }
    }

    contents.salt = salt.filter(|s| !s.is_empty()).ok_or_else(missing_salt)?;

    debug!(
        "Read container: {} secret keys, {} ElGamal keys, platform store {}",
        contents.secrets.len(),
        contents.elgamal_keys.len(),
        if contents.store.is_some() { "present" } else { "absent" }
    );
    Ok(contents)
}

fn part_too_large(name: &str, limit: u64) -> KeyStoreError {
    KeyStoreError::format_error(
        &format!("entry '{}' exceeds {} bytes", name, limit),
        error_codes::PART_TOO_LARGE,
    )
}

/// Encode a binary container
pub fn write_container(contents: &ContainerContents) -> KeyStoreResult<Vec<u8>> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file(SALT_PART, options)?;
    zip.write_all(&contents.salt)?;

    for (alias, sealed) in &contents.secrets {
        zip.start_file(format!("{}.{}", SECRET_PART, alias), options)?;
        zip.write_all(sealed)?;
    }

    for (alias, sealed) in &contents.elgamal_keys {
        zip.start_file(format!("{}.{}", ELGAMAL_PART, alias), options)?;
        zip.write_all(sealed)?;
    }

    if let Some(store) = &contents.store {
        zip.start_file(STORE_PART, options)?;
        zip.write_all(store)?;
    }

    Ok(zip.finish()?.into_inner())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonContainer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secrets: Option<BTreeMap<String, String>>,
    #[serde(default, rename = "egPrivKeys", skip_serializing_if = "Option::is_none")]
    eg_priv_keys: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store: Option<String>,
}

/// Parse the JSON form
///
/// An absent or empty `store` field yields `store: None`. A `null` map of
/// entries counts as absent.
pub fn read_json(json: &str) -> KeyStoreResult<ContainerContents> {
    let parsed: JsonContainer = serde_json::from_str(json)?;

    let salt = match parsed.salt.as_deref() {
        Some(encoded) if !encoded.is_empty() => base64::decode(encoded)?,
        _ => return Err(missing_salt()),
    };
    if salt.is_empty() {
        return Err(missing_salt());
    }

    let mut contents = ContainerContents {
        salt,
        ..ContainerContents::default()
    };
    for (alias, encoded) in parsed.secrets.iter().flatten() {
        check_stored_alias(alias, &format!("secrets.{}", alias))?;
        contents.add_secret(alias, base64::decode(encoded)?);
    }
    for (alias, encoded) in parsed.eg_priv_keys.iter().flatten() {
        check_stored_alias(alias, &format!("egPrivKeys.{}", alias))?;
        contents.add_elgamal_key(alias, base64::decode(encoded)?);
    }
    contents.store = match parsed.store.as_deref() {
        Some(encoded) if !encoded.is_empty() => Some(base64::decode(encoded)?),
        _ => None,
    };

    Ok(contents)
}

/// Render the JSON form
pub fn write_json(contents: &ContainerContents) -> KeyStoreResult<String> {
    let encode_all = |entries: &[(String, Vec<u8>)]| -> Option<BTreeMap<String, String>> {
        if entries.is_empty() {
            return None;
        }
        Some(
            entries
                .iter()
                .map(|(alias, sealed)| (alias.clone(), base64::encode(sealed)))
                .collect(),
        )
    };

    let json = JsonContainer {
        salt: Some(base64::encode(&contents.salt)),
        secrets: encode_all(&contents.secrets),
        eg_priv_keys: encode_all(&contents.elgamal_keys),
        store: contents
            .store
            .as_ref()
            .filter(|store| !store.is_empty())
            .map(base64::encode),
    };
    serde_json::to_string(&json).map_err(|e| KeyStoreError::SerializationError(e.to_string()))
}
