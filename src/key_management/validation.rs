//! Argument checks run before any key store mutation

use crate::error::{error_codes, KeyStoreError, KeyStoreResult};
use crate::keys::Certificate;

pub const MIN_ALIAS_LENGTH: usize = 1;
pub const MAX_ALIAS_LENGTH: usize = 50;

/// Bounds on password length, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 16,
            max_length: 1000,
        }
    }
}

impl PasswordPolicy {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
        }
    }

    /// A non-blank password whose length lies in the configured range
    pub fn check(&self, password: &str, parameter: &str) -> KeyStoreResult<()> {
        validate_not_blank(password, parameter, error_codes::INVALID_PASSWORD)?;

        let length = password.chars().count();
        if length < self.min_length || length > self.max_length {
            return Err(KeyStoreError::validation_error(
                &format!("{} length", parameter),
                &format!("between {} and {} characters", self.min_length, self.max_length),
                &format!("{} characters", length),
                error_codes::INVALID_PASSWORD,
            ));
        }
        Ok(())
    }
}

pub fn validate_not_blank(value: &str, parameter: &str, error_code: u32) -> KeyStoreResult<()> {
    if value.trim().is_empty() {
        return Err(KeyStoreError::validation_error(
            parameter,
            "a non-blank value",
            "blank",
            error_code,
        ));
    }
    Ok(())
}

fn is_alias_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
}

/// An alias of 1 to 50 characters from `[a-z0-9_-]`
pub fn validate_alias(alias: &str, parameter: &str) -> KeyStoreResult<()> {
    validate_not_blank(alias, parameter, error_codes::INVALID_ALIAS)?;

    let length = alias.chars().count();
    if !(MIN_ALIAS_LENGTH..=MAX_ALIAS_LENGTH).contains(&length) {
        return Err(KeyStoreError::validation_error(
            &format!("{} length", parameter),
            &format!("between {} and {} characters", MIN_ALIAS_LENGTH, MAX_ALIAS_LENGTH),
            &format!("{} characters", length),
            error_codes::INVALID_ALIAS,
        ));
    }

    if let Some(bad) = alias.chars().find(|c| !is_alias_char(*c)) {
        return Err(KeyStoreError::validation_error(
            parameter,
            "only characters from [a-z0-9_-]",
            &format!("character {:?}", bad),
            error_codes::INVALID_ALIAS,
        ));
    }
    Ok(())
}

/// Encoded key material must not be empty
pub fn validate_key_material(encoded: &[u8], parameter: &str) -> KeyStoreResult<()> {
    if encoded.is_empty() {
        return Err(KeyStoreError::validation_error(
            parameter,
            "non-empty encoded key",
            "empty",
            error_codes::INVALID_KEY,
        ));
    }
    Ok(())
}

/// A non-empty chain of certificates with non-empty encodings
pub fn validate_certificate_chain(chain: &[Certificate]) -> KeyStoreResult<()> {
    if chain.is_empty() {
        return Err(KeyStoreError::validation_error(
            "Certificate chain",
            "at least one certificate",
            "empty chain",
            error_codes::INVALID_CERTIFICATE_CHAIN,
        ));
    }

    if let Some(index) = chain.iter().position(|cert| cert.encoded().is_empty()) {
        return Err(KeyStoreError::validation_error(
            "Content of certificate in chain",
            "non-empty encoded certificate",
            &format!("empty certificate at position {}", index),
            error_codes::INVALID_CERTIFICATE_CHAIN,
        ));
    }
    Ok(())
}
