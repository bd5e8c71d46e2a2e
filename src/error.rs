/*!
 * Error Handling for the Extended Key Store
 *
 * Provides the error taxonomy shared by every key store operation, with
 * numeric error codes, user-facing messages and remediation hints.
 */

use std::collections::HashMap;
use thiserror::Error;

/// Error type for all extended key store operations
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("Validation failed: {parameter} - expected {expected}, got {actual}")]
    ValidationError {
        parameter: String,
        expected: String,
        actual: String,
        error_code: u32,
    },

    #[error("Data was tampered: {operation} - {cause}")]
    TamperError {
        operation: String,
        cause: String,
        error_code: u32,
    },

    #[error("Malformed key store data: {cause}")]
    FormatError { cause: String, error_code: u32 },

    #[error("Platform credential store failure: {operation} - {cause}")]
    KeyStoreAccessError {
        operation: String,
        cause: String,
        error_code: u32,
        context: HashMap<String, String>,
    },

    #[error("Key derivation failed: {operation} - {cause}")]
    KeyDerivationError {
        operation: String,
        cause: String,
        error_code: u32,
    },

    #[error("Cipher operation failed: {operation} - {cause}")]
    CipherError {
        operation: String,
        cause: String,
        error_code: u32,
    },

    #[error("Invalid configuration: {property} - {cause}")]
    ConfigurationError {
        property: String,
        cause: String,
        error_code: u32,
    },

    #[error("Random number generation failed: {cause}")]
    RandomGenerationError { cause: String, error_code: u32 },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Error code constants for different error categories
pub mod error_codes {
    // Validation errors: 1000-1999
    pub const INVALID_ALIAS: u32 = 1001;
    pub const INVALID_PASSWORD: u32 = 1002;
    pub const INVALID_KEY: u32 = 1003;
    pub const INVALID_CERTIFICATE_CHAIN: u32 = 1004;
    pub const INVALID_ARGUMENT: u32 = 1005;

    // Tamper errors: 2000-2999
    pub const AUTHENTICATION_TAG_MISMATCH: u32 = 2001;
    pub const DECRYPTED_LENGTH_MISMATCH: u32 = 2002;
    pub const DECRYPTED_ALIAS_MISMATCH: u32 = 2003;
    pub const CIPHERTEXT_TOO_SHORT: u32 = 2004;

    // Format errors: 3000-3999
    pub const UNKNOWN_ENTRY_TYPE: u32 = 3001;
    pub const MISSING_SALT: u32 = 3002;
    pub const MALFORMED_CONTAINER: u32 = 3003;
    pub const MALFORMED_JSON: u32 = 3004;
    pub const INVALID_BASE64: u32 = 3005;
    pub const MISSING_ALIAS: u32 = 3006;
    pub const INVALID_ALIAS_IN_CONTAINER: u32 = 3007;
    pub const PART_TOO_LARGE: u32 = 3008;

    // Platform credential store errors: 4000-4999
    pub const STORE_CREATION_FAILED: u32 = 4001;
    pub const STORE_LOAD_FAILED: u32 = 4002;
    pub const STORE_SERIALIZATION_FAILED: u32 = 4003;
    pub const ENTRY_RETRIEVAL_FAILED: u32 = 4004;
    pub const ENTRY_STORAGE_FAILED: u32 = 4005;

    // Key derivation errors: 5000-5999
    pub const DERIVATION_FAILED: u32 = 5001;
    pub const INVALID_SALT: u32 = 5002;

    // Cipher errors: 6000-6999
    pub const ENCRYPTION_FAILED: u32 = 6001;
    pub const INVALID_KEY_SIZE: u32 = 6002;

    // Configuration errors: 7000-7999
    pub const UNKNOWN_PROPERTY_VALUE: u32 = 7001;
    pub const INCONSISTENT_POLICY: u32 = 7002;

    // Random generation, serialization and I/O: 9000+
    pub const RNG_FAILED: u32 = 9000;
    pub const SERIALIZATION_FAILED: u32 = 9001;
    pub const IO_ERROR: u32 = 9002;
}

impl KeyStoreError {
    /// Get the numeric error code for this error
    pub fn error_code(&self) -> u32 {
        match self {
            KeyStoreError::ValidationError { error_code, .. } => *error_code,
            KeyStoreError::TamperError { error_code, .. } => *error_code,
            KeyStoreError::FormatError { error_code, .. } => *error_code,
            KeyStoreError::KeyStoreAccessError { error_code, .. } => *error_code,
            KeyStoreError::KeyDerivationError { error_code, .. } => *error_code,
            KeyStoreError::CipherError { error_code, .. } => *error_code,
            KeyStoreError::ConfigurationError { error_code, .. } => *error_code,
            KeyStoreError::RandomGenerationError { error_code, .. } => *error_code,
            KeyStoreError::SerializationError(_) => error_codes::SERIALIZATION_FAILED,
            KeyStoreError::IoError(_) => error_codes::IO_ERROR,
        }
    }

    /// Get the error category/type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            KeyStoreError::ValidationError { .. } => "ValidationError",
            KeyStoreError::TamperError { .. } => "TamperError",
            KeyStoreError::FormatError { .. } => "FormatError",
            KeyStoreError::KeyStoreAccessError { .. } => "KeyStoreAccessError",
            KeyStoreError::KeyDerivationError { .. } => "KeyDerivationError",
            KeyStoreError::CipherError { .. } => "CipherError",
            KeyStoreError::ConfigurationError { .. } => "ConfigurationError",
            KeyStoreError::RandomGenerationError { .. } => "RandomGenerationError",
            KeyStoreError::SerializationError(_) => "SerializationError",
            KeyStoreError::IoError(_) => "IoError",
        }
    }

    /// True when the error signals corrupted or forged data
    pub fn is_tamper(&self) -> bool {
        matches!(self, KeyStoreError::TamperError { .. })
    }

    /// Get a user-friendly error message
    pub fn user_friendly_message(&self) -> String {
        match self {
            KeyStoreError::ValidationError { parameter, expected, .. } => {
                format!("Invalid value for '{}'. Expected {}.", parameter, expected)
            }
            KeyStoreError::TamperError { operation, .. } => format!(
                "Stored data failed its integrity check during '{}'. Check the password or restore the key store from a trusted copy.",
                operation
            ),
            KeyStoreError::FormatError { .. } => {
                "The key store data is malformed and cannot be read.".to_string()
            }
            KeyStoreError::KeyStoreAccessError { operation, .. } => format!(
                "The underlying credential store rejected '{}'. The password may be wrong.",
                operation
            ),
            KeyStoreError::KeyDerivationError { operation, .. } => {
                format!("Password-based key derivation failed during '{}'.", operation)
            }
            KeyStoreError::CipherError { operation, .. } => {
                format!("Encryption failed during '{}'.", operation)
            }
            KeyStoreError::ConfigurationError { property, .. } => {
                format!("Configuration property '{}' has an unsupported value.", property)
            }
            KeyStoreError::RandomGenerationError { .. } => {
                "Random number generation failed. Salts and nonces cannot be produced."
                    .to_string()
            }
            KeyStoreError::SerializationError(_) => {
                "Data serialization failed. Data format may be corrupted.".to_string()
            }
            KeyStoreError::IoError(_) => {
                "Input/output operation failed while reading or writing the key store."
                    .to_string()
            }
        }
    }

    /// Get technical details for debugging
    pub fn technical_details(&self) -> HashMap<String, String> {
        let mut details = HashMap::new();

        details.insert("error_code".to_string(), self.error_code().to_string());
        details.insert("error_type".to_string(), self.error_type().to_string());
        details.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        match self {
            KeyStoreError::ValidationError {
                parameter,
                expected,
                actual,
                ..
            } => {
                details.insert("parameter".to_string(), parameter.clone());
                details.insert("expected".to_string(), expected.clone());
                details.insert("actual".to_string(), actual.clone());
            }
            KeyStoreError::TamperError { operation, cause, .. }
            | KeyStoreError::KeyDerivationError { operation, cause, .. }
            | KeyStoreError::CipherError { operation, cause, .. } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            KeyStoreError::KeyStoreAccessError {
                operation,
                cause,
                context,
                ..
            } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
                details.extend(context.clone());
            }
            KeyStoreError::FormatError { cause, .. } => {
                details.insert("cause".to_string(), cause.clone());
            }
            KeyStoreError::ConfigurationError { property, cause, .. } => {
                details.insert("property".to_string(), property.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            _ => {
                details.insert("details".to_string(), format!("{:?}", self));
            }
        }

        details
    }

    /// Get suggested remediation steps
    pub fn suggested_remediation(&self) -> Option<String> {
        match self {
            KeyStoreError::ValidationError { error_code, .. } => match *error_code {
                error_codes::INVALID_ALIAS => Some(
                    "Use an alias of 1 to 50 characters from the alphabet [a-z0-9_-].".to_string(),
                ),
                error_codes::INVALID_PASSWORD => Some(
                    "Use a password within the configured length range (16 to 1000 characters by default)."
                        .to_string(),
                ),
                _ => Some("Check the arguments passed to the key store.".to_string()),
            },
            KeyStoreError::TamperError { .. } => Some(
                "Do not retry automatically. Supply the correct password or restore the data from a trusted source."
                    .to_string(),
            ),
            KeyStoreError::FormatError { .. } => Some(
                "Verify the container was produced by a compatible key store and was not truncated."
                    .to_string(),
            ),
            KeyStoreError::KeyStoreAccessError { .. } => {
                Some("Check the key store password used to open the container.".to_string())
            }
            KeyStoreError::ConfigurationError { .. } => {
                Some("Review the key store policy properties.".to_string())
            }
            KeyStoreError::RandomGenerationError { .. } => Some(
                "Check system entropy sources. Consider using hardware RNG if available."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Convenience constructors for common error types
impl KeyStoreError {
    pub fn validation_error(parameter: &str, expected: &str, actual: &str, error_code: u32) -> Self {
        KeyStoreError::ValidationError {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code,
        }
    }

    pub fn tamper_error(operation: &str, cause: &str, error_code: u32) -> Self {
        KeyStoreError::TamperError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn format_error(cause: &str, error_code: u32) -> Self {
        KeyStoreError::FormatError {
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn access_error(operation: &str, cause: &str, alias: Option<&str>, error_code: u32) -> Self {
        let mut context = HashMap::new();
        if let Some(alias) = alias {
            context.insert("alias".to_string(), alias.to_string());
        }

        KeyStoreError::KeyStoreAccessError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
            context,
        }
    }

    pub fn derivation_error(operation: &str, cause: &str, error_code: u32) -> Self {
        KeyStoreError::KeyDerivationError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn cipher_error(operation: &str, cause: &str, error_code: u32) -> Self {
        KeyStoreError::CipherError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn configuration_error(property: &str, cause: &str, error_code: u32) -> Self {
        KeyStoreError::ConfigurationError {
            property: property.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn io_error(cause: &str) -> Self {
        KeyStoreError::IoError(cause.to_string())
    }
}

// From implementations for automatic error conversion
impl From<std::io::Error> for KeyStoreError {
    fn from(err: std::io::Error) -> Self {
        KeyStoreError::io_error(&format!("IO operation failed: {}", err))
    }
}

impl From<serde_json::Error> for KeyStoreError {
    fn from(err: serde_json::Error) -> Self {
        KeyStoreError::format_error(
            &format!("Invalid JSON document: {}", err),
            error_codes::MALFORMED_JSON,
        )
    }
}

impl From<zip::result::ZipError> for KeyStoreError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => KeyStoreError::from(e),
            other => KeyStoreError::format_error(
                &format!("There was a problem reading the store. {}", other),
                error_codes::MALFORMED_CONTAINER,
            ),
        }
    }
}

impl From<base64::DecodeError> for KeyStoreError {
    fn from(err: base64::DecodeError) -> Self {
        KeyStoreError::format_error(
            &format!("Invalid base64 content: {}", err),
            error_codes::INVALID_BASE64,
        )
    }
}

/// Result type alias for key store operations
pub type KeyStoreResult<T> = Result<T, KeyStoreError>;
