//! Error types for RecVault.

use crate::types::{ClassId, KeyId, ListStyle, RecordId};
use thiserror::Error;

/// Result type for framework operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors that can occur in RecVault operations.
///
/// Validation findings are deliberately absent: they accumulate in a
/// record's validation ledger and taint its edit status instead of
/// aborting the operation that produced them.
#[derive(Debug, Error)]
pub enum VaultError {
    /// An insertion collided with an existing identity in the same
    /// collection.
    #[error("duplicate identity {id} in {style} collection")]
    DuplicateIdentity {
        /// The colliding identity.
        id: RecordId,
        /// Style of the collection rejecting the insertion.
        style: ListStyle,
    },

    /// A foreign identity did not resolve in the dataset.
    #[error("unresolved {kind} reference: {id}")]
    UnresolvedReference {
        /// What kind of reference failed to resolve.
        kind: &'static str,
        /// The raw identity value that did not resolve.
        id: u64,
    },

    /// A reference-data enumeration lookup found no matching value.
    #[error("invalid enumeration value: {message}")]
    InvalidEnumValue {
        /// Description of the failed lookup.
        message: String,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decryption failed.
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Invalid key size.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// A programming-invariant violation, not a data problem.
    ///
    /// The canonical example is invoking encryption before a key has
    /// been bound.
    #[error("logic error: {message}")]
    Logic {
        /// Description of the violated invariant.
        message: String,
    },
}

impl VaultError {
    /// Creates a duplicate-identity error.
    pub fn duplicate_identity(id: RecordId, style: ListStyle) -> Self {
        Self::DuplicateIdentity { id, style }
    }

    /// Creates an unresolved-reference error for a record identity.
    pub fn unresolved_record(id: RecordId) -> Self {
        Self::UnresolvedReference {
            kind: "record",
            id: id.as_u64(),
        }
    }

    /// Creates an unresolved-reference error for a control key.
    pub fn unresolved_key(id: KeyId) -> Self {
        Self::UnresolvedReference {
            kind: "control key",
            id: u64::from(id.as_u32()),
        }
    }

    /// Creates an invalid-enumeration-value error.
    pub fn invalid_enum(message: impl Into<String>) -> Self {
        Self::InvalidEnumValue {
            message: message.into(),
        }
    }

    /// Creates an invalid-enumeration-value error for a class id.
    pub fn unknown_class(id: ClassId) -> Self {
        Self::InvalidEnumValue {
            message: format!("no enumeration value with {id}"),
        }
    }

    /// Creates an encryption-failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a decryption-failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }

    /// Creates a logic error.
    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_duplicate_identity() {
        let err = VaultError::duplicate_identity(RecordId::new(7), ListStyle::Core);
        assert_eq!(
            err.to_string(),
            "duplicate identity rec:7 in CORE collection"
        );
    }

    #[test]
    fn display_unresolved_key() {
        let err = VaultError::unresolved_key(KeyId::new(3));
        assert_eq!(err.to_string(), "unresolved control key reference: 3");
    }

    #[test]
    fn display_logic() {
        let err = VaultError::logic("encrypt before key bound");
        assert_eq!(err.to_string(), "logic error: encrypt before key bound");
    }
}
