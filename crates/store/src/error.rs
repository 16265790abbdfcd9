//! Error types for certvault storage.

use certvault_common::{IdError, SlotKey};
use thiserror::Error;

/// Result type for repository and backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the repository and its storage backends.
///
/// Nothing is retried or recovered internally; every failure reaches the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Slot has never been written
    #[error("{slot} not found")]
    NotFound { slot: SlotKey },

    /// Stored bytes failed structural validation
    #[error("{slot} is corrupt: {reason}")]
    Corrupt { slot: SlotKey, reason: String },

    /// I/O failure while staging, committing or reading
    #[error("storage failure on {target}: {source}")]
    Storage {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Caller supplied a value that cannot be stored
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    pub(crate) fn storage(target: impl ToString, source: std::io::Error) -> Self {
        StoreError::Storage {
            target: target.to_string(),
            source,
        }
    }

    pub(crate) fn corrupt(slot: &SlotKey, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            slot: slot.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

impl From<IdError> for StoreError {
    fn from(err: IdError) -> Self {
        StoreError::InvalidInput(err.to_string())
    }
}

/// Codec failures. Decoding never yields a partially populated value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("content is empty")]
    Empty,

    #[error("malformed PEM: {0}")]
    Pem(String),

    #[error("malformed header: {0}")]
    Header(String),

    #[error("expected {expected} PEM block(s), found {found}")]
    BlockCount { expected: usize, found: usize },

    #[error("unexpected PEM tag '{0}'")]
    UnexpectedTag(String),

    #[error("PEM block '{0}' has no content")]
    EmptyBlock(String),

    #[error("private key is {private} but public key is {public}")]
    AlgorithmMismatch { private: String, public: String },

    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    #[error("common name is missing")]
    MissingCommonName,
}
