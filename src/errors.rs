//! Error types for the storage engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Error types for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error during a storage operation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No document with the given id exists in the collection
    #[error("Document not found: '{id}' in collection '{collection}'")]
    NotFound {
        /// Collection that was searched
        collection: String,
        /// Identifier that did not match any document
        id: String,
    },

    /// A collection file exists but cannot be parsed.
    ///
    /// Fatal: the source of truth is malformed and cannot be repaired
    /// automatically, so this is surfaced to the caller instead of being
    /// recovered silently.
    #[error("Corrupted collection file {path}: {message}")]
    Corruption {
        /// Path of the unreadable collection file
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// A caller-supplied id already names another document in the collection
    #[error("Duplicate id: '{id}' already exists in collection '{collection}'")]
    DuplicateId {
        /// Collection holding the conflicting document
        collection: String,
        /// The identifier supplied twice
        id: String,
    },

    /// The external database cannot be reached or a driver call failed
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create a not-found error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a corruption error
    pub fn corruption(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corruption {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a duplicate-id error
    pub fn duplicate_id(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a backend-unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether this error means the requested document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
