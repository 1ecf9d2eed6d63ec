//! Error types for snapshot persistence.

use thiserror::Error;

/// Errors returned by snapshot store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document or its sidecar lock could not be read or written.
    #[error("failed to access {document}: {source}")]
    Io {
        /// Document name relative to the state directory.
        document: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The document exists but is not valid JSON.
    #[error("document {document} is corrupt: {source}")]
    Corrupt {
        /// Document name relative to the state directory.
        document: String,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot could not be encoded.
    #[error("failed to encode {document}: {source}")]
    Encode {
        /// Document name relative to the state directory.
        document: String,
        /// Encoder failure.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Wraps an I/O failure for the named document.
    #[must_use]
    pub fn io(document: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            document: document.into(),
            source,
        }
    }

    /// Wraps a parse failure for the named document.
    #[must_use]
    pub fn corrupt(document: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Corrupt {
            document: document.into(),
            source,
        }
    }

    /// Wraps an encoding failure for the named document.
    #[must_use]
    pub fn encode(document: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Encode {
            document: document.into(),
            source,
        }
    }
}

/// Result type for snapshot store operations.
pub type StoreResult<T> = Result<T, StoreError>;
