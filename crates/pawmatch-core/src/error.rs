//! Error types for catalog, storage, and query operations.

use std::io;

use thiserror::Error;

/// Failure reported by the remote catalog or session service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request never produced a usable response (network, HTTP status, or decoding).
    #[error("{operation} failed: {detail}")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Human-readable failure detail.
        detail: String,
    },
    /// The session is missing or expired.
    #[error("{operation} rejected: session is not authenticated")]
    Auth {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The requested identifiers yielded no details.
    #[error("no catalog entries found for {ids:?}")]
    NotFound {
        /// Identifiers that were requested.
        ids: Vec<String>,
    },
}

impl CatalogError {
    /// Build a transport failure from any displayable cause.
    pub fn transport(operation: &'static str, detail: impl ToString) -> Self {
        Self::Transport {
            operation,
            detail: detail.to_string(),
        }
    }

    /// Whether the failure means the caller has to log in again.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Convenience alias for catalog results.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failure reading or writing the durable favorites mirror.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Stored content exists but cannot be parsed.
    #[error("stored value under '{key}' is unreadable")]
    StorageCorruption {
        /// Storage key that failed to parse.
        key: &'static str,
        /// Parser detail.
        detail: String,
    },
    /// File system operation failed.
    #[error("storage {operation} failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
    /// The value could not be serialised.
    #[error("failed to encode stored value")]
    Encode {
        /// Serializer error.
        source: serde_json::Error,
    },
}

/// Convenience alias for storage results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Rejected pagination input.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Page indices are 1-based.
    #[error("page must be 1 or greater (got {page})")]
    PageOutOfRange {
        /// Requested page.
        page: u32,
    },
    /// Page size must be positive.
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}
