//! Error types for SimSearch.
//!
//! SimSearch uses a hierarchical error system:
//! - `SimSearchError` is the top-level error returned by all public APIs
//! - Specific error types (`ValidationError`, `NotFoundError`, `SnapshotError`)
//!   provide detail
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use simsearch::{Config, IndexManager, Result};
//!
//! fn example() -> Result<()> {
//!     let index = IndexManager::new(Config::default())?;
//!     if !index.load_snapshot("./data/vector_index")? {
//!         // first run: rebuild from source data
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for SimSearch operations.
pub type Result<T> = std::result::Result<T, SimSearchError>;

/// Top-level error enum for all SimSearch operations.
///
/// This is the only error type returned by public APIs.
/// Use pattern matching to handle specific error cases.
#[derive(Debug, Error)]
pub enum SimSearchError {
    /// Input validation error (dimension, batch shape, duplicates).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Requested entity not found.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// Snapshot files present but unusable.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Configuration error.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of what's wrong with the configuration.
        reason: String,
    },

    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding generation error.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index error (poisoned locks, broken internal invariants).
    #[error("Vector index error: {0}")]
    Index(String),

    /// Background task failure (async provider).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SimSearchError {
    /// Creates a configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates an embedding error with the given message.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Creates a vector index error with the given message.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a dimension mismatch.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Validation(ValidationError::DimensionMismatch { .. })
        )
    }

    /// Returns true if this is a batch length mismatch.
    pub fn is_batch_length_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Validation(ValidationError::BatchLengthMismatch { .. })
        )
    }

    /// Returns true if snapshot files exist but could not be used.
    pub fn is_corrupt_snapshot(&self) -> bool {
        matches!(
            self,
            Self::Snapshot(
                SnapshotError::Corrupted(_)
                    | SnapshotError::Serialization(_)
                    | SnapshotError::VersionMismatch { .. }
            )
        )
    }

    /// Returns true if this is a vector index error.
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

/// Validation errors for input data.
///
/// These are raised before any mutation happens, so a rejected call
/// leaves the index exactly as it was.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Vector length doesn't match the index dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension established by the index.
        expected: usize,
        /// Actual dimension provided.
        got: usize,
    },

    /// Parallel batch inputs have different lengths.
    #[error(
        "Batch length mismatch: {vectors} vectors, {external_ids} external ids, {payloads} payloads"
    )]
    BatchLengthMismatch {
        /// Number of vectors supplied.
        vectors: usize,
        /// Number of external ids supplied.
        external_ids: usize,
        /// Number of payloads supplied.
        payloads: usize,
    },

    /// External id already present while duplicates are rejected.
    #[error("Duplicate external id: {0}")]
    DuplicateExternalId(String),

    /// Catalog insert did not follow the vector store's id sequence.
    #[error("Out-of-order insert: expected internal id {expected}, got {got}")]
    OutOfOrderInsert {
        /// Next id the catalog expects.
        expected: usize,
        /// Id actually supplied.
        got: usize,
    },

    /// A field has an invalid value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// A required field is missing or empty.
    #[error("Required field missing: {field}")]
    RequiredField {
        /// Name of the missing field.
        field: String,
    },
}

impl ValidationError {
    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, got: usize) -> Self {
        Self::DimensionMismatch { expected, got }
    }

    /// Creates a batch length mismatch error.
    pub fn batch_length_mismatch(vectors: usize, external_ids: usize, payloads: usize) -> Self {
        Self::BatchLengthMismatch {
            vectors,
            external_ids,
            payloads,
        }
    }

    /// Creates a duplicate external id error.
    pub fn duplicate_external_id(id: impl ToString) -> Self {
        Self::DuplicateExternalId(id.to_string())
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a required field error.
    pub fn required_field(field: impl Into<String>) -> Self {
        Self::RequiredField {
            field: field.into(),
        }
    }
}

/// Not found errors for specific lookups.
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// No row with the given internal id.
    #[error("Internal id not found: {0}")]
    InternalId(usize),

    /// No document with the given external id.
    #[error("External id not found: {0}")]
    ExternalId(String),

    /// No snapshot at the given directory.
    #[error("Snapshot not found: {0}")]
    Snapshot(PathBuf),

    /// Input file does not exist.
    #[error("File not found: {0}")]
    File(PathBuf),
}

impl NotFoundError {
    /// Creates an internal id not found error.
    pub fn internal_id(id: impl Into<usize>) -> Self {
        Self::InternalId(id.into())
    }

    /// Creates an external id not found error.
    pub fn external_id(id: impl ToString) -> Self {
        Self::ExternalId(id.to_string())
    }
}

/// Snapshot errors.
///
/// Every variant except [`Encode`](Self::Encode) comes from loading and
/// means the snapshot on disk is unusable; the caller should fall back to
/// rebuilding from source data.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot files parse but are internally inconsistent.
    #[error("Snapshot corrupted: {0}")]
    Corrupted(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The in-memory index could not be encoded while saving.
    #[error("Snapshot encoding failed: {0}")]
    Encode(String),

    /// Snapshot written by an incompatible format version.
    #[error("Snapshot format version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Format version this build writes.
        expected: u32,
        /// Format version found on disk.
        found: u32,
    },
}

impl SnapshotError {
    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<bincode::Error> for SnapshotError {
    fn from(err: bincode::Error) -> Self {
        SnapshotError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for SimSearchError {
    fn from(err: bincode::Error) -> Self {
        SimSearchError::Snapshot(SnapshotError::from(err))
    }
}

impl From<serde_json::Error> for SimSearchError {
    fn from(err: serde_json::Error) -> Self {
        SimSearchError::Snapshot(SnapshotError::from(err))
    }
}
