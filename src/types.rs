//! Core type definitions for SimSearch identifiers and vectors.
//!
//! Two identifier spaces exist side by side:
//! - [`InternalId`] is the dense row index used by the vector store and graph
//! - [`ExternalId`] is the caller's own document identifier

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Embedding vector type.
///
/// All vectors in one index share the same length, fixed by the first
/// insertion.
pub type Embedding = Vec<f32>;

/// Dense, zero-based row identifier assigned at insertion time.
///
/// Monotonically increasing and never reused within a live index. Only a
/// full rebuild renumbers documents.
///
/// # Example
/// ```
/// use simsearch::InternalId;
///
/// let id = InternalId(3);
/// assert_eq!(id.index(), 3);
/// assert_eq!(id.to_string(), "#3");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InternalId(pub usize);

impl InternalId {
    /// Returns the id as a row index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for InternalId {
    #[inline]
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<InternalId> for usize {
    #[inline]
    fn from(id: InternalId) -> Self {
        id.0
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Caller-supplied document identifier (e.g. `"paper_000123"`).
///
/// Uniqueness is not enforced unless the index runs with
/// [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject).
///
/// # Example
/// ```
/// use simsearch::ExternalId;
///
/// let id = ExternalId::from("paper_000123");
/// assert_eq!(id.as_str(), "paper_000123");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    /// Creates an external id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for ExternalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExternalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ExternalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
