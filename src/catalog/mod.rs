//! Document catalog: internal id → external id + payload.
//!
//! The catalog grows in lockstep with the vector store. Entry `i` describes
//! row `i`; a reverse map answers "which rows carry this external id".

mod types;

pub use types::{DocumentPayload, FieldValue};

use std::collections::HashMap;

use crate::error::{NotFoundError, Result, ValidationError};
use crate::types::{ExternalId, InternalId};

/// Append-only mapping from [`InternalId`] to document identity and payload.
///
/// # Example
/// ```
/// use simsearch::catalog::DocumentCatalog;
/// use simsearch::{DocumentPayload, ExternalId, InternalId};
///
/// let mut catalog = DocumentCatalog::new();
/// catalog
///     .put(InternalId(0), ExternalId::from("paper_000000"), DocumentPayload::new())
///     .unwrap();
///
/// let (ext, _) = catalog.get(InternalId(0)).unwrap();
/// assert_eq!(ext.as_str(), "paper_000000");
/// assert_eq!(catalog.lookup("paper_000000"), &[InternalId(0)]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DocumentCatalog {
    external_ids: Vec<ExternalId>,
    payloads: Vec<DocumentPayload>,
    by_external: HashMap<ExternalId, Vec<InternalId>>,
}

impl DocumentCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty catalog with room for `capacity` documents.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            external_ids: Vec::with_capacity(capacity),
            payloads: Vec::with_capacity(capacity),
            by_external: HashMap::with_capacity(capacity),
        }
    }

    /// Rebuilds a catalog from index-aligned id and payload lists.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the two lists differ in length.
    pub fn from_parts(external_ids: Vec<ExternalId>, payloads: Vec<DocumentPayload>) -> Result<Self> {
        if external_ids.len() != payloads.len() {
            return Err(ValidationError::invalid_field(
                "payloads",
                format!(
                    "{} payloads for {} external ids",
                    payloads.len(),
                    external_ids.len()
                ),
            )
            .into());
        }

        let mut by_external: HashMap<ExternalId, Vec<InternalId>> =
            HashMap::with_capacity(external_ids.len());
        for (i, ext) in external_ids.iter().enumerate() {
            by_external.entry(ext.clone()).or_default().push(InternalId(i));
        }

        Ok(Self {
            external_ids,
            payloads,
            by_external,
        })
    }

    /// Records the document for `id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfOrderInsert` unless `id` is exactly the next row.
    pub fn put(&mut self, id: InternalId, external_id: ExternalId, payload: DocumentPayload) -> Result<()> {
        let expected = self.external_ids.len();
        if id.index() != expected {
            return Err(ValidationError::OutOfOrderInsert {
                expected,
                got: id.index(),
            }
            .into());
        }

        self.by_external
            .entry(external_id.clone())
            .or_default()
            .push(id);
        self.external_ids.push(external_id);
        self.payloads.push(payload);
        Ok(())
    }

    /// Returns the external id and payload for `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no document has that id.
    pub fn get(&self, id: InternalId) -> Result<(&ExternalId, &DocumentPayload)> {
        let i = id.index();
        match (self.external_ids.get(i), self.payloads.get(i)) {
            (Some(ext), Some(payload)) => Ok((ext, payload)),
            _ => Err(NotFoundError::internal_id(id).into()),
        }
    }

    /// All internal ids carrying `external_id`, in insertion order.
    pub fn lookup(&self, external_id: &str) -> &[InternalId] {
        self.by_external
            .get(external_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if any document carries `external_id`.
    pub fn contains_external(&self, external_id: &str) -> bool {
        self.by_external.contains_key(external_id)
    }

    /// Number of documents.
    #[inline]
    pub fn len(&self) -> usize {
        self.external_ids.len()
    }

    /// Returns true if the catalog is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.external_ids.is_empty()
    }

    /// External ids in internal id order.
    pub fn external_ids(&self) -> &[ExternalId] {
        &self.external_ids
    }

    /// Payloads in internal id order.
    pub fn payloads(&self) -> &[DocumentPayload] {
        &self.payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: &str) -> DocumentPayload {
        DocumentPayload::new().with("title", title)
    }

    #[test]
    fn test_put_and_get() {
        let mut catalog = DocumentCatalog::new();
        catalog
            .put(InternalId(0), ExternalId::from("a"), payload("A"))
            .unwrap();
        catalog
            .put(InternalId(1), ExternalId::from("b"), payload("B"))
            .unwrap();

        let (ext, p) = catalog.get(InternalId(1)).unwrap();
        assert_eq!(ext.as_str(), "b");
        assert_eq!(p.text("title"), Some("B"));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_get_missing() {
        let catalog = DocumentCatalog::new();
        assert!(catalog.get(InternalId(0)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_out_of_order_put_rejected() {
        let mut catalog = DocumentCatalog::new();
        let err = catalog
            .put(InternalId(3), ExternalId::from("x"), payload("X"))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(catalog.is_empty());
        assert!(!catalog.contains_external("x"));
    }

    #[test]
    fn test_duplicate_external_ids_map_to_distinct_rows() {
        let mut catalog = DocumentCatalog::new();
        catalog
            .put(InternalId(0), ExternalId::from("dup"), payload("first"))
            .unwrap();
        catalog
            .put(InternalId(1), ExternalId::from("dup"), payload("second"))
            .unwrap();

        assert_eq!(catalog.lookup("dup"), &[InternalId(0), InternalId(1)]);
        assert!(catalog.lookup("missing").is_empty());
    }

    #[test]
    fn test_from_parts() {
        let catalog = DocumentCatalog::from_parts(
            vec![ExternalId::from("a"), ExternalId::from("a")],
            vec![payload("1"), payload("2")],
        )
        .unwrap();
        assert_eq!(catalog.lookup("a").len(), 2);

        let err = DocumentCatalog::from_parts(vec![ExternalId::from("a")], vec![]).unwrap_err();
        assert!(err.is_validation());
    }
}
