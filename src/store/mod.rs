//! Append-only vector storage.
//!
//! [`VectorStore`] keeps every embedding in one contiguous `Vec<f32>`,
//! row `i` occupying `data[i * D..(i + 1) * D]`. Rows are never mutated or
//! removed; the row index is the document's [`InternalId`].

use crate::error::{NotFoundError, Result, SimSearchError, ValidationError};
use crate::types::InternalId;

/// Contiguous, append-only store of fixed-dimension vectors.
///
/// # Example
/// ```
/// use simsearch::store::VectorStore;
///
/// let mut store = VectorStore::new(3);
/// let id = store.append(&[1.0, 0.0, 0.0]).unwrap();
/// assert_eq!(id.index(), 0);
/// assert_eq!(store.get(id).unwrap(), &[1.0, 0.0, 0.0]);
/// assert!(store.append(&[1.0, 0.0]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct VectorStore {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorStore {
    /// Creates an empty store for vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Creates an empty store with room for `capacity` vectors.
    pub fn with_capacity(dimension: usize, capacity: usize) -> Self {
        Self {
            dimension,
            data: Vec::with_capacity(dimension.saturating_mul(capacity)),
        }
    }

    /// Rebuilds a store from flat row-major data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if `dimension` is 0 or `data` is not a whole
    /// number of rows.
    pub fn from_flat(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 {
            return Err(ValidationError::invalid_field("dimension", "must be greater than 0").into());
        }
        if data.len() % dimension != 0 {
            return Err(ValidationError::invalid_field(
                "vectors",
                format!(
                    "{} values is not a multiple of dimension {}",
                    data.len(),
                    dimension
                ),
            )
            .into());
        }
        Ok(Self { dimension, data })
    }

    /// Appends a vector and returns its row id.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `vector.len() != dimension()`.
    pub fn append(&mut self, vector: &[f32]) -> Result<InternalId> {
        if vector.len() != self.dimension {
            return Err(SimSearchError::Validation(
                ValidationError::dimension_mismatch(self.dimension, vector.len()),
            ));
        }
        let id = InternalId(self.len());
        self.data.extend_from_slice(vector);
        Ok(id)
    }

    /// Returns the vector stored at `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is past the end of the store.
    pub fn get(&self, id: InternalId) -> Result<&[f32]> {
        self.row(id.index())
            .ok_or_else(|| NotFoundError::internal_id(id).into())
    }

    /// Row access without error construction, for hot graph loops.
    #[inline]
    pub(crate) fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Number of stored vectors.
    #[inline]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    /// Returns true if no vectors are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fixed vector dimension of this store.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// All rows as one contiguous slice.
    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }

    /// Iterates rows in id order.
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dimension.max(1))
    }

    /// Reserves room for `additional` more vectors.
    pub fn reserve(&mut self, additional: usize) {
        self.data
            .reserve(additional.saturating_mul(self.dimension));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_dense_ids() {
        let mut store = VectorStore::new(2);
        assert!(store.is_empty());
        assert_eq!(store.append(&[1.0, 2.0]).unwrap(), InternalId(0));
        assert_eq!(store.append(&[3.0, 4.0]).unwrap(), InternalId(1));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(InternalId(1)).unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn test_dimension_mismatch_leaves_store_unchanged() {
        let mut store = VectorStore::new(3);
        store.append(&[0.0, 0.0, 1.0]).unwrap();

        let err = store.append(&[1.0, 2.0]).unwrap_err();
        assert!(err.is_dimension_mismatch());
        assert_eq!(store.len(), 1);
        assert_eq!(store.as_flat().len(), 3);
    }

    #[test]
    fn test_get_out_of_range() {
        let store = VectorStore::new(4);
        let err = store.get(InternalId(0)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_from_flat_validates_shape() {
        let store = VectorStore::from_flat(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.iter().count(), 2);

        assert!(VectorStore::from_flat(2, vec![1.0, 2.0, 3.0]).is_err());
        assert!(VectorStore::from_flat(0, vec![]).is_err());
    }
}
