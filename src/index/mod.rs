//! Index manager: vector store, HNSW graph and document catalog as one unit.
//!
//! # Concurrency
//!
//! The published index state sits behind `RwLock<Arc<_>>`. Searches hold
//! the read lock only long enough to clone the `Arc`, then run without any
//! lock. Writers serialize on a separate gate, build the next state off to
//! the side and publish it with one reference swap, so readers see either
//! the whole batch or none of it.

mod snapshot;
mod state;

pub use snapshot::{SnapshotMetadata, GRAPH_FILE, META_FILE, SNAPSHOT_FORMAT_VERSION};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::catalog::DocumentPayload;
use crate::config::Config;
use crate::error::{Result, SimSearchError, ValidationError};
use crate::graph::{similarity, GraphStats};
use crate::types::{Embedding, ExternalId, InternalId};
use state::{Batch, IndexState};

/// One ranked search hit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    /// Row id inside the index.
    pub internal_id: InternalId,
    /// Caller's document id.
    pub external_id: ExternalId,
    /// Cosine distance to the query (lower is closer).
    pub distance: f32,
    /// Document payload, as indexed.
    pub payload: DocumentPayload,
}

impl SearchResult {
    /// Cosine similarity, `1 - distance`.
    pub fn similarity(&self) -> f32 {
        similarity(self.distance)
    }
}

/// Index statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Documents in the catalog.
    pub total_documents: usize,
    /// Established vector dimension, `None` before the first insert.
    pub dimension: Option<usize>,
    /// Current soft capacity.
    pub max_capacity: usize,
    /// Nodes in the graph.
    pub current_count: usize,
    /// Construction beam width in effect.
    pub ef_construction: usize,
    /// Max neighbors per node in effect.
    pub m: usize,
}

/// Threshold search output before the caller shapes it.
pub(crate) struct ThresholdHits {
    pub(crate) results: Vec<SearchResult>,
    pub(crate) candidates: usize,
}

/// Owns the published index state and serializes writers.
///
/// Share it as `Arc<IndexManager>`; every method takes `&self`.
///
/// # Example
///
/// ```rust
/// use simsearch::{Config, DocumentPayload, ExternalId, IndexManager};
///
/// let index = IndexManager::new(Config::default())?;
/// index.add_batch(
///     vec![vec![1.0, 0.0], vec![0.0, 1.0]],
///     vec![ExternalId::from("a"), ExternalId::from("b")],
///     vec![DocumentPayload::new(), DocumentPayload::new()],
///     200,
///     16,
/// )?;
///
/// let hits = index.search(&[0.9, 0.1], 1, 50)?;
/// assert_eq!(hits[0].external_id.as_str(), "a");
/// # Ok::<(), simsearch::SimSearchError>(())
/// ```
pub struct IndexManager {
    config: Config,
    state: RwLock<Arc<IndexState>>,
    writer: Mutex<()>,
}

impl IndexManager {
    /// Creates an empty index.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `config` is invalid.
    #[instrument(skip(config))]
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let state = IndexState::empty(&config);
        debug!(
            max_elements = config.hnsw.max_elements,
            expected_dimension = ?config.dimension(),
            "Index manager created"
        );
        Ok(Self {
            config,
            state: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
        })
    }

    /// Configuration this index was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn current(&self) -> Result<Arc<IndexState>> {
        self.state
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| SimSearchError::index("Index state lock poisoned"))
    }

    fn publish(&self, next: IndexState) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| SimSearchError::index("Index state lock poisoned"))?;
        *guard = Arc::new(next);
        Ok(())
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, ()>> {
        self.writer
            .lock()
            .map_err(|_| SimSearchError::index("Index writer lock poisoned"))
    }

    /// Appends a batch of documents.
    ///
    /// The first non-empty batch fixes the dimension (unless the config pins
    /// one) and the graph parameters `m` / `ef_construction`. Later batches
    /// reuse the established parameters.
    ///
    /// The batch is validated in full before anything changes and becomes
    /// visible to searches all at once.
    ///
    /// # Errors
    ///
    /// - `BatchLengthMismatch` if the three lists differ in length
    /// - `DimensionMismatch` if any vector has the wrong length
    /// - `DuplicateExternalId` under [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject)
    #[instrument(skip_all, fields(batch = vectors.len()))]
    pub fn add_batch(
        &self,
        vectors: Vec<Embedding>,
        external_ids: Vec<ExternalId>,
        payloads: Vec<DocumentPayload>,
        ef_construction: usize,
        m: usize,
    ) -> Result<()> {
        let _writer = self.lock_writer()?;
        let current = self.current()?;

        let dimension =
            current.validate_batch(&self.config, &vectors, &external_ids, &payloads)?;
        if vectors.is_empty() {
            return Ok(());
        }

        let added = vectors.len();
        let mut next = IndexState::clone(&current);
        next.append_batch(
            &self.config,
            dimension,
            Batch {
                vectors,
                external_ids,
                payloads,
            },
            ef_construction,
            m,
        )?;
        let total = next.len();
        self.publish(next)?;

        info!(added, total, dimension, "Batch committed");
        Ok(())
    }

    /// Replaces the whole index with a freshly built one.
    ///
    /// Validation is the same as [`add_batch`](Self::add_batch), against an
    /// empty index. An empty corpus yields an empty, uninitialized index.
    /// Searches keep using the old state until the new one is complete.
    #[instrument(skip_all, fields(documents = vectors.len()))]
    pub fn rebuild(
        &self,
        vectors: Vec<Embedding>,
        external_ids: Vec<ExternalId>,
        payloads: Vec<DocumentPayload>,
        ef_construction: usize,
        m: usize,
    ) -> Result<()> {
        let _writer = self.lock_writer()?;

        let mut next = IndexState::empty(&self.config);
        let dimension = next.validate_batch(&self.config, &vectors, &external_ids, &payloads)?;
        next.append_batch(
            &self.config,
            dimension,
            Batch {
                vectors,
                external_ids,
                payloads,
            },
            ef_construction,
            m,
        )?;
        let total = next.len();
        self.publish(next)?;

        info!(total, "Index rebuilt");
        Ok(())
    }

    /// Returns the `k` nearest documents to `query`.
    ///
    /// Results are in ascending distance, ties broken by lower internal id.
    /// The beam width is `max(ef, k)`. An empty index returns no results.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the dimension is established and
    /// `query` has a different length.
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<SearchResult>> {
        let state = self.current()?;
        search_state(&state, query, k, ef)
    }

    /// Returns up to `k` documents with similarity `>= threshold`.
    ///
    /// Fetches `min(3k, len)` raw candidates with beam `max(ef, fetch)`,
    /// filters by similarity and keeps the best `k`. Results are in
    /// descending similarity.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the dimension is established and
    /// `query` has a different length.
    pub fn search_with_threshold(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
        ef: usize,
    ) -> Result<Vec<SearchResult>> {
        Ok(self.threshold_hits(query, k, threshold, ef)?.results)
    }

    pub(crate) fn threshold_hits(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
        ef: usize,
    ) -> Result<ThresholdHits> {
        let state = self.current()?;
        let fetch = k.saturating_mul(3).min(state.len());
        let candidates = search_state(&state, query, fetch, ef.max(fetch))?;
        let found = candidates.len();
        let results = candidates
            .into_iter()
            .filter(|hit| hit.similarity() >= threshold)
            .take(k)
            .collect();
        Ok(ThresholdHits {
            results,
            candidates: found,
        })
    }

    /// Writes a snapshot of the current state into `dir`.
    ///
    /// Creates `dir` if needed. Each file is written to a temporary sibling
    /// and renamed into place.
    #[instrument(skip(self), fields(dir = %dir.as_ref().display()))]
    pub fn save_snapshot(&self, dir: impl AsRef<Path>) -> Result<()> {
        let state = self.current()?;
        snapshot::write(dir.as_ref(), &state)?;
        info!(documents = state.len(), "Snapshot saved");
        Ok(())
    }

    /// Replaces the current state with the snapshot in `dir`.
    ///
    /// Returns `Ok(false)` if either snapshot file is missing; the current
    /// state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a snapshot error if the files cannot be parsed or disagree
    /// with each other, and `DimensionMismatch` if the snapshot conflicts
    /// with the configured dimension.
    #[instrument(skip(self), fields(dir = %dir.as_ref().display()))]
    pub fn load_snapshot(&self, dir: impl AsRef<Path>) -> Result<bool> {
        let _writer = self.lock_writer()?;

        let Some(loaded) = snapshot::read(dir.as_ref())? else {
            debug!("No snapshot found");
            return Ok(false);
        };
        if let (Some(expected), Some(got)) = (self.config.dimension(), loaded.dimension()) {
            if expected != got {
                return Err(ValidationError::dimension_mismatch(expected, got).into());
            }
        }

        let documents = loaded.len();
        self.publish(loaded)?;
        info!(documents, "Snapshot loaded");
        Ok(true)
    }

    /// Reads only the snapshot's JSON sidecar, for diagnostics.
    ///
    /// Returns `Ok(None)` if there is no sidecar in `dir`.
    pub fn read_snapshot_metadata(dir: impl AsRef<Path>) -> Result<Option<SnapshotMetadata>> {
        snapshot::read_metadata(dir.as_ref())
    }

    /// Deletes the snapshot files in `dir`, if present.
    pub fn remove_snapshot(dir: impl AsRef<Path>) -> Result<()> {
        snapshot::remove(dir.as_ref())
    }

    /// Current index statistics.
    pub fn stats(&self) -> Result<IndexStats> {
        let state = self.current()?;
        let params = state.graph.params();
        Ok(IndexStats {
            total_documents: state.catalog.len(),
            dimension: state.dimension(),
            max_capacity: state.capacity,
            current_count: state.graph.len(),
            ef_construction: params.ef_construction,
            m: params.m,
        })
    }

    /// Graph shape diagnostics.
    pub fn graph_stats(&self) -> Result<GraphStats> {
        Ok(self.current()?.graph.stats())
    }

    /// Returns the external id and payload for `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no document has that id.
    pub fn get_document(&self, id: InternalId) -> Result<(ExternalId, DocumentPayload)> {
        let state = self.current()?;
        let (external_id, payload) = state.catalog.get(id)?;
        Ok((external_id.clone(), payload.clone()))
    }

    /// All documents carrying `external_id`, in insertion order.
    pub fn find_by_external_id(&self, external_id: &str) -> Result<Vec<(InternalId, DocumentPayload)>> {
        let state = self.current()?;
        state
            .catalog
            .lookup(external_id)
            .iter()
            .map(|&id| {
                let (_, payload) = state.catalog.get(id)?;
                Ok((id, payload.clone()))
            })
            .collect()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.current().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Established vector dimension, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.current().ok().and_then(|s| s.dimension())
    }
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (documents, dimension) = self
            .current()
            .map(|s| (s.len(), s.dimension()))
            .unwrap_or((0, None));
        f.debug_struct("IndexManager")
            .field("documents", &documents)
            .field("dimension", &dimension)
            .finish_non_exhaustive()
    }
}

fn search_state(state: &IndexState, query: &[f32], k: usize, ef: usize) -> Result<Vec<SearchResult>> {
    let Some(store) = state.vectors.as_ref() else {
        return Ok(Vec::new());
    };
    if query.len() != store.dimension() {
        return Err(ValidationError::dimension_mismatch(store.dimension(), query.len()).into());
    }

    state
        .graph
        .search(query, k, ef, store)
        .into_iter()
        .map(|(id, distance)| {
            let (external_id, payload) = state.catalog.get(id)?;
            Ok(SearchResult {
                internal_id: id,
                external_id: external_id.clone(),
                distance,
                payload: payload.clone(),
            })
        })
        .collect()
}
