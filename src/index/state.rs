//! Immutable-once-published index state and batch application.
//!
//! An [`IndexState`] is built off to the side (cloned or fresh), mutated by
//! [`IndexState::append_batch`], then published by the manager as a whole.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::catalog::{DocumentCatalog, DocumentPayload};
use crate::config::Config;
use crate::error::{Result, ValidationError};
use crate::graph::{GraphParams, HnswGraph};
use crate::store::VectorStore;
use crate::types::{Embedding, ExternalId};

/// Vector store, graph and catalog kept in lockstep.
#[derive(Clone, Debug)]
pub(crate) struct IndexState {
    /// Absent until the first vector fixes the dimension.
    pub(crate) vectors: Option<VectorStore>,
    pub(crate) graph: HnswGraph,
    pub(crate) catalog: DocumentCatalog,
    /// Soft element limit; doubles when exceeded.
    pub(crate) capacity: usize,
}

impl IndexState {
    /// Creates an empty, uninitialized state from configuration defaults.
    pub(crate) fn empty(config: &Config) -> Self {
        Self {
            vectors: None,
            graph: HnswGraph::new(graph_params(
                config,
                config.hnsw.m,
                config.hnsw.ef_construction,
            )),
            catalog: DocumentCatalog::new(),
            capacity: config.hnsw.max_elements,
        }
    }

    /// Established vector dimension, if any.
    pub(crate) fn dimension(&self) -> Option<usize> {
        self.vectors.as_ref().map(VectorStore::dimension)
    }

    /// Number of indexed documents.
    pub(crate) fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Checks a batch against this state without touching it.
    ///
    /// Returns the dimension every vector must have.
    pub(crate) fn validate_batch(
        &self,
        config: &Config,
        vectors: &[Embedding],
        external_ids: &[ExternalId],
        payloads: &[DocumentPayload],
    ) -> Result<usize> {
        if vectors.len() != external_ids.len() || vectors.len() != payloads.len() {
            return Err(ValidationError::batch_length_mismatch(
                vectors.len(),
                external_ids.len(),
                payloads.len(),
            )
            .into());
        }
        if vectors.is_empty() {
            return Ok(self.dimension().unwrap_or(0));
        }

        let expected = self
            .dimension()
            .or_else(|| config.dimension())
            .or_else(|| vectors.first().map(Vec::len))
            .unwrap_or(0);
        if expected == 0 {
            return Err(ValidationError::invalid_field("vectors", "vectors must not be empty").into());
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(ValidationError::dimension_mismatch(expected, bad.len()).into());
        }
        for (i, payload) in payloads.iter().enumerate() {
            if let Some(field) = payload.non_finite_field() {
                return Err(ValidationError::invalid_field(
                    format!("payloads[{}].{}", i, field),
                    "float values must be finite",
                )
                .into());
            }
        }

        if config.duplicate_policy.is_reject() {
            let mut seen: HashSet<&str> = HashSet::with_capacity(external_ids.len());
            for id in external_ids {
                if self.catalog.contains_external(id.as_str()) || !seen.insert(id.as_str()) {
                    return Err(ValidationError::duplicate_external_id(id).into());
                }
            }
        }

        Ok(expected)
    }

    /// Appends an already validated batch: store append, graph insert, then
    /// catalog put for each item.
    ///
    /// The first batch fixes the dimension and graph parameters. Later
    /// batches keep the established parameters.
    pub(crate) fn append_batch(
        &mut self,
        config: &Config,
        dimension: usize,
        batch: Batch,
        ef_construction: usize,
        m: usize,
    ) -> Result<()> {
        let Batch {
            vectors,
            external_ids,
            payloads,
        } = batch;
        if vectors.is_empty() {
            return Ok(());
        }

        if self.vectors.is_none() {
            self.graph = HnswGraph::new(graph_params(config, m, ef_construction));
            self.vectors = Some(VectorStore::with_capacity(dimension, vectors.len()));
        } else {
            let params = self.graph.params();
            if params.m != m.max(2) || params.ef_construction != ef_construction.max(1) {
                warn!(
                    requested_m = m,
                    requested_ef_construction = ef_construction,
                    m = params.m,
                    ef_construction = params.ef_construction,
                    "Ignoring graph parameters; index already initialized"
                );
            }
        }

        let needed = self.len() + vectors.len();
        if needed > self.capacity {
            let mut capacity = self.capacity.max(1);
            while capacity < needed {
                capacity = capacity.saturating_mul(2);
            }
            debug!(from = self.capacity, to = capacity, "Growing index capacity");
            self.capacity = capacity;
        }

        let Some(store) = self.vectors.as_mut() else {
            return Ok(());
        };
        store.reserve(vectors.len());

        for ((vector, external_id), payload) in vectors.iter().zip(external_ids).zip(payloads) {
            let id = store.append(vector)?;
            self.graph.insert(id, store)?;
            self.catalog.put(id, external_id, payload)?;
        }
        Ok(())
    }
}

/// One batch of documents, index-aligned.
#[derive(Debug, Default)]
pub(crate) struct Batch {
    pub(crate) vectors: Vec<Embedding>,
    pub(crate) external_ids: Vec<ExternalId>,
    pub(crate) payloads: Vec<DocumentPayload>,
}

fn graph_params(config: &Config, m: usize, ef_construction: usize) -> GraphParams {
    GraphParams::new(
        m,
        ef_construction,
        config.hnsw.level_multiplier,
        config.hnsw.seed,
    )
}
