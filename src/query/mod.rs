//! Text-level query and ingestion service.
//!
//! [`QueryService`] glues an [`EmbeddingService`] to an [`IndexManager`]:
//! queries are embedded and searched, corpora are embedded in batches and
//! indexed, and [`bootstrap`](QueryService::bootstrap) loads a snapshot or
//! rebuilds from a [`DocumentSource`].

pub mod provider;

pub use provider::{BlockingSearchProvider, SearchProvider};

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::catalog::DocumentPayload;
use crate::embedding::EmbeddingService;
use crate::error::{Result, SimSearchError, ValidationError};
use crate::index::{IndexManager, IndexStats, SearchResult};
use crate::source::{DocumentSource, SourceDocument};
use crate::types::{Embedding, ExternalId};

/// One ranked hit in a [`SearchResponse`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Caller's document id.
    pub external_id: ExternalId,
    /// Cosine distance to the query.
    pub distance: f32,
    /// Cosine similarity, `1 - distance`.
    pub score: f32,
    /// Document payload.
    pub payload: DocumentPayload,
}

impl From<SearchResult> for SearchHit {
    fn from(result: SearchResult) -> Self {
        Self {
            score: result.similarity(),
            external_id: result.external_id,
            distance: result.distance,
            payload: result.payload,
        }
    }
}

/// Answer to a text query.
///
/// ```json
/// {"query": "...", "results": [...], "totalFound": 12, "returned": 5}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Query text as received.
    pub query: String,
    /// Hits, best first.
    pub results: Vec<SearchHit>,
    /// Candidates found before threshold filtering and truncation.
    pub total_found: usize,
    /// Number of hits in `results`.
    pub returned: usize,
}

/// How [`QueryService::bootstrap`] obtained its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum BootstrapOutcome {
    /// Snapshot found and loaded.
    Loaded {
        /// Documents in the loaded index.
        documents: usize,
    },
    /// No usable snapshot; rebuilt from the source and saved.
    Rebuilt {
        /// Documents indexed from the source.
        documents: usize,
    },
}

impl BootstrapOutcome {
    /// Documents in the index after bootstrap.
    pub fn documents(&self) -> usize {
        match self {
            Self::Loaded { documents } | Self::Rebuilt { documents } => *documents,
        }
    }
}

/// Embeds text and drives an [`IndexManager`].
///
/// Cheap to share: hold it in an `Arc` and hand it to request handlers.
pub struct QueryService {
    index: Arc<IndexManager>,
    embedder: Arc<dyn EmbeddingService>,
}

impl QueryService {
    /// Creates a service over `index` using `embedder` for all text.
    pub fn new(index: Arc<IndexManager>, embedder: Arc<dyn EmbeddingService>) -> Self {
        Self { index, embedder }
    }

    /// The underlying index.
    pub fn index(&self) -> &Arc<IndexManager> {
        &self.index
    }

    /// Searches for documents similar to `query`.
    ///
    /// Without a threshold the `top_k` nearest documents are returned. With
    /// one, hits below the similarity threshold are dropped (see
    /// [`IndexManager::search_with_threshold`]).
    ///
    /// # Errors
    ///
    /// - `RequiredField("query")` for an empty or blank query
    /// - `InvalidField("top_k")` for `top_k == 0`
    /// - `InvalidField("threshold")` for a threshold outside `[-1, 1]`
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub fn search(&self, query: &str, top_k: usize, threshold: Option<f32>) -> Result<SearchResponse> {
        if query.trim().is_empty() {
            return Err(ValidationError::required_field("query").into());
        }
        if top_k == 0 {
            return Err(ValidationError::invalid_field("top_k", "must be greater than 0").into());
        }
        if let Some(t) = threshold {
            if !(-1.0..=1.0).contains(&t) {
                return Err(ValidationError::invalid_field(
                    "threshold",
                    format!("{} is outside [-1, 1]", t),
                )
                .into());
            }
        }

        let embedding = self.embedder.embed(query)?;
        let ef = self.index.config().hnsw.ef_search;

        let (results, total_found) = match threshold {
            Some(t) => {
                let hits = self.index.threshold_hits(&embedding, top_k, t, ef)?;
                (hits.results, hits.candidates)
            }
            None => {
                let results = self.index.search(&embedding, top_k, ef)?;
                let found = results.len();
                (results, found)
            }
        };

        let results: Vec<SearchHit> = results.into_iter().map(SearchHit::from).collect();
        debug!(returned = results.len(), total_found, "Search complete");
        Ok(SearchResponse {
            query: query.to_string(),
            returned: results.len(),
            results,
            total_found,
        })
    }

    /// Current index statistics.
    pub fn stats(&self) -> Result<IndexStats> {
        self.index.stats()
    }

    /// Embeds `docs` in batches of `batch_size` and appends each batch.
    ///
    /// Uses the configured `m` / `ef_construction`. Batches committed before
    /// a failure stay indexed. Returns the number of documents indexed.
    #[instrument(skip(self, docs), fields(documents = docs.len()))]
    pub fn index_documents(&self, docs: Vec<SourceDocument>, batch_size: usize) -> Result<usize> {
        if batch_size == 0 {
            return Err(ValidationError::invalid_field("batch_size", "must be greater than 0").into());
        }
        let hnsw = &self.index.config().hnsw;

        let mut indexed = 0;
        let mut docs = docs.into_iter().peekable();
        while docs.peek().is_some() {
            let chunk: Vec<SourceDocument> = docs.by_ref().take(batch_size).collect();
            let (vectors, external_ids, payloads) = self.embed_documents(chunk)?;
            let count = vectors.len();
            self.index
                .add_batch(vectors, external_ids, payloads, hnsw.ef_construction, hnsw.m)?;
            indexed += count;
            debug!(batch = count, indexed, "Ingested batch");
        }

        info!(indexed, "Documents indexed");
        Ok(indexed)
    }

    /// Embeds every document and replaces the index with them.
    ///
    /// Returns the number of documents in the rebuilt index.
    #[instrument(skip(self, docs), fields(documents = docs.len()))]
    pub fn rebuild_from(&self, docs: Vec<SourceDocument>) -> Result<usize> {
        let config = self.index.config();
        let batch_size = config.ingest_batch_size.max(1);

        let mut vectors = Vec::with_capacity(docs.len());
        let mut external_ids = Vec::with_capacity(docs.len());
        let mut payloads = Vec::with_capacity(docs.len());

        let mut docs = docs.into_iter().peekable();
        while docs.peek().is_some() {
            let chunk: Vec<SourceDocument> = docs.by_ref().take(batch_size).collect();
            let (v, e, p) = self.embed_documents(chunk)?;
            vectors.extend(v);
            external_ids.extend(e);
            payloads.extend(p);
        }

        let total = vectors.len();
        self.index.rebuild(
            vectors,
            external_ids,
            payloads,
            config.hnsw.ef_construction,
            config.hnsw.m,
        )?;
        Ok(total)
    }

    /// Loads the snapshot in `snapshot_dir`, or rebuilds from `source`.
    ///
    /// A missing or corrupt snapshot (corruption is logged) triggers a
    /// rebuild from `source`, after which a fresh snapshot is saved.
    #[instrument(skip(self, source), fields(snapshot_dir = %snapshot_dir.as_ref().display(), source = source.name()))]
    pub fn bootstrap(
        &self,
        snapshot_dir: impl AsRef<Path>,
        source: &dyn DocumentSource,
    ) -> Result<BootstrapOutcome> {
        let dir = snapshot_dir.as_ref();
        match self.index.load_snapshot(dir) {
            Ok(true) => {
                let documents = self.index.len();
                info!(documents, "Bootstrapped from snapshot");
                return Ok(BootstrapOutcome::Loaded { documents });
            }
            Ok(false) => info!("No snapshot found, rebuilding from source"),
            Err(e) if e.is_corrupt_snapshot() => {
                warn!(error = %e, "Snapshot unusable, rebuilding from source");
            }
            Err(e) => return Err(e),
        }

        let docs = source.documents()?;
        let documents = self.rebuild_from(docs)?;
        self.index.save_snapshot(dir)?;
        info!(documents, "Bootstrapped from source");
        Ok(BootstrapOutcome::Rebuilt { documents })
    }

    /// [`bootstrap`](Self::bootstrap) against `Config::snapshot_dir`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no snapshot directory is configured.
    pub fn bootstrap_configured(&self, source: &dyn DocumentSource) -> Result<BootstrapOutcome> {
        let dir = self
            .index
            .config()
            .snapshot_dir
            .clone()
            .ok_or_else(|| SimSearchError::config("snapshot_dir is not set"))?;
        self.bootstrap(dir, source)
    }

    #[allow(clippy::type_complexity)]
    fn embed_documents(
        &self,
        docs: Vec<SourceDocument>,
    ) -> Result<(Vec<Embedding>, Vec<ExternalId>, Vec<DocumentPayload>)> {
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != docs.len() {
            return Err(SimSearchError::embedding(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                docs.len()
            )));
        }

        let (external_ids, payloads) = docs.into_iter().map(|d| (d.id, d.payload)).unzip();
        Ok((vectors, external_ids, payloads))
    }
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("index", &self.index)
            .field("embedding_dimension", &self.embedder.dimension())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    /// Maps text to a 4-d vector from a few keyword counts.
    struct KeywordEmbedder;

    impl EmbeddingService for KeywordEmbedder {
        fn embed(&self, text: &str) -> Result<Embedding> {
            let t = text.to_lowercase();
            Ok(["vision", "language", "robot", "graph"]
                .iter()
                .map(|w| t.matches(w).count() as f32 + 0.01)
                .collect())
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
            texts.iter().map(|t| self.embed(t)).collect()
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    fn service() -> QueryService {
        let index = Arc::new(IndexManager::new(Config::default()).unwrap());
        QueryService::new(index, Arc::new(KeywordEmbedder))
    }

    fn doc(id: &str, title: &str) -> SourceDocument {
        let payload = DocumentPayload::new().with("title", title);
        SourceDocument {
            id: ExternalId::from(id),
            text: title.to_string(),
            payload,
        }
    }

    #[test]
    fn test_query_validation() {
        let service = service();
        let err = service.search("   ", 5, None).unwrap_err();
        assert!(matches!(
            err,
            SimSearchError::Validation(ValidationError::RequiredField { ref field }) if field == "query"
        ));
        assert!(service.search("robot", 0, None).unwrap_err().is_validation());
        assert!(service.search("robot", 5, Some(1.5)).unwrap_err().is_validation());
        assert!(service.search("robot", 5, Some(-1.01)).unwrap_err().is_validation());
    }

    #[test]
    fn test_index_then_search() {
        let service = service();
        let docs = vec![
            doc("v", "vision vision"),
            doc("l", "language models"),
            doc("r", "robot robot robot"),
        ];
        assert_eq!(service.index_documents(docs, 2).unwrap(), 3);

        let response = service.search("a robot", 2, None).unwrap();
        assert_eq!(response.results[0].external_id.as_str(), "r");
        assert_eq!(response.returned, 2);
        assert_eq!(response.total_found, 2);
        let hit = &response.results[0];
        assert!((hit.score - (1.0 - hit.distance)).abs() < 1e-6);
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let response = SearchResponse {
            query: "q".to_string(),
            results: vec![SearchHit {
                external_id: ExternalId::from("a"),
                distance: 0.25,
                score: 0.75,
                payload: DocumentPayload::new(),
            }],
            total_found: 3,
            returned: 1,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["totalFound"], 3);
        assert_eq!(value["results"][0]["externalId"], "a");
        assert_eq!(value["results"][0]["score"], 0.75);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let service = service();
        assert!(service
            .index_documents(vec![doc("a", "graph")], 0)
            .unwrap_err()
            .is_validation());
    }
}
