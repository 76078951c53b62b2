//! Integration tests for the query service.
//!
//! Tests text ingestion in batches, text search, and the snapshot-or-rebuild
//! bootstrap against synthetic and file-backed corpora.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use simsearch::embedding::{EmbeddingService, ExternalEmbedding};
use simsearch::index::GRAPH_FILE;
use simsearch::{
    BootstrapOutcome, Config, DocumentSource, Embedding, IndexManager, QueryService, Result,
    SimSearchError, SourceDocument, SyntheticSource,
};
use tempfile::tempdir;

/// Vocabulary the test embedder counts occurrences of.
const VOCAB: [&str; 8] = [
    "vision", "language", "robot", "reinforcement", "neural", "image", "text", "learning",
];

/// Bag-of-words embedder over [`VOCAB`] that counts batch calls.
#[derive(Default)]
struct VocabEmbedder {
    batch_calls: AtomicUsize,
}

impl EmbeddingService for VocabEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let text = text.to_lowercase();
        Ok(VOCAB
            .iter()
            .map(|w| text.matches(w).count() as f32 + 0.05)
            .collect())
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        VOCAB.len()
    }
}

/// Embedder whose batches always come back one vector short.
struct ShortEmbedder;

impl EmbeddingService for ShortEmbedder {
    fn embed(&self, _text: &str) -> Result<Embedding> {
        Ok(vec![1.0; 4])
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(vec![vec![1.0; 4]; texts.len().saturating_sub(1)])
    }

    fn dimension(&self) -> usize {
        4
    }
}

fn service_with(embedder: Arc<dyn EmbeddingService>) -> QueryService {
    let index = Arc::new(IndexManager::new(Config::default()).unwrap());
    QueryService::new(index, embedder)
}

// ============================================================================
// Ingestion
// ============================================================================

#[test]
fn test_index_documents_in_batches() {
    let embedder = Arc::new(VocabEmbedder::default());
    let service = service_with(embedder.clone());
    let docs = SyntheticSource::new(25, 3).documents().unwrap();

    assert_eq!(service.index_documents(docs, 10).unwrap(), 25);
    assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 3);

    let stats = service.stats().unwrap();
    assert_eq!(stats.total_documents, 25);
    assert_eq!(stats.dimension, Some(VOCAB.len()));
    assert_eq!(stats.m, 16);
    assert_eq!(stats.ef_construction, 200);
}

#[test]
fn test_search_by_text() {
    let service = service_with(Arc::new(VocabEmbedder::default()));
    service
        .index_documents(SyntheticSource::new(20, 1).documents().unwrap(), 8)
        .unwrap();

    let response = service
        .search("robot robot autonomous robot learning", 3, None)
        .unwrap();
    assert_eq!(response.returned, 3);
    let top = &response.results[0];
    let title = top.payload.text("title").unwrap();
    assert!(title.contains("Robot"), "unexpected top hit {}", title);
    assert!(response
        .results
        .windows(2)
        .all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn test_external_embedding_cannot_search_text() {
    let service = service_with(Arc::new(ExternalEmbedding::new(8)));
    let err = service.search("anything", 3, None).unwrap_err();
    assert!(matches!(err, SimSearchError::Embedding(_)));
}

#[test]
fn test_short_embedder_output_rejected() {
    let service = service_with(Arc::new(ShortEmbedder));
    let docs = SyntheticSource::new(3, 0).documents().unwrap();
    let err = service.index_documents(docs, 3).unwrap_err();
    assert!(matches!(err, SimSearchError::Embedding(_)));
    assert!(service.index().is_empty());
}

#[test]
fn test_rebuild_from_replaces_index() {
    let service = service_with(Arc::new(VocabEmbedder::default()));
    service
        .index_documents(SyntheticSource::new(30, 1).documents().unwrap(), 10)
        .unwrap();

    let docs: Vec<SourceDocument> = SyntheticSource::new(7, 2).documents().unwrap();
    assert_eq!(service.rebuild_from(docs).unwrap(), 7);
    assert_eq!(service.index().len(), 7);
}

// ============================================================================
// Bootstrap
// ============================================================================

#[test]
fn test_bootstrap_rebuilds_then_loads() {
    let dir = tempdir().unwrap();
    let source = SyntheticSource::new(40, 9);

    let first = service_with(Arc::new(VocabEmbedder::default()));
    let outcome = first.bootstrap(dir.path(), &source).unwrap();
    assert_eq!(outcome, BootstrapOutcome::Rebuilt { documents: 40 });
    assert!(dir.path().join(GRAPH_FILE).exists());

    let second = service_with(Arc::new(VocabEmbedder::default()));
    let outcome = second.bootstrap(dir.path(), &source).unwrap();
    assert_eq!(outcome, BootstrapOutcome::Loaded { documents: 40 });
    assert_eq!(outcome.documents(), 40);

    let a = first.search("neural learning", 5, None).unwrap();
    let b = second.search("neural learning", 5, None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_bootstrap_recovers_from_corrupt_snapshot() {
    let dir = tempdir().unwrap();
    let source = SyntheticSource::new(12, 4);

    service_with(Arc::new(VocabEmbedder::default()))
        .bootstrap(dir.path(), &source)
        .unwrap();
    fs::write(dir.path().join(GRAPH_FILE), [0xFFu8; 16]).unwrap();

    let service = service_with(Arc::new(VocabEmbedder::default()));
    let outcome = service.bootstrap(dir.path(), &source).unwrap();
    assert_eq!(outcome, BootstrapOutcome::Rebuilt { documents: 12 });

    // The rewritten snapshot is usable again
    let again = service_with(Arc::new(VocabEmbedder::default()));
    assert!(matches!(
        again.bootstrap(dir.path(), &source).unwrap(),
        BootstrapOutcome::Loaded { documents: 12 }
    ));
}

#[test]
fn test_bootstrap_from_empty_source() {
    let dir = tempdir().unwrap();
    let service = service_with(Arc::new(VocabEmbedder::default()));
    let outcome = service
        .bootstrap(dir.path(), &SyntheticSource::new(0, 0))
        .unwrap();
    assert_eq!(outcome.documents(), 0);
    assert!(service.index().is_empty());
}

#[test]
fn test_bootstrap_configured_dir() {
    let dir = tempdir().unwrap();
    let config = Config {
        snapshot_dir: Some(dir.path().join("vector_index")),
        ..Default::default()
    };
    let index = Arc::new(IndexManager::new(config).unwrap());
    let service = QueryService::new(index, Arc::new(VocabEmbedder::default()));

    let outcome = service
        .bootstrap_configured(&SyntheticSource::new(6, 0))
        .unwrap();
    assert_eq!(outcome, BootstrapOutcome::Rebuilt { documents: 6 });
    assert!(dir.path().join("vector_index").join(GRAPH_FILE).exists());
}

#[test]
fn test_bootstrap_configured_without_dir() {
    let service = service_with(Arc::new(VocabEmbedder::default()));
    let err = service
        .bootstrap_configured(&SyntheticSource::new(6, 0))
        .unwrap_err();
    assert!(matches!(err, SimSearchError::Config { .. }));
}

#[test]
fn test_bootstrap_outcome_serializes_tagged() {
    let value = serde_json::to_value(BootstrapOutcome::Loaded { documents: 3 }).unwrap();
    assert_eq!(value["outcome"], "loaded");
    assert_eq!(value["documents"], 3);
}
