//! Integration tests for the async search provider.
//!
//! Drives [`BlockingSearchProvider`] from a multi-threaded tokio runtime,
//! including many concurrent requests against one shared service.

use std::sync::Arc;

use simsearch::embedding::EmbeddingService;
use simsearch::{
    BlockingSearchProvider, Config, DocumentSource, Embedding, IndexManager, QueryService,
    Result, SearchProvider, SyntheticSource,
};

/// Letter-frequency embedder: deterministic and dense for any text.
struct LetterEmbedder;

impl EmbeddingService for LetterEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let mut counts = vec![0.1f32; 26];
        for c in text.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
            counts[(c - b'a') as usize] += 1.0;
        }
        Ok(counts)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        26
    }
}

/// Provider over a service holding `n` synthetic papers.
fn provider(n: usize) -> BlockingSearchProvider {
    let index = Arc::new(IndexManager::new(Config::default()).unwrap());
    let service = QueryService::new(index, Arc::new(LetterEmbedder));
    service
        .index_documents(SyntheticSource::new(n, 11).documents().unwrap(), 32)
        .unwrap();
    BlockingSearchProvider::new(Arc::new(service))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_and_stats() {
    let provider = provider(50);

    let response = provider
        .search("computer vision object detection".to_string(), 5, None)
        .await
        .unwrap();
    assert_eq!(response.returned, 5);
    assert_eq!(response.query, "computer vision object detection");

    let stats = provider.stats().await.unwrap();
    assert_eq!(stats.total_documents, 50);
    assert_eq!(stats.dimension, Some(26));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_validation_errors_pass_through() {
    let provider = provider(5);
    let err = provider.search(String::new(), 5, None).await.unwrap_err();
    assert!(err.is_validation());

    let err = provider
        .search("robots".to_string(), 5, Some(2.0))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_matches_blocking_service() {
    let index = Arc::new(IndexManager::new(Config::default()).unwrap());
    let service = Arc::new(QueryService::new(index, Arc::new(LetterEmbedder)));
    service
        .index_documents(SyntheticSource::new(30, 2).documents().unwrap(), 10)
        .unwrap();

    let expected = service.search("policy gradient", 4, Some(0.1)).unwrap();
    let provider = BlockingSearchProvider::new(Arc::clone(&service));
    let actual = provider
        .search("policy gradient".to_string(), 4, Some(0.1))
        .await
        .unwrap();
    assert_eq!(actual, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_through_trait_object() {
    let provider: Arc<dyn SearchProvider> = Arc::new(provider(80));

    let queries = [
        "neural networks",
        "language models",
        "robot learning",
        "image processing",
        "game theory",
    ];
    let handles: Vec<_> = (0..20)
        .map(|i| {
            let provider = Arc::clone(&provider);
            let query = queries[i % queries.len()].to_string();
            tokio::spawn(async move { provider.search(query, 3, None).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.returned, 3);
        assert!(response
            .results
            .windows(2)
            .all(|w| w[0].distance <= w[1].distance));
    }
}
