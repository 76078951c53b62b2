//! Async facade over [`QueryService`] for async request handlers.

use std::sync::Arc;

use async_trait::async_trait;

use super::{QueryService, SearchResponse};
use crate::error::{Result, SimSearchError};
use crate::index::IndexStats;

/// Async search boundary consumed by request handlers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// See [`QueryService::search`].
    async fn search(
        &self,
        query: String,
        top_k: usize,
        threshold: Option<f32>,
    ) -> Result<SearchResponse>;

    /// See [`QueryService::stats`].
    async fn stats(&self) -> Result<IndexStats>;
}

/// Runs each call on tokio's blocking pool.
///
/// Embedding and graph search are CPU-bound, so they stay off the async
/// worker threads. Must be used from within a tokio runtime.
#[derive(Clone, Debug)]
pub struct BlockingSearchProvider {
    service: Arc<QueryService>,
}

impl BlockingSearchProvider {
    /// Wraps a shared query service.
    pub fn new(service: Arc<QueryService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SearchProvider for BlockingSearchProvider {
    async fn search(
        &self,
        query: String,
        top_k: usize,
        threshold: Option<f32>,
    ) -> Result<SearchResponse> {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || service.search(&query, top_k, threshold))
            .await
            .map_err(|e| SimSearchError::internal(format!("search task failed: {}", e)))?
    }

    async fn stats(&self) -> Result<IndexStats> {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || service.stats())
            .await
            .map_err(|e| SimSearchError::internal(format!("stats task failed: {}", e)))?
    }
}
