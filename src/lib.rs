//! # SimSearch
//!
//! Embedded vector similarity search over document corpora.
//!
//! SimSearch keeps embedding vectors in an HNSW graph, pairs every vector
//! with the caller's document id and payload, and persists both as a
//! snapshot so a restart does not require re-embedding the corpus.
//!
//! ## Quick Start
//!
//! ```rust
//! use simsearch::{Config, DocumentPayload, ExternalId, IndexManager};
//!
//! let index = IndexManager::new(Config::default())?;
//!
//! // Index pre-computed embeddings with their payloads
//! index.add_batch(
//!     vec![vec![0.9, 0.1, 0.0], vec![0.0, 0.2, 0.9]],
//!     vec![ExternalId::from("paper_000001"), ExternalId::from("paper_000002")],
//!     vec![
//!         DocumentPayload::new().with("title", "Graph Search"),
//!         DocumentPayload::new().with("title", "Robot Learning"),
//!     ],
//!     200,
//!     16,
//! )?;
//!
//! // Nearest neighbors of a query vector
//! let hits = index.search(&[1.0, 0.0, 0.0], 1, 50)?;
//! assert_eq!(hits[0].external_id.as_str(), "paper_000001");
//!
//! // Persist and restore
//! let dir = tempfile::tempdir().unwrap();
//! index.save_snapshot(dir.path())?;
//! let restored = IndexManager::new(Config::default())?;
//! assert!(restored.load_snapshot(dir.path())?);
//! # Ok::<(), simsearch::SimSearchError>(())
//! ```
//!
//! ## Key Concepts
//!
//! ### Internal and external ids
//!
//! Every document gets a dense [`InternalId`] (its row in the vector store
//! and node in the graph). The caller's own [`ExternalId`] and
//! [`DocumentPayload`] are kept in a catalog and returned with each hit.
//!
//! ### Text queries
//!
//! [`QueryService`] wraps an [`IndexManager`] with an
//! [`EmbeddingService`](embedding::EmbeddingService) so callers can search
//! and ingest by text. [`SearchProvider`] is its async face.
//!
//! ## Thread Safety
//!
//! `IndexManager` is `Send + Sync` and meant to be shared through `Arc`.
//! Searches run concurrently against an immutable published state; writers
//! are serialized and publish a whole batch at once.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============================================================================
// Module declarations
// ============================================================================

mod config;
mod error;
mod types;

pub mod catalog;
pub mod embedding;
pub mod source;
pub mod store;

/// HNSW graph over vector store rows.
pub mod graph;

/// Index manager, snapshots and statistics.
pub mod index;

/// Text query service and async provider.
pub mod query;

// ============================================================================
// Public API re-exports
// ============================================================================

// Index
pub use index::{IndexManager, IndexStats, SearchResult, SnapshotMetadata};

// Configuration
pub use config::{Config, DuplicatePolicy, EmbeddingDimension, EmbeddingProvider, HnswConfig};

// Error handling
pub use error::{NotFoundError, Result, SimSearchError, SnapshotError, ValidationError};

// Core types
pub use types::{Embedding, ExternalId, InternalId};

// Documents
pub use catalog::{DocumentPayload, FieldValue};
pub use source::{DocumentSource, JsonCorpusSource, SourceDocument, SyntheticSource};

// Query
pub use query::{
    BlockingSearchProvider, BootstrapOutcome, QueryService, SearchHit, SearchProvider,
    SearchResponse,
};

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common SimSearch usage.
///
/// ```rust
/// use simsearch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, EmbeddingDimension};
    pub use crate::embedding::EmbeddingService;
    pub use crate::error::{Result, SimSearchError};
    pub use crate::index::{IndexManager, SearchResult};
    pub use crate::query::{QueryService, SearchProvider, SearchResponse};
    pub use crate::source::{DocumentSource, SourceDocument};
    pub use crate::types::{Embedding, ExternalId, InternalId};
    pub use crate::catalog::DocumentPayload;
}
