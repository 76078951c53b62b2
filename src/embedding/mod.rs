//! Embedding service abstractions.
//!
//! The index never computes embeddings. Text-to-vector conversion is the job
//! of an [`EmbeddingService`] supplied by the caller (a sentence-transformer
//! behind an RPC, an ONNX session, a test stub).
//!
//! # Providers
//!
//! - [`ExternalEmbedding`] - For pre-computed embeddings; validates only
//!
//! # Example
//!
//! ```rust
//! use simsearch::embedding::{EmbeddingService, ExternalEmbedding};
//!
//! // External mode - caller provides embeddings
//! let service = ExternalEmbedding::new(384);
//! assert_eq!(service.dimension(), 384);
//!
//! // Validation only - cannot generate embeddings
//! assert!(service.embed("hello").is_err());
//! ```

use crate::config::Config;
use crate::error::{Result, SimSearchError, ValidationError};
use crate::types::Embedding;

/// Embedding service trait for generating vector representations of text.
///
/// Implementations must be thread-safe (`Send + Sync`); the query service
/// calls them from blocking worker threads.
///
/// # Implementing a Custom Provider
///
/// ```rust,ignore
/// use simsearch::embedding::EmbeddingService;
/// use simsearch::{Embedding, Result};
///
/// struct MiniLm {
///     client: SentenceTransformerClient,
/// }
///
/// impl EmbeddingService for MiniLm {
///     fn embed(&self, text: &str) -> Result<Embedding> {
///         Ok(self.client.encode(text)?)
///     }
///
///     fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
///         Ok(self.client.encode_many(texts)?)
///     }
///
///     fn dimension(&self) -> usize {
///         384
///     }
/// }
/// ```
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding for a single text.
    ///
    /// # Errors
    ///
    /// Returns `SimSearchError::Embedding` if embedding generation fails.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generates embeddings for multiple texts, in input order.
    ///
    /// # Errors
    ///
    /// Returns `SimSearchError::Embedding` if any embedding generation fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Returns the dimension of embeddings produced by this service.
    fn dimension(&self) -> usize;

    /// Validates that an embedding has the correct dimension.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DimensionMismatch` if dimensions don't match.
    fn validate_embedding(&self, embedding: &[f32]) -> Result<()> {
        let expected = self.dimension();
        let actual = embedding.len();

        if actual != expected {
            return Err(ValidationError::dimension_mismatch(expected, actual).into());
        }

        Ok(())
    }
}

/// External embedding provider.
///
/// Used when vectors are computed outside this crate. It validates
/// dimensions but cannot generate embeddings: `embed()` and `embed_batch()`
/// always return an error.
///
/// # Example
///
/// ```rust
/// use simsearch::embedding::{EmbeddingService, ExternalEmbedding};
///
/// // all-mpnet-base-v2
/// let service = ExternalEmbedding::new(768);
/// assert!(service.validate_embedding(&vec![0.0; 768]).is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct ExternalEmbedding {
    dimension: usize,
}

impl ExternalEmbedding {
    /// Creates a new external embedding provider with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingService for ExternalEmbedding {
    fn embed(&self, _text: &str) -> Result<Embedding> {
        Err(SimSearchError::embedding(
            "External embedding mode: embeddings must be provided by the caller",
        ))
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Embedding>> {
        Err(SimSearchError::embedding(
            "External embedding mode: embeddings must be provided by the caller",
        ))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Creates an embedding service based on the configuration.
///
/// Uses the pinned dimension if the config has one, otherwise the default
/// [`EmbeddingDimension`](crate::EmbeddingDimension) (384).
pub fn create_embedding_service(config: &Config) -> Result<Box<dyn EmbeddingService>> {
    use crate::config::EmbeddingProvider;

    match &config.embedding_provider {
        EmbeddingProvider::External => {
            let dimension = config.expected_dimension.unwrap_or_default().size();
            Ok(Box::new(ExternalEmbedding::new(dimension)))
        }
    }
}
