//! Configuration types for SimSearch.
//!
//! The [`Config`] struct controls index behavior including:
//! - HNSW graph parameters (M, efConstruction, ef, capacity, RNG seed)
//! - Expected embedding dimension (optional, otherwise set by the first batch)
//! - External id duplicate policy
//! - Snapshot location and ingestion batch size
//!
//! # Example
//! ```rust
//! use simsearch::{Config, DuplicatePolicy, EmbeddingDimension, HnswConfig};
//!
//! // Use defaults (M=16, efConstruction=200, ef=50)
//! let config = Config::default();
//!
//! // Customize for a 768-dimensional model with strict ids
//! let config = Config {
//!     expected_dimension: Some(EmbeddingDimension::D768),
//!     duplicate_policy: DuplicatePolicy::Reject,
//!     hnsw: HnswConfig {
//!         max_elements: 50_000,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest embedding dimension accepted by configuration.
pub const MAX_DIMENSION: usize = 4096;

/// Index configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings:
///
/// ```rust
/// use simsearch::Config;
///
/// let config = Config {
///     ingest_batch_size: 512,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// HNSW graph tuning parameters.
    pub hnsw: HnswConfig,

    /// How embeddings are produced for text queries and documents.
    pub embedding_provider: EmbeddingProvider,

    /// Dimension every vector must have.
    ///
    /// `None` lets the first inserted vector establish it.
    pub expected_dimension: Option<EmbeddingDimension>,

    /// Whether repeated external ids are accepted.
    pub duplicate_policy: DuplicatePolicy,

    /// Default snapshot directory used by the query service bootstrap.
    pub snapshot_dir: Option<PathBuf>,

    /// Number of documents embedded and inserted per batch during ingestion.
    ///
    /// Default: 256
    pub ingest_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hnsw: HnswConfig::default(),
            embedding_provider: EmbeddingProvider::External,
            expected_dimension: None,
            duplicate_policy: DuplicatePolicy::Allow,
            snapshot_dir: None,
            ingest_batch_size: 256,
        }
    }
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Config that pins the embedding dimension up front.
    ///
    /// # Example
    /// ```rust
    /// use simsearch::{Config, EmbeddingDimension};
    ///
    /// let config = Config::with_dimension(EmbeddingDimension::Custom(16));
    /// assert_eq!(config.dimension(), Some(16));
    /// ```
    pub fn with_dimension(dimension: EmbeddingDimension) -> Self {
        Self {
            expected_dimension: Some(dimension),
            ..Default::default()
        }
    }

    /// Validates the configuration.
    ///
    /// Called automatically by `IndexManager::new()`.
    ///
    /// # Errors
    /// Returns `ValidationError` if:
    /// - any HNSW parameter is out of range (see [`HnswConfig::validate`])
    /// - a custom dimension is 0 or > 4096
    /// - `ingest_batch_size` is 0
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.hnsw.validate()?;

        if let Some(EmbeddingDimension::Custom(dim)) = self.expected_dimension {
            if dim == 0 {
                return Err(ValidationError::invalid_field(
                    "expected_dimension",
                    "custom dimension must be greater than 0",
                ));
            }
            if dim > MAX_DIMENSION {
                return Err(ValidationError::invalid_field(
                    "expected_dimension",
                    format!("custom dimension must not exceed {}", MAX_DIMENSION),
                ));
            }
        }

        if self.ingest_batch_size == 0 {
            return Err(ValidationError::invalid_field(
                "ingest_batch_size",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Returns the expected dimension as a numeric value, if pinned.
    pub fn dimension(&self) -> Option<usize> {
        self.expected_dimension.map(|d| d.size())
    }
}

/// HNSW graph parameters.
///
/// `m` and `ef_construction` are the defaults used when a caller goes through
/// the query service; `IndexManager::add_batch` and `rebuild` take them as
/// explicit arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Target neighbor degree per node per layer (layer 0 uses `2 * m`).
    pub m: usize,

    /// Beam width while building the graph.
    pub ef_construction: usize,

    /// Default beam width at query time.
    pub ef_search: usize,

    /// Initial capacity hint; grows by doubling when exceeded.
    pub max_elements: usize,

    /// Level multiplication constant. `None` means `1 / ln(m)`.
    pub level_multiplier: Option<f64>,

    /// Seed for the layer-assignment RNG.
    pub seed: u64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 50,
            max_elements: 10_000,
            level_multiplier: None,
            seed: 0x5EED,
        }
    }
}

impl HnswConfig {
    /// Validates graph parameters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.m < 2 {
            return Err(ValidationError::invalid_field("m", "must be at least 2"));
        }
        if self.ef_construction == 0 {
            return Err(ValidationError::invalid_field(
                "ef_construction",
                "must be greater than 0",
            ));
        }
        if self.ef_search == 0 {
            return Err(ValidationError::invalid_field(
                "ef_search",
                "must be greater than 0",
            ));
        }
        if self.max_elements == 0 {
            return Err(ValidationError::invalid_field(
                "max_elements",
                "must be greater than 0",
            ));
        }
        if let Some(ml) = self.level_multiplier {
            if !ml.is_finite() || ml <= 0.0 {
                return Err(ValidationError::invalid_field(
                    "level_multiplier",
                    "must be a finite positive number",
                ));
            }
        }
        Ok(())
    }

    /// Returns the effective level multiplier for the configured `m`.
    pub fn effective_level_multiplier(&self) -> f64 {
        self.level_multiplier
            .unwrap_or_else(|| default_level_multiplier(self.m))
    }
}

/// Canonical level multiplier `1 / ln(m)`.
#[inline]
pub fn default_level_multiplier(m: usize) -> f64 {
    1.0 / (m.max(2) as f64).ln()
}

/// Embedding provider configuration.
#[derive(Clone, Debug, Default)]
pub enum EmbeddingProvider {
    /// Caller provides pre-computed embedding vectors, or plugs in its own
    /// [`EmbeddingService`](crate::embedding::EmbeddingService).
    #[default]
    External,
}

impl EmbeddingProvider {
    /// Returns true if this is the external provider.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External)
    }
}

/// Embedding vector dimensions.
///
/// Standard dimensions are provided for common models. Use `Custom` for
/// other embedding services.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingDimension {
    /// 384 dimensions (all-MiniLM-L6-v2).
    #[default]
    D384,

    /// 768 dimensions (all-mpnet-base-v2).
    D768,

    /// Custom dimension for other embedding models.
    ///
    /// Must be between 1 and 4096.
    Custom(usize),
}

impl EmbeddingDimension {
    /// Returns the numeric size of this dimension.
    ///
    /// # Example
    /// ```rust
    /// use simsearch::EmbeddingDimension;
    ///
    /// assert_eq!(EmbeddingDimension::D384.size(), 384);
    /// assert_eq!(EmbeddingDimension::D768.size(), 768);
    /// assert_eq!(EmbeddingDimension::Custom(1536).size(), 1536);
    /// ```
    #[inline]
    pub const fn size(&self) -> usize {
        match self {
            Self::D384 => 384,
            Self::D768 => 768,
            Self::Custom(n) => *n,
        }
    }
}

/// Policy for external ids seen more than once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Duplicates are indexed as distinct documents.
    #[default]
    Allow,

    /// A batch containing an already-indexed (or repeated) id is rejected.
    Reject,
}

impl DuplicatePolicy {
    /// Returns true if duplicates are rejected.
    pub fn is_reject(&self) -> bool {
        matches!(self, Self::Reject)
    }
}
