//! HNSW (Hierarchical Navigable Small World) graph index.
//!
//! A multi-layer proximity graph for approximate nearest neighbor search
//! over cosine distance.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: ●───────────────────● (few nodes, long-range)
//!          │                   │
//! Layer 1: ●───────●───────────● (more nodes)
//!          │       │           │
//! Layer 0: ●─●─●─●─●─●─●─●─●─●─● (all nodes)
//! ```
//!
//! Node ids are rows of a [`VectorStore`](crate::store::VectorStore); the
//! graph never copies vectors.

mod distance;
mod hnsw;
mod node;
mod visited;

pub use distance::{cosine_distance, similarity};
pub use hnsw::{GraphParams, GraphStats, HnswGraph, MAX_LEVEL};
pub use node::GraphNode;
