//! Node representation in the HNSW graph.

use serde::{Deserialize, Serialize};

/// A node in the HNSW graph.
///
/// The node's position in the graph's node table is its internal id, which
/// is also its row in the vector store. Each node exists on layers
/// `0..=level()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Neighbors at each layer
    /// - `layers[0]` = neighbors at layer 0 (base, everyone)
    /// - `layers[n]` = neighbors at layer n (express, fewer nodes)
    layers: Vec<Vec<usize>>,
}

impl GraphNode {
    /// Creates a node present on layers `0..=level`.
    pub fn new(level: usize) -> Self {
        Self {
            layers: vec![Vec::new(); level + 1],
        }
    }

    /// Rebuilds a node from persisted neighbor lists.
    pub(crate) fn from_layers(layers: Vec<Vec<usize>>) -> Self {
        Self { layers }
    }

    /// Highest layer this node exists on.
    pub fn level(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }

    /// Neighbors at `layer` (empty above the node's level).
    pub fn neighbors(&self, layer: usize) -> &[usize] {
        self.layers.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replaces the neighbor list at `layer`.
    pub(crate) fn set_neighbors(&mut self, layer: usize, neighbors: Vec<usize>) {
        if let Some(slot) = self.layers.get_mut(layer) {
            *slot = neighbors;
        }
    }

    /// Adds a neighbor at `layer`, ignoring duplicates.
    pub(crate) fn add_neighbor(&mut self, layer: usize, neighbor: usize) {
        if let Some(neighbors) = self.layers.get_mut(layer) {
            if !neighbors.contains(&neighbor) {
                neighbors.push(neighbor);
            }
        }
    }

    /// All neighbor lists, lowest layer first.
    pub fn layers(&self) -> &[Vec<usize>] {
        &self.layers
    }
}
