//! HNSW graph construction and search.
//!
//! The core HNSW algorithm with:
//! - Random layer assignment (exponential distribution, seeded RNG)
//! - Diversity-preserving neighbor selection heuristic
//! - Best-first beam search with epoch-stamped visited tracking
//!
//! # Algorithm Overview
//!
//! **Insert**: Assign random level L, greedy descent from the entry point
//! down to L + 1, then beam-search and wire connections on every layer from
//! min(L, top) down to 0.
//!
//! **Search**: Greedy descent to layer 1, then beam search on layer 0 with
//! `max(ef, k)` candidates.
//!
//! The graph does not own vectors. Every operation borrows the
//! [`VectorStore`] whose rows the node ids refer to.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::distance::cosine_distance;
use super::node::GraphNode;
use super::visited::VisitedSet;
use crate::config::default_level_multiplier;
use crate::error::{Result, SimSearchError};
use crate::store::VectorStore;
use crate::types::InternalId;

/// Highest layer a node can be assigned to.
pub const MAX_LEVEL: usize = 16;

/// Construction parameters, fixed for the lifetime of a graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphParams {
    /// Max neighbors per node on layers above 0.
    pub m: usize,
    /// Max neighbors per node on layer 0.
    pub m0: usize,
    /// Beam width during construction.
    pub ef_construction: usize,
    /// Level multiplication constant for layer assignment.
    pub level_multiplier: f64,
    /// Seed of the layer-assignment RNG.
    pub seed: u64,
}

impl GraphParams {
    /// Creates parameters with `m0 = 2 * m`.
    ///
    /// `level_multiplier` defaults to `1 / ln(m)` when `None`.
    pub fn new(m: usize, ef_construction: usize, level_multiplier: Option<f64>, seed: u64) -> Self {
        let m = m.max(2);
        Self {
            m,
            m0: m * 2,
            ef_construction: ef_construction.max(1),
            level_multiplier: level_multiplier.unwrap_or_else(|| default_level_multiplier(m)),
            seed,
        }
    }

    #[inline]
    fn layer_capacity(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m0
        } else {
            self.m
        }
    }
}

/// A node id with its distance to the current query.
///
/// Ordered by distance, then by id, so every heap and sort in the graph is
/// deterministic.
#[derive(Clone, Copy, Debug)]
struct Scored {
    distance: f32,
    id: usize,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Graph shape summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Number of nodes.
    pub nodes: usize,
    /// Highest populated layer.
    pub max_layer: usize,
    /// Global entry point.
    pub entry_point: Option<usize>,
    /// Nodes present on each layer, lowest first.
    pub layer_counts: Vec<usize>,
    /// Directed edges across all layers.
    pub total_edges: usize,
}

/// Hierarchical navigable small world graph.
///
/// Node `i` corresponds to row `i` of the vector store it is built over.
#[derive(Clone, Debug)]
pub struct HnswGraph {
    nodes: Vec<GraphNode>,
    entry_point: Option<usize>,
    max_layer: usize,
    params: GraphParams,
    rng: StdRng,
}

impl HnswGraph {
    /// Creates an empty graph.
    pub fn new(params: GraphParams) -> Self {
        let rng = StdRng::seed_from_u64(params.seed);
        Self {
            nodes: Vec::new(),
            entry_point: None,
            max_layer: 0,
            params,
            rng,
        }
    }

    /// Reassembles a graph from persisted parts.
    ///
    /// The RNG is reseeded from the stored seed and node count, so a reloaded
    /// graph keeps growing deterministically.
    pub(crate) fn from_parts(
        params: GraphParams,
        nodes: Vec<GraphNode>,
        entry_point: Option<usize>,
        max_layer: usize,
    ) -> Self {
        let rng = StdRng::seed_from_u64(params.seed.wrapping_add(nodes.len() as u64));
        Self {
            nodes,
            entry_point,
            max_layer,
            params,
            rng,
        }
    }

    /// Checks structural invariants of a reassembled graph.
    ///
    /// Returns a description of the first violation found.
    pub(crate) fn check_structure(&self) -> std::result::Result<(), String> {
        match self.entry_point {
            None if !self.nodes.is_empty() => {
                return Err("graph has nodes but no entry point".to_string())
            }
            Some(ep) if ep >= self.nodes.len() => {
                return Err(format!(
                    "entry point {} out of range for {} nodes",
                    ep,
                    self.nodes.len()
                ))
            }
            Some(ep) if self.nodes[ep].level() != self.max_layer => {
                return Err(format!(
                    "entry point level {} does not match max layer {}",
                    self.nodes[ep].level(),
                    self.max_layer
                ))
            }
            _ => {}
        }

        for (id, node) in self.nodes.iter().enumerate() {
            if node.layers().is_empty() {
                return Err(format!("node {} has no layers", id));
            }
            for (layer, neighbors) in node.layers().iter().enumerate() {
                for &n in neighbors {
                    let Some(neighbor) = self.nodes.get(n) else {
                        return Err(format!("node {} links to missing node {}", id, n));
                    };
                    if neighbor.level() < layer {
                        return Err(format!(
                            "node {} links to node {} on layer {} above its level",
                            id, n, layer
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of nodes in the graph.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Construction parameters.
    pub fn params(&self) -> &GraphParams {
        &self.params
    }

    /// Current global entry point.
    pub fn entry_point(&self) -> Option<usize> {
        self.entry_point
    }

    /// Highest layer currently in the graph.
    pub fn max_layer(&self) -> usize {
        self.max_layer
    }

    /// Node by id.
    pub fn node(&self, id: usize) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    #[inline]
    fn distance_to(&self, query: &[f32], id: usize, store: &VectorStore) -> f32 {
        // Insert refuses ids the store lacks, so every node has a row.
        debug_assert!(store.row(id).is_some(), "node {} has no vector", id);
        store
            .row(id)
            .map_or(f32::INFINITY, |v| cosine_distance(query, v))
    }

    /// Draws a level from the exponential distribution, capped at
    /// [`MAX_LEVEL`].
    fn random_level(&mut self) -> usize {
        // gen() is in [0, 1); flip it so ln() never sees zero
        let r: f64 = 1.0 - self.rng.gen::<f64>();
        let level = (-r.ln() * self.params.level_multiplier).floor();
        if level >= MAX_LEVEL as f64 {
            MAX_LEVEL
        } else {
            level as usize
        }
    }

    /// Inserts row `id` of `store` into the graph.
    ///
    /// Rows must be inserted in order: `id` has to equal `len()`.
    ///
    /// # Errors
    ///
    /// Returns an index error if `id` is out of sequence or the store has no
    /// such row.
    pub fn insert(&mut self, id: InternalId, store: &VectorStore) -> Result<()> {
        let id = id.index();
        if id != self.nodes.len() {
            return Err(SimSearchError::index(format!(
                "graph insert out of order: expected node {}, got {}",
                self.nodes.len(),
                id
            )));
        }
        let query = store
            .row(id)
            .ok_or_else(|| SimSearchError::index(format!("no vector stored for node {}", id)))?;

        let level = self.random_level();
        self.nodes.push(GraphNode::new(level));

        // First node becomes entry point
        let Some(entry_point) = self.entry_point else {
            self.entry_point = Some(id);
            self.max_layer = level;
            return Ok(());
        };

        // Phase 1: greedy descent from the top layer to level + 1
        let mut current = Scored {
            distance: self.distance_to(query, entry_point, store),
            id: entry_point,
        };
        for layer in (level + 1..=self.max_layer).rev() {
            current = self.greedy_closest(query, current, layer, store);
        }

        // Phase 2: wire connections from min(level, top) down to 0
        for layer in (0..=level.min(self.max_layer)).rev() {
            let candidates =
                self.search_layer(query, current, self.params.ef_construction, layer, store);
            let cap = self.params.layer_capacity(layer);
            let selected = self.select_neighbors(&candidates, cap, store);

            for &neighbor in &selected {
                self.nodes[neighbor].add_neighbor(layer, id);
                if self.nodes[neighbor].neighbors(layer).len() > cap {
                    self.prune(neighbor, layer, cap, store);
                }
            }
            self.nodes[id].set_neighbors(layer, selected);

            if let Some(&best) = candidates.first() {
                current = best;
            }
        }

        if level > self.max_layer {
            self.max_layer = level;
            self.entry_point = Some(id);
        }
        Ok(())
    }

    /// Moves to the closest neighbor until no neighbor improves.
    fn greedy_closest(
        &self,
        query: &[f32],
        start: Scored,
        layer: usize,
        store: &VectorStore,
    ) -> Scored {
        let mut current = start;
        loop {
            let mut best = current;
            for &neighbor in self.nodes[current.id].neighbors(layer) {
                let candidate = Scored {
                    distance: self.distance_to(query, neighbor, store),
                    id: neighbor,
                };
                if candidate < best {
                    best = candidate;
                }
            }
            if best.id == current.id {
                return current;
            }
            current = best;
        }
    }

    /// Best-first beam search on one layer.
    ///
    /// Returns up to `ef` nodes sorted by ascending `(distance, id)`.
    fn search_layer(
        &self,
        query: &[f32],
        entry: Scored,
        ef: usize,
        layer: usize,
        store: &VectorStore,
    ) -> Vec<Scored> {
        let mut visited = VisitedSet::new(self.nodes.len());
        visited.insert(entry.id);

        // Candidates to explore (min-heap), results kept (max-heap on worst)
        let mut candidates: BinaryHeap<Reverse<Scored>> = BinaryHeap::with_capacity(ef);
        let mut results: BinaryHeap<Scored> = BinaryHeap::with_capacity(ef + 1);
        candidates.push(Reverse(entry));
        results.push(entry);

        while let Some(Reverse(current)) = candidates.pop() {
            if let Some(worst) = results.peek() {
                if results.len() >= ef && current > *worst {
                    break;
                }
            }

            for &neighbor in self.nodes[current.id].neighbors(layer) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let scored = Scored {
                    distance: self.distance_to(query, neighbor, store),
                    id: neighbor,
                };
                let admit = results.len() < ef || results.peek().is_some_and(|w| scored < *w);
                if admit {
                    candidates.push(Reverse(scored));
                    results.push(scored);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut found = results.into_vec();
        found.sort_unstable();
        found
    }

    /// Diversity heuristic over candidates sorted by distance to the base.
    ///
    /// A candidate is kept only if it is closer to the base than to every
    /// neighbor already kept. Leftover slots are filled with the closest
    /// discarded candidates.
    fn select_neighbors(&self, candidates: &[Scored], cap: usize, store: &VectorStore) -> Vec<usize> {
        if candidates.len() <= 1 {
            return candidates.iter().map(|c| c.id).collect();
        }

        let mut selected: Vec<usize> = Vec::with_capacity(cap);
        let mut discarded: Vec<usize> = Vec::new();

        for candidate in candidates {
            if selected.len() >= cap {
                break;
            }
            let Some(candidate_vec) = store.row(candidate.id) else {
                continue;
            };
            let diverse = selected
                .iter()
                .all(|&kept| self.distance_to(candidate_vec, kept, store) >= candidate.distance);
            if diverse {
                selected.push(candidate.id);
            } else {
                discarded.push(candidate.id);
            }
        }

        for id in discarded {
            if selected.len() >= cap {
                break;
            }
            selected.push(id);
        }
        selected
    }

    /// Shrinks a node's neighbor list at `layer` back to `cap`.
    fn prune(&mut self, id: usize, layer: usize, cap: usize, store: &VectorStore) {
        let Some(base) = store.row(id) else {
            return;
        };
        let mut scored: Vec<Scored> = self.nodes[id]
            .neighbors(layer)
            .iter()
            .map(|&n| Scored {
                distance: self.distance_to(base, n, store),
                id: n,
            })
            .collect();
        scored.sort_unstable();

        let kept = self.select_neighbors(&scored, cap, store);
        self.nodes[id].set_neighbors(layer, kept);
    }

    /// Finds the `k` nearest nodes to `query`.
    ///
    /// Returns `(id, cosine distance)` pairs sorted by ascending distance,
    /// ties broken by lower id. The beam width is `max(ef, k)`. An empty
    /// graph or `k == 0` yields an empty result.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef: usize,
        store: &VectorStore,
    ) -> Vec<(InternalId, f32)> {
        let Some(entry_point) = self.entry_point else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let mut current = Scored {
            distance: self.distance_to(query, entry_point, store),
            id: entry_point,
        };
        for layer in (1..=self.max_layer).rev() {
            current = self.greedy_closest(query, current, layer, store);
        }

        let mut found = self.search_layer(query, current, ef.max(k), 0, store);
        found.truncate(k);
        found
            .into_iter()
            .map(|s| (InternalId(s.id), s.distance))
            .collect()
    }

    /// Graph shape statistics.
    pub fn stats(&self) -> GraphStats {
        let mut layer_counts = vec![0usize; self.max_layer + 1];
        let mut total_edges = 0;

        for node in &self.nodes {
            for (layer, neighbors) in node.layers().iter().enumerate() {
                if let Some(count) = layer_counts.get_mut(layer) {
                    *count += 1;
                }
                total_edges += neighbors.len();
            }
        }

        GraphStats {
            nodes: self.nodes.len(),
            max_layer: self.max_layer,
            entry_point: self.entry_point,
            layer_counts,
            total_edges,
        }
    }
}
