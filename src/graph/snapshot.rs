//! Immutable per-request graph snapshots.
//!
//! A [`GraphSnapshot`] is built once from the supply payload, read-only
//! thereafter, and discarded when a newer snapshot replaces it. The derived
//! neighbor/degree caches are owned by the snapshot itself and initialized
//! lazily through a `OnceLock`, so concurrent readers never need a lock and
//! no process-wide mutable cache exists.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::OnceLock;

use crate::config::WalkConfig;
use crate::error::{FriendGraphError, Result};
use crate::graph::{centrality, walk};
use crate::types::{GraphInput, GraphStats, NodeAttributes, NodeId, NodeMetrics, RelationKind};

/// Interaction edges weigh 0.1 per interaction, capped below a confirmed
/// friendship.
const INTERACTION_WEIGHT_PER_EVENT: f64 = 0.1;
const INTERACTION_WEIGHT_CAP: f64 = 0.8;

// ---------------------------------------------------------------------------
// NeighborCache
// ---------------------------------------------------------------------------

/// Derived adjacency caches, computed on first access and memoized for the
/// snapshot's lifetime.
#[derive(Debug)]
struct NeighborCache {
    /// Neighbor sets are ordered so every traversal is deterministic.
    neighbors: HashMap<NodeId, BTreeSet<NodeId>>,
    degrees: HashMap<NodeId, usize>,
    max_degree: usize,
}

// ---------------------------------------------------------------------------
// GraphSnapshot
// ---------------------------------------------------------------------------

/// Immutable weighted undirected graph over user nodes.
///
/// Invariants enforced at build time: no self-loops, at most one edge per
/// unordered pair (duplicates merged by maximum weight), every weight in
/// [0, 1] with 1.0 reserved for confirmed relationships.
#[derive(Debug)]
pub struct GraphSnapshot {
    attributes: HashMap<NodeId, NodeAttributes>,
    /// Per-node weighted adjacency; symmetric by construction.
    adjacency: HashMap<NodeId, HashMap<NodeId, f64>>,
    /// All node ids in ascending order, for deterministic full scans.
    sorted_ids: Vec<NodeId>,
    num_edges: usize,
    cache: OnceLock<NeighborCache>,
}

impl GraphSnapshot {
    /// Build a snapshot from the supply payload.
    ///
    /// Edge weights derive from the relationship kind: confirmed friendships
    /// weigh 1.0, interaction edges weigh `0.1 · count` capped at 0.8. An
    /// explicit per-edge weight overrides the derivation, clamped to [0, 1].
    /// Self-loops are skipped. Nodes referenced only by edges are added with
    /// empty attributes.
    pub fn build(input: GraphInput) -> Self {
        let mut attributes: HashMap<NodeId, NodeAttributes> = HashMap::new();
        for node in input.nodes {
            attributes.insert(node.id, node.attributes);
        }

        let mut adjacency: HashMap<NodeId, HashMap<NodeId, f64>> = HashMap::new();
        let mut num_edges = 0usize;

        for edge in &input.edges {
            if edge.source == edge.target {
                tracing::debug!(node = edge.source, "skipping self-loop edge");
                continue;
            }

            // An explicit supplier weight overrides the kind-derived one.
            let weight = match edge.weight {
                Some(explicit) => explicit.clamp(0.0, 1.0),
                None => match edge.kind {
                    RelationKind::Friend => 1.0,
                    RelationKind::Interaction => {
                        (INTERACTION_WEIGHT_PER_EVENT * edge.strength.max(0.0))
                            .min(INTERACTION_WEIGHT_CAP)
                    }
                },
            };

            attributes.entry(edge.source).or_default();
            attributes.entry(edge.target).or_default();

            // Duplicate relationship types between the same pair merge by
            // taking the maximum weight.
            let mut fresh = false;
            let forward = adjacency
                .entry(edge.source)
                .or_default()
                .entry(edge.target)
                .or_insert_with(|| {
                    fresh = true;
                    weight
                });
            *forward = (*forward).max(weight);
            let merged = *forward;
            adjacency
                .entry(edge.target)
                .or_default()
                .insert(edge.source, merged);
            if fresh {
                num_edges += 1;
            }
        }

        let mut sorted_ids: Vec<NodeId> = attributes.keys().copied().collect();
        sorted_ids.sort_unstable();

        Self {
            attributes,
            adjacency,
            sorted_ids,
            num_edges,
            cache: OnceLock::new(),
        }
    }

    fn cache(&self) -> &NeighborCache {
        self.cache.get_or_init(|| {
            let mut neighbors: HashMap<NodeId, BTreeSet<NodeId>> = HashMap::new();
            let mut degrees: HashMap<NodeId, usize> = HashMap::new();
            let mut max_degree = 0usize;

            for &id in &self.sorted_ids {
                let set: BTreeSet<NodeId> = self
                    .adjacency
                    .get(&id)
                    .map(|adj| adj.keys().copied().collect())
                    .unwrap_or_default();
                let degree = set.len();
                max_degree = max_degree.max(degree);
                degrees.insert(id, degree);
                neighbors.insert(id, set);
            }

            NeighborCache {
                neighbors,
                degrees,
                max_degree,
            }
        })
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Whether the snapshot holds the given node.
    pub fn contains(&self, node: NodeId) -> bool {
        self.attributes.contains_key(&node)
    }

    /// Attribute bag for a node, if present.
    pub fn attributes(&self, node: NodeId) -> Option<&NodeAttributes> {
        self.attributes.get(&node)
    }

    /// Neighbor set of a node, served from the memoized cache.
    pub fn neighbors(&self, node: NodeId) -> Result<&BTreeSet<NodeId>> {
        self.cache()
            .neighbors
            .get(&node)
            .ok_or(FriendGraphError::UnknownNode(node))
    }

    /// Degree of a node, served from the memoized cache.
    pub fn degree(&self, node: NodeId) -> Result<usize> {
        self.cache()
            .degrees
            .get(&node)
            .copied()
            .ok_or(FriendGraphError::UnknownNode(node))
    }

    /// Largest degree in the snapshot (0 for an empty or edgeless graph).
    pub fn max_degree(&self) -> usize {
        self.cache().max_degree
    }

    /// Weight of the edge between `u` and `v`, if one exists.
    pub fn edge_weight(&self, u: NodeId, v: NodeId) -> Option<f64> {
        self.adjacency.get(&u).and_then(|adj| adj.get(&v)).copied()
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.sorted_ids
    }

    pub fn num_nodes(&self) -> usize {
        self.sorted_ids.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    // -------------------------------------------------------------------
    // Statistics
    // -------------------------------------------------------------------

    /// Local clustering coefficient of a node: the fraction of possible
    /// edges among its neighbors that actually exist. 0 for degree < 2.
    pub fn clustering(&self, node: NodeId) -> Result<f64> {
        let neighbors = self.neighbors(node)?;
        let k = neighbors.len();
        if k < 2 {
            return Ok(0.0);
        }

        let mut links = 0usize;
        for &a in neighbors {
            for &b in neighbors.range((
                std::ops::Bound::Excluded(a),
                std::ops::Bound::Unbounded,
            )) {
                if self.edge_weight(a, b).is_some() {
                    links += 1;
                }
            }
        }
        Ok(2.0 * links as f64 / (k * (k - 1)) as f64)
    }

    /// Aggregate statistics for response metadata.
    pub fn stats(&self) -> GraphStats {
        let n = self.num_nodes();
        let density = if n >= 2 {
            2.0 * self.num_edges as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };
        let avg_degree = if n > 0 {
            self.sorted_ids
                .iter()
                .map(|&id| self.degree(id).unwrap_or(0))
                .sum::<usize>() as f64
                / n as f64
        } else {
            0.0
        };
        let avg_clustering = if n > 0 {
            self.sorted_ids
                .iter()
                .map(|&id| self.clustering(id).unwrap_or(0.0))
                .sum::<f64>()
                / n as f64
        } else {
            0.0
        };

        let (num_components, largest_component_size) = self.component_sizes();

        GraphStats {
            num_nodes: n,
            num_edges: self.num_edges,
            density,
            avg_degree,
            avg_clustering,
            num_components,
            largest_component_size,
        }
    }

    /// Node-level metrics for the response metadata of a source user.
    pub fn node_metrics(&self, node: NodeId, walk: &WalkConfig) -> Result<NodeMetrics> {
        let degree = self.degree(node)?;
        let clustering = self.clustering(node)?;
        let n = self.num_nodes();
        let degree_centrality = if n >= 2 {
            degree as f64 / (n - 1) as f64
        } else {
            0.0
        };
        let pagerank = walk::pagerank(self, walk).get(&node).copied().unwrap_or(0.0);
        let eigenvector = centrality::eigenvector(self, walk)
            .get(&node)
            .copied()
            .unwrap_or(0.0);
        let betweenness = centrality::betweenness(self)
            .get(&node)
            .copied()
            .unwrap_or(0.0);

        Ok(NodeMetrics {
            degree,
            clustering,
            degree_centrality,
            pagerank,
            eigenvector,
            betweenness,
        })
    }

    /// Connected component count and largest component size via BFS.
    fn component_sizes(&self) -> (usize, usize) {
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut components = 0usize;
        let mut largest = 0usize;

        for &start in &self.sorted_ids {
            if seen.contains(&start) {
                continue;
            }
            components += 1;
            let mut size = 0usize;
            let mut queue = VecDeque::from([start]);
            seen.insert(start);
            while let Some(node) = queue.pop_front() {
                size += 1;
                if let Ok(neighbors) = self.neighbors(node) {
                    for &next in neighbors {
                        if seen.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
            }
            largest = largest.max(size);
        }

        (components, largest)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
