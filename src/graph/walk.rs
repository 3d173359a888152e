//! Random-walk scorers: personalized PageRank rooted at a source node, and
//! the global PageRank used for node-metric metadata.
//!
//! Both are plain power iterations over the in-memory snapshot — no I/O,
//! no suspension. Iteration stops on L1 convergence below the configured
//! tolerance or when the iteration budget runs out, whichever comes first;
//! the result is converged-or-budget-exhausted, never an exact solve.

use std::collections::HashMap;

use crate::config::WalkConfig;
use crate::graph::snapshot::GraphSnapshot;
use crate::types::NodeId;

/// Personalized PageRank scores rooted at `source`.
///
/// The source receives a constant teleport term `(1 - alpha)` plus `alpha`
/// times the propagated neighbor mass; every other node receives only the
/// propagated term. Zero-degree nodes contribute no outgoing mass and keep
/// their previous score (the neighbor sum simply excludes them).
///
/// Returns an empty map when `source` is absent — "no walk possible", not
/// a fault.
pub fn ppr(graph: &GraphSnapshot, source: NodeId, config: &WalkConfig) -> HashMap<NodeId, f64> {
    if !graph.contains(source) {
        return HashMap::new();
    }

    let ids = graph.node_ids();
    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let degrees: Vec<usize> = ids.iter().map(|&id| graph.degree(id).unwrap_or(0)).collect();

    let mut scores = vec![0.0f64; ids.len()];
    scores[index[&source]] = 1.0;

    for iteration in 0..config.max_iter {
        let prev = scores.clone();

        for (i, &node) in ids.iter().enumerate() {
            let Ok(neighbors) = graph.neighbors(node) else {
                continue;
            };
            if neighbors.is_empty() {
                continue;
            }

            let incoming: f64 = neighbors
                .iter()
                .map(|&n| {
                    let j = index[&n];
                    // zero-degree guard; a neighbor always has degree >= 1
                    if degrees[j] > 0 {
                        prev[j] / degrees[j] as f64
                    } else {
                        0.0
                    }
                })
                .sum();

            scores[i] = if node == source {
                (1.0 - config.alpha) + config.alpha * incoming
            } else {
                config.alpha * incoming
            };
        }

        let delta: f64 = scores
            .iter()
            .zip(&prev)
            .map(|(a, b)| (a - b).abs())
            .sum();
        if delta < config.tol {
            tracing::debug!(source, iteration, delta, "ppr converged");
            break;
        }
        if iteration + 1 == config.max_iter {
            tracing::debug!(
                source,
                max_iter = config.max_iter,
                delta,
                "ppr iteration budget exhausted, returning best-effort scores"
            );
        }
    }

    ids.iter().copied().zip(scores).collect()
}

/// Global PageRank with uniform teleport, for node-metric metadata.
///
/// Dangling (zero-degree) mass is redistributed uniformly each iteration.
pub fn pagerank(graph: &GraphSnapshot, config: &WalkConfig) -> HashMap<NodeId, f64> {
    let ids = graph.node_ids();
    let n = ids.len();
    if n == 0 {
        return HashMap::new();
    }

    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let degrees: Vec<usize> = ids.iter().map(|&id| graph.degree(id).unwrap_or(0)).collect();
    let uniform = 1.0 / n as f64;

    let mut scores = vec![uniform; n];

    for _ in 0..config.max_iter {
        let prev = scores.clone();

        let dangling: f64 = prev
            .iter()
            .zip(&degrees)
            .filter(|(_, &d)| d == 0)
            .map(|(s, _)| s)
            .sum();

        for (i, &node) in ids.iter().enumerate() {
            let incoming: f64 = graph
                .neighbors(node)
                .map(|neighbors| {
                    neighbors
                        .iter()
                        .map(|&m| {
                            let j = index[&m];
                            prev[j] / degrees[j] as f64
                        })
                        .sum()
                })
                .unwrap_or(0.0);

            scores[i] = (1.0 - config.alpha) * uniform
                + config.alpha * (incoming + dangling * uniform);
        }

        let delta: f64 = scores
            .iter()
            .zip(&prev)
            .map(|(a, b)| (a - b).abs())
            .sum();
        if delta < config.tol {
            break;
        }
    }

    ids.iter().copied().zip(scores).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
