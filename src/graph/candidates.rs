//! Two-hop candidate generation.
//!
//! Bounds the candidate set before the expensive pairwise metrics run:
//! friends-of-friends only, ranked by a blend of personalized-walk score
//! and a common-neighbor indicator, truncated to a configurable pool size.

use std::collections::BTreeSet;

use crate::config::WalkConfig;
use crate::graph::snapshot::GraphSnapshot;
use crate::graph::walk;
use crate::types::NodeId;

/// Relative contributions of the walk score and the common-neighbor
/// indicator to the pool-ranking score.
const WALK_SHARE: f64 = 0.7;
const CN_SHARE: f64 = 0.3;

/// Generate the two-hop candidate pool for `source`.
///
/// The pool is the union of neighbors-of-neighbors of `source`, minus
/// `source` itself and all of `existing`. Each candidate is scored
/// `0.7·ppr + 0.3·(cn/max(cn,1))`; the second term is a near-binary
/// indicator (0 or asymptotically 1), not a normalized ratio.
///
/// Returns at most `top_k` candidates, best first, ascending-id tie-break.
/// An absent source or an empty two-hop neighborhood yields an empty vec —
/// a normal outcome, not a failure.
pub fn generate(
    graph: &GraphSnapshot,
    source: NodeId,
    existing: &BTreeSet<NodeId>,
    top_k: usize,
    walk_config: &WalkConfig,
) -> Vec<(NodeId, f64)> {
    let Ok(direct) = graph.neighbors(source) else {
        return Vec::new();
    };

    let mut two_hop: BTreeSet<NodeId> = BTreeSet::new();
    for &friend in direct {
        if let Ok(theirs) = graph.neighbors(friend) {
            two_hop.extend(theirs.iter().copied());
        }
    }
    two_hop.remove(&source);
    for excluded in existing {
        two_hop.remove(excluded);
    }

    if two_hop.is_empty() {
        return Vec::new();
    }

    let ppr_scores = walk::ppr(graph, source, walk_config);

    let mut candidates: Vec<(NodeId, f64)> = two_hop
        .into_iter()
        .map(|candidate| {
            let cn = graph
                .neighbors(candidate)
                .map(|theirs| direct.intersection(theirs).count())
                .unwrap_or(0);
            let ppr_score = ppr_scores.get(&candidate).copied().unwrap_or(0.0);
            let cn_indicator = cn as f64 / cn.max(1) as f64;
            (candidate, WALK_SHARE * ppr_score + CN_SHARE * cn_indicator)
        })
        .collect();

    candidates.sort_by(|(a_id, a), (b_id, b)| {
        b.partial_cmp(a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a_id.cmp(b_id))
    });
    candidates.truncate(top_k);
    candidates
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
