//! Core domain types for FriendGraph.
//!
//! Everything here is a plain serde-friendly value: the graph supply contract
//! (nodes + weighted relationship edges), the per-candidate score records
//! produced by the metric and fusion layers, and the response envelope
//! returned to callers.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Opaque integer id of a graph node (a user).
pub type NodeId = u64;

// ---------------------------------------------------------------------------
// Graph supply contract
// ---------------------------------------------------------------------------

/// Attribute bag carried by each node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub interest_count: u32,
    #[serde(default)]
    pub education_count: u32,
    #[serde(default)]
    pub work_count: u32,
}

/// A node as supplied by the feature-store collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub attributes: NodeAttributes,
}

/// How two users are related in the supply feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Confirmed relationship (accepted friendship). Always weight 1.0.
    Friend,
    /// Inferred from interactions (comments, reactions). Weight derived
    /// from the interaction count, capped below 1.0.
    Interaction,
}

/// An undirected relationship edge as supplied by the collaborator.
///
/// `strength` is the raw interaction count for [`RelationKind::Interaction`]
/// edges and is ignored for [`RelationKind::Friend`] edges. The snapshot
/// builder converts it to a weight in [0, 1]. Suppliers that pre-compute an
/// inferred weight can set `weight` instead; it overrides the kind-derived
/// value and is clamped to [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: RelationKind,
    #[serde(default)]
    pub strength: f64,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// The full graph supply payload: `{ nodes: [...], edges: [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInput {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

// ---------------------------------------------------------------------------
// Score records
// ---------------------------------------------------------------------------

/// Structural link-prediction sub-scores for one (source, candidate) pair.
///
/// `common_neighbors` is the raw shared-neighbor count; the max-degree
/// normalization only enters the `weighted` total, so explanations can still
/// say "3 mutual friends".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub common_neighbors: usize,
    pub jaccard: f64,
    pub adamic_adar: f64,
    pub katz: f64,
    /// Weighted combination of the four metrics (cn normalized by the
    /// snapshot's maximum degree).
    pub weighted: f64,
}

/// Externally supplied attribute-similarity bundle, each component in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSimilarity {
    pub interest: f64,
    pub education: f64,
    pub work: f64,
}

impl FeatureSimilarity {
    /// Weighted overall similarity: 0.4·interest + 0.3·education + 0.3·work.
    pub fn overall(&self) -> f64 {
        0.4 * self.interest + 0.3 * self.education + 0.3 * self.work
    }

    /// True when at least one sub-score is strictly positive.
    pub fn is_present(&self) -> bool {
        self.interest > 0.0 || self.education > 0.0 || self.work > 0.0
    }
}

/// Fused per-candidate record: one instance per candidate per request,
/// immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSignals {
    pub graph_score: f64,
    pub feature_score: f64,
    pub interaction_score: f64,
    pub total_score: f64,
    pub reasons: Vec<String>,
}

/// External signals fetched for one (user, candidate) pair.
///
/// `None` means the collaborator has no signal of that kind for the pair —
/// a normal condition handled by the fusion fallback rows, not a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CandidateSignals {
    pub features: Option<FeatureSimilarity>,
    /// Raw count-derived interaction weight; capped before fusion.
    pub interaction_weight: Option<f64>,
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Aggregate statistics about a graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub density: f64,
    pub avg_degree: f64,
    pub avg_clustering: f64,
    pub num_components: usize,
    pub largest_component_size: usize,
}

/// Node-level metrics reported as response metadata for the source user.
///
/// `betweenness` is a pivot-sampled estimate on large graphs; the other
/// fields are exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub degree: usize,
    pub clustering: f64,
    pub degree_centrality: f64,
    pub pagerank: f64,
    pub eigenvector: f64,
    pub betweenness: f64,
}

/// One ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub candidate_id: NodeId,
    pub username: String,
    pub display_name: String,
    pub total_score: f64,
    pub graph_metrics: CandidateScore,
    pub feature_similarity: FeatureSimilarity,
    pub interaction_score: f64,
    pub reasons: Vec<String>,
}

/// The full response: ranked list plus request-scoped metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub graph_stats: GraphStats,
    pub source_metrics: NodeMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_overall_is_weighted_combination() {
        let f = FeatureSimilarity {
            interest: 1.0,
            education: 0.5,
            work: 0.0,
        };
        assert!((f.overall() - (0.4 + 0.15)).abs() < 1e-12);
    }

    #[test]
    fn feature_presence_requires_strictly_positive_component() {
        assert!(!FeatureSimilarity::default().is_present());
        let f = FeatureSimilarity {
            work: 0.01,
            ..Default::default()
        };
        assert!(f.is_present());
    }

    #[test]
    fn graph_input_deserializes_with_defaults() {
        let input: GraphInput = serde_json::from_str(
            r#"{"nodes":[{"id":1}],"edges":[{"source":1,"target":2,"kind":"friend"}]}"#,
        )
        .unwrap();
        assert_eq!(input.nodes.len(), 1);
        assert_eq!(input.edges[0].kind, RelationKind::Friend);
        assert_eq!(input.edges[0].strength, 0.0);
        assert_eq!(input.edges[0].weight, None);
    }
}
