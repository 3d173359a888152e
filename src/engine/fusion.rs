//! Availability-driven score fusion.
//!
//! Combines the graph-metric score with whatever attribute and interaction
//! signals exist for a candidate. Which weighted row applies depends purely
//! on signal availability, evaluated per candidate independently — a missing
//! signal degrades that candidate's score, never the request.

use crate::config::FusionWeights;
use crate::types::{CandidateScore, CandidateSignals, FeatureSimilarity, RankingSignals};

/// Fuse one candidate's signals into a [`RankingSignals`] record.
///
/// The raw interaction weight is capped before use; "has attribute signal"
/// means at least one sub-score is strictly positive, so an all-zero
/// similarity bundle falls through to the graph-heavier rows.
pub fn fuse(
    graph: &CandidateScore,
    signals: &CandidateSignals,
    weights: &FusionWeights,
) -> RankingSignals {
    let graph_score = graph.weighted;
    let features = signals.features.unwrap_or_default();
    let feature_score = features.overall();
    let interaction_score = signals
        .interaction_weight
        .unwrap_or(0.0)
        .min(weights.interaction_cap);

    let has_features = features.is_present();
    let has_interaction = interaction_score > 0.0;

    let total_score = match (has_features, has_interaction) {
        (true, true) => {
            let (g, f, i) = weights.full;
            g * graph_score + f * feature_score + i * interaction_score
        }
        (true, false) => {
            let (g, f) = weights.feature_only;
            g * graph_score + f * feature_score
        }
        (false, true) => {
            let (g, i) = weights.interaction_only;
            g * graph_score + i * interaction_score
        }
        (false, false) => graph_score,
    };

    RankingSignals {
        graph_score,
        feature_score,
        interaction_score,
        total_score,
        reasons: reasons(graph, &features, interaction_score),
    }
}

/// Human-readable contributing reasons, gated by positivity thresholds.
/// Advisory metadata only — never consulted by the scoring itself.
pub fn reasons(
    graph: &CandidateScore,
    features: &FeatureSimilarity,
    interaction_score: f64,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if graph.common_neighbors > 0 {
        reasons.push(format!("{} mutual friends", graph.common_neighbors));
    }
    if graph.katz > 0.0 {
        reasons.push("connected through network".to_string());
    }
    if features.interest > 0.0 {
        reasons.push("similar interests".to_string());
    }
    if features.education > 0.0 {
        reasons.push("educational background match".to_string());
    }
    if features.work > 0.0 {
        reasons.push("professional background match".to_string());
    }
    if interaction_score > 0.0 {
        reasons.push("previous interactions".to_string());
    }

    reasons
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
