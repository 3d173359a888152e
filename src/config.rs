//! Engine configuration.
//!
//! Every tunable the scoring pipeline consumes lives here as an explicit
//! struct passed into each call — no ambient defaults mutated at runtime.
//! Loadable from YAML; every field has a serde default mirroring the
//! shipped behavior, so partial config files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FriendGraphError, Result};

// ---------------------------------------------------------------------------
// MetricWeights
// ---------------------------------------------------------------------------

/// Per-metric weights for the link-prediction weighted score.
///
/// Weights must sum to a positive total; they are not required to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    pub common_neighbors: f64,
    pub jaccard: f64,
    pub adamic_adar: f64,
    pub katz: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            common_neighbors: 0.3,
            jaccard: 0.2,
            adamic_adar: 0.3,
            katz: 0.2,
        }
    }
}

impl MetricWeights {
    /// Katz-heavy weights for sources with sparse local structure.
    pub fn sparse() -> Self {
        Self {
            common_neighbors: 0.2,
            jaccard: 0.2,
            adamic_adar: 0.2,
            katz: 0.4,
        }
    }

    fn total(&self) -> f64 {
        self.common_neighbors + self.jaccard + self.adamic_adar + self.katz
    }
}

// ---------------------------------------------------------------------------
// KatzConfig
// ---------------------------------------------------------------------------

/// Bounds for the Katz index path enumeration.
///
/// Exact simple-path counting is O(branching^max_length); `work_budget`
/// bounds the number of node expansions so dense hubs cannot stall a
/// request. On exhaustion the partial sum is returned as a best-effort
/// score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KatzConfig {
    /// Path decay factor β; a path of length l contributes β^l.
    #[serde(default = "default_katz_beta")]
    pub beta: f64,
    /// Maximum simple-path length to enumerate.
    #[serde(default = "default_katz_max_length")]
    pub max_length: usize,
    /// Maximum DFS node expansions per (u, v) pair.
    #[serde(default = "default_katz_work_budget")]
    pub work_budget: usize,
}

impl Default for KatzConfig {
    fn default() -> Self {
        Self {
            beta: default_katz_beta(),
            max_length: default_katz_max_length(),
            work_budget: default_katz_work_budget(),
        }
    }
}

fn default_katz_beta() -> f64 {
    0.1
}

fn default_katz_max_length() -> usize {
    3
}

fn default_katz_work_budget() -> usize {
    200_000
}

// ---------------------------------------------------------------------------
// WalkConfig
// ---------------------------------------------------------------------------

/// Parameters for the personalized random walk (and global PageRank).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Continuation probability α; teleport probability is 1-α.
    #[serde(default = "default_walk_alpha")]
    pub alpha: f64,
    /// Power-iteration budget.
    #[serde(default = "default_walk_max_iter")]
    pub max_iter: usize,
    /// L1 convergence tolerance between successive score vectors.
    #[serde(default = "default_walk_tol")]
    pub tol: f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            alpha: default_walk_alpha(),
            max_iter: default_walk_max_iter(),
            tol: default_walk_tol(),
        }
    }
}

fn default_walk_alpha() -> f64 {
    0.85
}

fn default_walk_max_iter() -> usize {
    100
}

fn default_walk_tol() -> f64 {
    1e-6
}

// ---------------------------------------------------------------------------
// FusionWeights
// ---------------------------------------------------------------------------

/// Per-row weights of the availability-driven fusion table.
///
/// Which row applies depends on which signals exist for a candidate:
/// attribute + interaction, attribute only, interaction only, or neither
/// (graph score passes through unweighted).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// (graph, feature, interaction) when all three signals exist.
    #[serde(default = "default_full_row")]
    pub full: (f64, f64, f64),
    /// (graph, feature) when only attribute similarity exists.
    #[serde(default = "default_feature_row")]
    pub feature_only: (f64, f64),
    /// (graph, interaction) when only interaction history exists.
    #[serde(default = "default_interaction_row")]
    pub interaction_only: (f64, f64),
    /// Upper bound applied to the raw interaction weight before fusion.
    #[serde(default = "default_interaction_cap")]
    pub interaction_cap: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            full: default_full_row(),
            feature_only: default_feature_row(),
            interaction_only: default_interaction_row(),
            interaction_cap: default_interaction_cap(),
        }
    }
}

fn default_full_row() -> (f64, f64, f64) {
    (0.4, 0.4, 0.2)
}

fn default_feature_row() -> (f64, f64) {
    (0.6, 0.4)
}

fn default_interaction_row() -> (f64, f64) {
    (0.7, 0.3)
}

fn default_interaction_cap() -> f64 {
    0.8
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Root configuration for the recommendation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Metric weights used for well-connected sources.
    #[serde(default)]
    pub metric_weights: MetricWeights,
    /// Metric weights used when the source degree falls below
    /// `sparsity_threshold`.
    #[serde(default = "MetricWeights::sparse")]
    pub sparse_metric_weights: MetricWeights,
    /// Source degree below which the sparse weights kick in.
    #[serde(default = "default_sparsity_threshold")]
    pub sparsity_threshold: usize,
    #[serde(default)]
    pub katz: KatzConfig,
    #[serde(default)]
    pub walk: WalkConfig,
    #[serde(default)]
    pub fusion: FusionWeights,
    /// Two-hop candidate pool size fed into metric scoring.
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,
    /// Default number of recommendations returned.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metric_weights: MetricWeights::default(),
            sparse_metric_weights: MetricWeights::sparse(),
            sparsity_threshold: default_sparsity_threshold(),
            katz: KatzConfig::default(),
            walk: WalkConfig::default(),
            fusion: FusionWeights::default(),
            candidate_pool: default_candidate_pool(),
            top_k: default_top_k(),
        }
    }
}

fn default_sparsity_threshold() -> usize {
    2
}

fn default_candidate_pool() -> usize {
    300
}

fn default_top_k() -> usize {
    5
}

impl EngineConfig {
    /// Load a config from a YAML file and validate it.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the scoring pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.metric_weights.total() <= 0.0 || self.sparse_metric_weights.total() <= 0.0 {
            return Err(FriendGraphError::Config(
                "metric weights must sum to a positive total".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.walk.alpha) {
            return Err(FriendGraphError::Config(format!(
                "walk alpha must be in [0, 1), got {}",
                self.walk.alpha
            )));
        }
        if self.walk.tol <= 0.0 {
            return Err(FriendGraphError::Config(
                "walk tolerance must be positive".into(),
            ));
        }
        if self.katz.max_length == 0 {
            return Err(FriendGraphError::Config(
                "katz max_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_shipped_behavior() {
        let c = EngineConfig::default();
        assert_eq!(c.metric_weights.common_neighbors, 0.3);
        assert_eq!(c.sparse_metric_weights.katz, 0.4);
        assert_eq!(c.sparsity_threshold, 2);
        assert_eq!(c.katz.beta, 0.1);
        assert_eq!(c.katz.max_length, 3);
        assert_eq!(c.walk.alpha, 0.85);
        assert_eq!(c.walk.max_iter, 100);
        assert_eq!(c.walk.tol, 1e-6);
        assert_eq!(c.fusion.full, (0.4, 0.4, 0.2));
        assert_eq!(c.fusion.interaction_cap, 0.8);
        assert_eq!(c.candidate_pool, 300);
        assert_eq!(c.top_k, 5);
        c.validate().unwrap();
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "sparsity_threshold: 3\nkatz:\n  beta: 0.05\n";
        let c: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(c.sparsity_threshold, 3);
        assert_eq!(c.katz.beta, 0.05);
        // untouched fields keep their defaults
        assert_eq!(c.katz.max_length, 3);
        assert_eq!(c.walk.alpha, 0.85);
    }

    #[test]
    fn from_yaml_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "top_k: 10\nwalk:\n  alpha: 0.9\n").unwrap();
        let c = EngineConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(c.top_k, 10);
        assert_eq!(c.walk.alpha, 0.9);
    }

    #[test]
    fn zero_metric_weights_rejected() {
        let mut c = EngineConfig::default();
        c.metric_weights = MetricWeights {
            common_neighbors: 0.0,
            jaccard: 0.0,
            adamic_adar: 0.0,
            katz: 0.0,
        };
        assert!(matches!(
            c.validate(),
            Err(FriendGraphError::Config(_))
        ));
    }

    #[test]
    fn alpha_out_of_range_rejected() {
        let mut c = EngineConfig::default();
        c.walk.alpha = 1.0;
        assert!(c.validate().is_err());
    }
}
