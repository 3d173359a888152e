//! Request-scoped recommendation pipeline.
//!
//! The engine is the only component that talks to external collaborators:
//! a [`GraphSource`] supplies the raw graph payload and a [`SignalProvider`]
//! supplies attribute-similarity and interaction signals per candidate pair.
//! Everything else is pure computation over an immutable snapshot, so the
//! engine is safe to call concurrently — each request either builds its own
//! snapshot or borrows a shared one through the swap-on-rebuild TTL cache.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::engine::fusion;
use crate::error::{FriendGraphError, Result};
use crate::graph::candidates;
use crate::graph::metrics::LinkMetrics;
use crate::graph::snapshot::GraphSnapshot;
use crate::types::{
    CandidateScore, CandidateSignals, GraphInput, NodeId, Recommendation, RecommendationResponse,
};

/// An edge weighing 1.0 is a confirmed relationship; anything lower is
/// inferred from interactions.
const CONFIRMED_WEIGHT: f64 = 1.0;

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Supplies the raw graph payload (the feature-store collaborator).
pub trait GraphSource: Send + Sync {
    fn load(&self) -> Result<GraphInput>;
}

/// Supplies attribute-similarity and interaction signals for a
/// (user, candidate) pair.
///
/// Returning [`CandidateSignals`] with `None` fields means "no signal for
/// this pair" and degrades that candidate via the fusion fallback rows.
/// Returning an error fails the whole request as a data-source failure.
pub trait SignalProvider: Send + Sync {
    fn signals(&self, user: NodeId, candidate: NodeId) -> Result<CandidateSignals>;
}

/// Provider with no external signals: every candidate scores graph-only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignals;

impl SignalProvider for NoSignals {
    fn signals(&self, _user: NodeId, _candidate: NodeId) -> Result<CandidateSignals> {
        Ok(CandidateSignals::default())
    }
}

/// In-memory provider backed by a fixed signal table. Used by the CLI
/// (signals loaded from a JSON file) and by tests.
#[derive(Debug, Default, Clone)]
pub struct StaticSignals {
    table: std::collections::HashMap<(NodeId, NodeId), CandidateSignals>,
}

impl StaticSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: NodeId, candidate: NodeId, signals: CandidateSignals) {
        self.table.insert((user, candidate), signals);
    }
}

impl SignalProvider for StaticSignals {
    fn signals(&self, user: NodeId, candidate: NodeId) -> Result<CandidateSignals> {
        Ok(self
            .table
            .get(&(user, candidate))
            .copied()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// SnapshotCache
// ---------------------------------------------------------------------------

/// TTL-bounded holder of the current snapshot.
///
/// Readers clone the `Arc` and keep a consistent snapshot for the whole
/// request; rebuilds swap the entry atomically under the lock, so a rebuild
/// never mutates a snapshot another request is still reading.
struct SnapshotCache {
    ttl: Duration,
    entry: Mutex<Option<(Instant, Arc<GraphSnapshot>)>>,
}

impl SnapshotCache {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    fn get_or_build(&self, source: &dyn GraphSource) -> Result<Arc<GraphSnapshot>> {
        let mut entry = self
            .entry
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some((built_at, snapshot)) = entry.as_ref() {
            if built_at.elapsed() < self.ttl {
                return Ok(Arc::clone(snapshot));
            }
        }

        let input = source.load()?;
        let snapshot = Arc::new(GraphSnapshot::build(input));
        tracing::info!(
            nodes = snapshot.num_nodes(),
            edges = snapshot.num_edges(),
            "built graph snapshot"
        );
        *entry = Some((Instant::now(), Arc::clone(&snapshot)));
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// RecommendationEngine
// ---------------------------------------------------------------------------

/// Orchestrates snapshot building, candidate generation, metric scoring,
/// and signal fusion into one ranked, explained response.
pub struct RecommendationEngine<G, S> {
    graph_source: G,
    signals: S,
    config: EngineConfig,
    cache: SnapshotCache,
}

impl<G: GraphSource, S: SignalProvider> RecommendationEngine<G, S> {
    /// Engine that rebuilds the snapshot on every request.
    pub fn new(graph_source: G, signals: S, config: EngineConfig) -> Self {
        Self::with_snapshot_ttl(graph_source, signals, config, Duration::ZERO)
    }

    /// Engine that reuses a snapshot for up to `ttl` across requests.
    pub fn with_snapshot_ttl(
        graph_source: G,
        signals: S,
        config: EngineConfig,
        ttl: Duration,
    ) -> Self {
        Self {
            graph_source,
            signals,
            config,
            cache: SnapshotCache::new(ttl),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produce the ranked recommendation list for `user`.
    ///
    /// `top_k` overrides the configured default when given. Fails fast with
    /// [`FriendGraphError::SourceNotFound`] for an unknown user; collaborator
    /// failures propagate unchanged. Degraded conditions (sparse graph,
    /// missing signals, exhausted budgets) lower score quality instead of
    /// failing the request.
    pub fn recommend(&self, user: NodeId, top_k: Option<usize>) -> Result<RecommendationResponse> {
        let top_k = top_k.unwrap_or(self.config.top_k);
        let snapshot = self.cache.get_or_build(&self.graph_source)?;

        if !snapshot.contains(user) {
            return Err(FriendGraphError::SourceNotFound(user));
        }

        let graph_stats = snapshot.stats();
        tracing::info!(
            user,
            nodes = graph_stats.num_nodes,
            edges = graph_stats.num_edges,
            components = graph_stats.num_components,
            "serving recommendation request"
        );
        let source_metrics = snapshot.node_metrics(user, &self.config.walk)?;

        // Only confirmed relationships count as existing connections;
        // interaction-weight edges stay eligible as candidates.
        let existing: BTreeSet<NodeId> = snapshot
            .neighbors(user)?
            .iter()
            .copied()
            .filter(|&n| {
                snapshot
                    .edge_weight(user, n)
                    .is_some_and(|w| w >= CONFIRMED_WEIGHT)
            })
            .collect();

        // Sparse sources lean on Katz to compensate for thin local structure.
        let weights = if source_metrics.degree < self.config.sparsity_threshold {
            &self.config.sparse_metric_weights
        } else {
            &self.config.metric_weights
        };

        let metrics = LinkMetrics::new(&snapshot, self.config.katz);
        let pool = candidates::generate(
            &snapshot,
            user,
            &existing,
            self.config.candidate_pool,
            &self.config.walk,
        );

        // The two-hop pool bounds the Katz cost on dense neighborhoods.
        // When it underfills the slate, top it up from the full scan so
        // distant-but-connected candidates still surface.
        let slate = top_k * 2;
        let pool_ids: Vec<NodeId> = pool.iter().map(|&(id, _)| id).collect();
        let mut ranked = metrics.score_candidates(user, &pool_ids, weights)?;
        ranked.truncate(slate);
        if ranked.len() < slate {
            let mut scanned = existing.clone();
            scanned.extend(ranked.iter().map(|&(id, _)| id));
            let extra = metrics.predict_links(user, &scanned, slate - ranked.len(), weights)?;
            ranked.extend(extra);
        }

        // Per-candidate fusion is independent, so fetch + fuse in parallel.
        let mut recommendations = ranked
            .into_par_iter()
            .map(|(candidate, score)| self.fuse_candidate(&snapshot, user, candidate, score))
            .collect::<Result<Vec<Recommendation>>>()?;

        recommendations.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.candidate_id.cmp(&b.candidate_id))
        });
        recommendations.truncate(top_k);

        tracing::info!(
            user,
            count = recommendations.len(),
            "generated recommendations"
        );

        Ok(RecommendationResponse {
            recommendations,
            graph_stats,
            source_metrics,
        })
    }

    fn fuse_candidate(
        &self,
        snapshot: &GraphSnapshot,
        user: NodeId,
        candidate: NodeId,
        score: CandidateScore,
    ) -> Result<Recommendation> {
        let mut signals = self.signals.signals(user, candidate)?;

        // When the provider has no interaction signal, fall back to the
        // inferred interaction edge weight already in the graph (existing
        // confirmed connections were excluded upstream, so any edge here is
        // interaction-derived).
        if signals.interaction_weight.is_none() {
            signals.interaction_weight = snapshot.edge_weight(user, candidate);
        }

        let fused = fusion::fuse(&score, &signals, &self.config.fusion);
        let attributes = snapshot.attributes(candidate).cloned().unwrap_or_default();

        Ok(Recommendation {
            candidate_id: candidate,
            username: attributes.username,
            display_name: attributes.display_name,
            total_score: fused.total_score,
            graph_metrics: score,
            feature_similarity: signals.features.unwrap_or_default(),
            interaction_score: fused.interaction_score,
            reasons: fused.reasons,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
