//! Error taxonomy for the recommendation engine.
//!
//! Degraded-but-recoverable conditions (empty graphs, missing signals,
//! exhausted Katz/PPR budgets) are **not** errors — they flow through the
//! scoring fallbacks. Only genuinely unanswerable requests surface here.

use crate::types::NodeId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FriendGraphError>;

/// All failure modes the engine can report.
#[derive(Debug, thiserror::Error)]
pub enum FriendGraphError {
    /// A metric or adjacency query named a node the snapshot does not hold.
    /// Recoverable — callers should treat this as "no data for that node".
    #[error("unknown node {0} (not present in the graph snapshot)")]
    UnknownNode(NodeId),

    /// A recommendation request named a source user the snapshot does not
    /// hold. Fails the request fast with a clear "not found" signal.
    #[error("source user {0} not found in the graph snapshot")]
    SourceNotFound(NodeId),

    /// An external collaborator (feature store, graph supply) failed.
    /// Propagated to the caller unchanged; the request fails.
    #[error("data source error: {0}")]
    DataSource(String),

    /// Invalid engine configuration (e.g. weights that sum to zero).
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
