//! Graph layer: immutable snapshots, link-prediction metrics, random walks,
//! and two-hop candidate generation.

pub mod candidates;
pub mod centrality;
pub mod metrics;
pub mod snapshot;
pub mod walk;
