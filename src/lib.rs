//! FriendGraph — social graph link prediction and friend recommendation.
//!
//! Builds immutable graph snapshots from a supply payload, scores candidate
//! connections with structural link-prediction metrics and a personalized
//! random walk, and fuses graph, attribute, and interaction signals into a
//! ranked, explained recommendation list.

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod observability;
pub mod types;
