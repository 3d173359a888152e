//! Engine layer: signal fusion and the request-scoped recommendation
//! pipeline with its external collaborator traits.

pub mod fusion;
pub mod recommend;
