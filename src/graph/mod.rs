//! Walking network — the in-memory graph engine.
//!
//! A petgraph `UnGraph` weighted by walking minutes, with an R-tree over node
//! coordinates for snapping. Implements [`crate::primitives::GraphPrimitives`].

pub mod engine;
pub mod types;

pub use engine::WalkGraph;
pub use types::{GraphStats, WalkEdge, WalkNode};
