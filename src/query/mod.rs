//! Query engine — six spatial operations over the two primitive collaborators.

pub mod engine;
pub mod isochrone;
pub mod types;

pub use engine::SpatialQueryEngine;
pub use types::*;
