//! Graph node/edge weights and statistics.

use serde::{Deserialize, Serialize};

use crate::spatial::Coordinate;

/// Node weight: the dataset's own id plus its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkNode {
    pub source_id: u64,
    pub lat: f64,
    pub lon: f64,
}

impl WalkNode {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Edge weight. `minutes` is the routing cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkEdge {
    pub length_m: f64,
    pub minutes: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub components: usize,
    pub total_length_km: f64,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes, {} edges, {} components, {:.1} km walkable",
            self.node_count, self.edge_count, self.components, self.total_length_km
        )
    }
}
