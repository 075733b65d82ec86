//! Collaborator interfaces — the spatial database and the graph engine.
//!
//! The query layer only talks to these two traits. [`crate::storage::PoiStore`]
//! and [`crate::graph::WalkGraph`] are the in-memory implementations shipped
//! with the crate; a deployment can back them with anything else.

pub mod category;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PrimitiveError;
use crate::spatial::Coordinate;

pub use category::PoiCategory;

/// Opaque graph node id, owned by the graph engine.
pub type NodeId = u32;

/// Reachable nodes mapped to their walking cost in minutes.
pub type ReachableSet = BTreeMap<NodeId, f64>;

/// A point of interest as returned by the spatial database. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: u64,
    pub category: PoiCategory,
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

impl PointOfInterest {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// A shortest path between two snapped nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPath {
    /// Ordered node ids, both endpoints included.
    pub nodes: Vec<NodeId>,
    pub distance_m: f64,
    pub minutes: f64,
}

/// Point-radius and nearest-k search over POIs.
pub trait SpatialPrimitives {
    /// POIs of `category` within `radius_m` of `center`, nearest first.
    fn radius_search(
        &self,
        center: Coordinate,
        category: PoiCategory,
        radius_m: f64,
    ) -> Result<Vec<PointOfInterest>, PrimitiveError>;

    /// The `k` straight-line nearest POIs of `category`, nearest first.
    /// `usize::MAX` asks for every POI of the category.
    fn nearest_k(
        &self,
        center: Coordinate,
        category: PoiCategory,
        k: usize,
    ) -> Result<Vec<PointOfInterest>, PrimitiveError>;
}

/// Snapping, shortest path and bounded reachability over the walking graph.
pub trait GraphPrimitives {
    /// Snap a coordinate to the closest routable node.
    fn nearest_node(&self, at: Coordinate) -> Result<NodeId, PrimitiveError>;

    /// Cheapest path by walking time. `Ok(None)` when the nodes are in
    /// disconnected components.
    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Option<GraphPath>, PrimitiveError>;

    /// Every node whose cumulative walking cost from `origin` is at most
    /// `max_minutes`, origin included.
    fn reachable_within(
        &self,
        origin: NodeId,
        max_minutes: f64,
    ) -> Result<ReachableSet, PrimitiveError>;

    fn node_coordinate(&self, node: NodeId) -> Result<Coordinate, PrimitiveError>;
}
