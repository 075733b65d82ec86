//! Query result types.
//!
//! Every operation answers with one of these payloads. Empty collections are
//! legitimate answers, reported through [`QueryOutput::is_empty`].

use serde::{Deserialize, Serialize};

use crate::config::HullMethod;
use crate::places::GeocodeMatch;
use crate::primitives::{NodeId, PoiCategory, PointOfInterest, ReachableSet};
use crate::spatial::Coordinate;

/// How the distances in a result were measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceKind {
    /// As the crow flies; no routing was done.
    StraightLine,
    Walking,
}

// ─── list_pois ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiHit {
    pub id: u64,
    pub category: PoiCategory,
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    pub distance_m: f64,
}

impl PoiHit {
    pub(crate) fn new(poi: &PointOfInterest, distance_m: f64) -> Self {
        Self {
            id: poi.id,
            category: poi.category,
            display_name: poi.display_name.clone(),
            lat: poi.lat,
            lon: poi.lon,
            distance_m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiListing {
    pub center: Coordinate,
    pub category: PoiCategory,
    pub radius_m: f64,
    /// Always `straight_line` for this operation.
    pub distance_kind: DistanceKind,
    /// Matches inside the radius before `limit` was applied.
    pub total_found: usize,
    pub count: usize,
    pub pois: Vec<PoiHit>,
}

// ─── find_nearest_poi_with_route ───────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedPoi {
    pub id: u64,
    pub category: PoiCategory,
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    pub straight_line_m: f64,
    pub walking_m: f64,
    pub walking_minutes: f64,
    /// Walking distance over straight-line distance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detour_factor: Option<f64>,
    pub route: RouteSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestPois {
    pub origin: Coordinate,
    pub category: PoiCategory,
    /// Final straight-line radius of the expanding search.
    pub searched_radius_m: f64,
    pub candidates_routed: usize,
    pub distance_kind: DistanceKind,
    /// Ordered by walking time.
    pub results: Vec<RoutedPoi>,
}

// ─── calculate_route ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub start: Coordinate,
    pub end: Coordinate,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub nodes: Vec<NodeId>,
    /// Node coordinates along the path.
    pub path: Vec<Coordinate>,
    pub distance_m: f64,
    pub minutes: f64,
}

// ─── find_along_route ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorridorPoi {
    pub id: u64,
    pub category: PoiCategory,
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    /// Perpendicular distance from the route.
    pub offset_m: f64,
    /// Distance from the route start to the closest point on the route.
    pub along_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlongRoute {
    pub category: PoiCategory,
    pub corridor_m: f64,
    pub route: RouteSummary,
    /// Ordered by `along_m`.
    pub pois: Vec<CorridorPoi>,
}

// ─── generate_isochrone ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachablePoi {
    pub id: u64,
    pub category: PoiCategory,
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    pub node: NodeId,
    pub walking_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsochroneResult {
    pub origin: Coordinate,
    pub origin_node: NodeId,
    pub max_minutes: f64,
    /// Authoritative answer: reachable node → walking minutes.
    pub reachable: ReachableSet,
    /// Hull of the reachable node coordinates. A visual aid only.
    pub boundary: Vec<Coordinate>,
    pub boundary_method: HullMethod,
    pub boundary_approximate: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pois: Vec<ReachablePoi>,
}

impl IsochroneResult {
    pub fn contains(&self, node: NodeId) -> bool {
        self.reachable.contains_key(&node)
    }

    pub fn node_count(&self) -> usize {
        self.reachable.len()
    }
}

// ─── geocode_place ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeAnswer {
    pub place_name: String,
    pub matches: Vec<GeocodeMatch>,
}

// ─── Output Union ──────────────────────────────────────────────────

/// Payload of any successful operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Pois(PoiListing),
    Nearest(NearestPois),
    Route(RouteSummary),
    AlongRoute(AlongRoute),
    Isochrone(IsochroneResult),
    Geocode(GeocodeAnswer),
}

impl QueryOutput {
    /// A valid query that matched nothing.
    ///
    /// Routes and geocodes are never empty: their failures are typed errors.
    pub fn is_empty(&self) -> bool {
        match self {
            QueryOutput::Pois(l) => l.pois.is_empty(),
            QueryOutput::Nearest(n) => n.results.is_empty(),
            QueryOutput::AlongRoute(a) => a.pois.is_empty(),
            QueryOutput::Isochrone(_) | QueryOutput::Route(_) | QueryOutput::Geocode(_) => false,
        }
    }
}
