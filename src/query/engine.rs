//! SpatialQueryEngine — the six operations, composed from the primitives.
//!
//! Every coordinate is snapped to a graph node before it reaches the graph
//! engine. Arguments arrive already clamped by the dispatcher; the engine
//! still treats non-finite budgets as empty answers rather than panicking.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use super::isochrone;
use super::types::*;
use crate::config::MeridianConfig;
use crate::error::QueryError;
use crate::places::Geocoder;
use crate::primitives::{GraphPrimitives, NodeId, PoiCategory, SpatialPrimitives};
use crate::spatial::{offset_from_polyline, Coordinate};

/// Rounding slack on top of the isochrone POI search bound.
const SNAP_SLACK_M: f64 = 1.0;

pub struct SpatialQueryEngine<S, G> {
    spatial: S,
    graph: G,
    geocoder: Geocoder,
    config: MeridianConfig,
    /// Per category, the farthest any POI sits from its snapped node.
    snap_reach: Mutex<BTreeMap<PoiCategory, f64>>,
}

impl<S: SpatialPrimitives, G: GraphPrimitives> SpatialQueryEngine<S, G> {
    pub fn new(spatial: S, graph: G, geocoder: Geocoder, config: MeridianConfig) -> Self {
        Self {
            spatial,
            graph,
            geocoder,
            config,
            snap_reach: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    pub fn config(&self) -> &MeridianConfig {
        &self.config
    }

    // ─── list_pois ─────────────────────────────────────────────────

    /// POIs within `radius_m`, nearest first, by straight-line distance only.
    pub fn list_pois(
        &self,
        center: Coordinate,
        category: PoiCategory,
        radius_m: f64,
        limit: usize,
    ) -> Result<PoiListing, QueryError> {
        let found = self.spatial.radius_search(center, category, radius_m)?;
        let total_found = found.len();

        let pois: Vec<PoiHit> = found
            .iter()
            .take(limit)
            .map(|p| PoiHit::new(p, center.distance_m(&p.coordinate())))
            .collect();

        info!(%category, radius_m, total_found, "listed pois");
        Ok(PoiListing {
            center,
            category,
            radius_m,
            distance_kind: DistanceKind::StraightLine,
            total_found,
            count: pois.len(),
            pois,
        })
    }

    // ─── find_nearest_poi_with_route ───────────────────────────────

    /// The `count` walking-nearest POIs.
    ///
    /// Straight-line nearest candidates are gathered inside an expanding
    /// radius (bounded doublings up to the cap), routed one by one, and the
    /// routable ones are ordered by walking time.
    pub fn find_nearest_poi_with_route(
        &self,
        origin: Coordinate,
        category: PoiCategory,
        count: usize,
        max_radius_m: Option<f64>,
    ) -> Result<NearestPois, QueryError> {
        let search = &self.config.search;
        let count = count.max(1);
        let cap = match max_radius_m {
            Some(m) if m.is_finite() && m > 0.0 => m.min(search.radius_cap_m),
            _ => search.radius_cap_m,
        };

        let wanted = count * search.candidate_factor;
        let pool = self.spatial.nearest_k(origin, category, wanted)?;
        let distances: Vec<f64> = pool
            .iter()
            .map(|p| origin.distance_m(&p.coordinate()))
            .collect();

        let mut radius = search.initial_radius_m.min(cap);
        let mut doublings = 0;
        let mut inside = distances.iter().filter(|&&d| d <= radius).count();
        while inside < count && doublings < search.max_doublings && radius < cap {
            radius = (radius * 2.0).min(cap);
            doublings += 1;
            inside = distances.iter().filter(|&&d| d <= radius).count();
            debug!(radius_m = radius, inside, doublings, "expanded search radius");
        }

        let candidates: Vec<_> = pool
            .into_iter()
            .zip(distances)
            .filter(|(_, d)| *d <= radius)
            .collect();

        if candidates.is_empty() {
            info!(%category, radius_m = radius, "no candidates within search cap");
            return Ok(NearestPois {
                origin,
                category,
                searched_radius_m: radius,
                candidates_routed: 0,
                distance_kind: DistanceKind::Walking,
                results: Vec::new(),
            });
        }

        let origin_node = self.graph.nearest_node(origin)?;
        let mut results = Vec::with_capacity(candidates.len());
        for (poi, straight_line_m) in &candidates {
            let target = poi.coordinate();
            let target_node = self.graph.nearest_node(target)?;
            let Some(route) = self.route_between(origin, target, origin_node, target_node)? else {
                debug!(poi = poi.id, "candidate unreachable, skipped");
                continue;
            };
            let detour_factor = if *straight_line_m > 0.0 {
                Some(route.distance_m / straight_line_m)
            } else {
                None
            };
            results.push(RoutedPoi {
                id: poi.id,
                category: poi.category,
                display_name: poi.display_name.clone(),
                lat: poi.lat,
                lon: poi.lon,
                straight_line_m: *straight_line_m,
                walking_m: route.distance_m,
                walking_minutes: route.minutes,
                detour_factor,
                route,
            });
        }

        results.sort_by(|a, b| {
            a.walking_minutes
                .total_cmp(&b.walking_minutes)
                .then_with(|| a.walking_m.total_cmp(&b.walking_m))
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(count);

        info!(%category, routed = candidates.len(), returned = results.len(), "nearest pois routed");
        Ok(NearestPois {
            origin,
            category,
            searched_radius_m: radius,
            candidates_routed: candidates.len(),
            distance_kind: DistanceKind::Walking,
            results,
        })
    }

    // ─── calculate_route ───────────────────────────────────────────

    /// Shortest walking route. Disconnected endpoints are `Unreachable`.
    pub fn calculate_route(&self, start: Coordinate, end: Coordinate) -> Result<RouteSummary, QueryError> {
        let start_node = self.graph.nearest_node(start)?;
        let end_node = self.graph.nearest_node(end)?;

        let route = self
            .route_between(start, end, start_node, end_node)?
            .ok_or(QueryError::Unreachable {
                from: start_node,
                to: end_node,
            })?;

        info!(
            start_node,
            end_node,
            distance_m = route.distance_m,
            minutes = route.minutes,
            "route calculated"
        );
        Ok(route)
    }

    fn route_between(
        &self,
        start: Coordinate,
        end: Coordinate,
        start_node: NodeId,
        end_node: NodeId,
    ) -> Result<Option<RouteSummary>, QueryError> {
        let Some(path) = self.graph.shortest_path(start_node, end_node)? else {
            return Ok(None);
        };
        let coords = path
            .nodes
            .iter()
            .map(|&n| self.graph.node_coordinate(n))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(RouteSummary {
            start,
            end,
            start_node,
            end_node,
            nodes: path.nodes,
            path: coords,
            distance_m: path.distance_m,
            minutes: path.minutes,
        }))
    }

    // ─── find_along_route ──────────────────────────────────────────

    /// POIs within `corridor_m` of the route polyline, ordered along the route.
    pub fn find_along_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        category: PoiCategory,
        corridor_m: f64,
    ) -> Result<AlongRoute, QueryError> {
        let route = self.calculate_route(start, end)?;

        let (center, half_diagonal) = enclosing_circle(&route.path);
        let search_radius = half_diagonal + corridor_m;
        let candidates = self.spatial.radius_search(center, category, search_radius)?;
        debug!(candidates = candidates.len(), search_radius, "corridor candidates");

        let mut pois: Vec<CorridorPoi> = candidates
            .iter()
            .filter_map(|p| {
                let offset = offset_from_polyline(&p.coordinate(), &route.path)?;
                (offset.offset_m <= corridor_m).then(|| CorridorPoi {
                    id: p.id,
                    category: p.category,
                    display_name: p.display_name.clone(),
                    lat: p.lat,
                    lon: p.lon,
                    offset_m: offset.offset_m,
                    along_m: offset.along_m,
                })
            })
            .collect();

        pois.sort_by(|a, b| {
            a.along_m
                .total_cmp(&b.along_m)
                .then_with(|| a.offset_m.total_cmp(&b.offset_m))
                .then_with(|| a.id.cmp(&b.id))
        });

        info!(%category, corridor_m, found = pois.len(), "pois along route");
        Ok(AlongRoute {
            category,
            corridor_m,
            route,
            pois,
        })
    }

    // ─── generate_isochrone ────────────────────────────────────────

    /// Nodes reachable within `max_minutes`, with a derived boundary.
    ///
    /// POIs of `poi_types` are included when their snapped node is reachable.
    pub fn generate_isochrone(
        &self,
        origin: Coordinate,
        max_minutes: f64,
        poi_types: &[PoiCategory],
    ) -> Result<IsochroneResult, QueryError> {
        let origin_node = self.graph.nearest_node(origin)?;
        let reachable = if max_minutes.is_finite() && max_minutes >= 0.0 {
            self.graph.reachable_within(origin_node, max_minutes)?
        } else {
            BTreeMap::new()
        };

        let coords = reachable
            .keys()
            .map(|&n| self.graph.node_coordinate(n))
            .collect::<Result<Vec<_>, _>>()?;
        let iso = &self.config.isochrone;
        let boundary = isochrone::boundary(&coords, iso.hull, iso.concavity);

        let mut pois = Vec::new();
        if !poi_types.is_empty() && !reachable.is_empty() {
            // A POI whose snapped node is reachable lies within the farthest
            // reachable node plus its own snap distance of the origin.
            let farthest = coords.iter().map(|c| origin.distance_m(c)).fold(0.0, f64::max);

            for &category in poi_types {
                let radius = farthest + self.snap_reach(category)? + SNAP_SLACK_M;
                for poi in self.spatial.radius_search(origin, category, radius)? {
                    let node = self.graph.nearest_node(poi.coordinate())?;
                    if let Some(&walking_minutes) = reachable.get(&node) {
                        pois.push(ReachablePoi {
                            id: poi.id,
                            category: poi.category,
                            display_name: poi.display_name.clone(),
                            lat: poi.lat,
                            lon: poi.lon,
                            node,
                            walking_minutes,
                        });
                    }
                }
            }
            pois.sort_by(|a, b| {
                a.walking_minutes
                    .total_cmp(&b.walking_minutes)
                    .then_with(|| a.id.cmp(&b.id))
            });
            pois.dedup_by_key(|p| p.id);
        }

        info!(
            origin_node,
            max_minutes,
            reachable = reachable.len(),
            pois = pois.len(),
            "isochrone generated"
        );
        Ok(IsochroneResult {
            origin,
            origin_node,
            max_minutes,
            reachable,
            boundary,
            boundary_method: iso.hull,
            boundary_approximate: true,
            pois,
        })
    }

    /// Farthest any POI of `category` sits from its snapped node, computed
    /// once per category.
    fn snap_reach(&self, category: PoiCategory) -> Result<f64, QueryError> {
        let mut cache = self.snap_reach.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&reach) = cache.get(&category) {
            return Ok(reach);
        }

        let mut reach: f64 = 0.0;
        for poi in self.spatial.nearest_k(Coordinate::new(0.0, 0.0), category, usize::MAX)? {
            let at = poi.coordinate();
            let node = self.graph.nearest_node(at)?;
            reach = reach.max(at.distance_m(&self.graph.node_coordinate(node)?));
        }
        debug!(%category, reach_m = reach, "poi snap reach computed");
        cache.insert(category, reach);
        Ok(reach)
    }

    // ─── geocode_place ─────────────────────────────────────────────

    pub fn geocode_place(&self, place_name: &str, max_results: usize) -> Result<GeocodeAnswer, QueryError> {
        let matches = self.geocoder.lookup(place_name, max_results)?;
        Ok(GeocodeAnswer {
            place_name: place_name.to_string(),
            matches,
        })
    }
}

/// Bounding-box center of `path` and the distance to its farthest corner.
fn enclosing_circle(path: &[Coordinate]) -> (Coordinate, f64) {
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
    for c in path {
        min_lat = min_lat.min(c.lat);
        max_lat = max_lat.max(c.lat);
        min_lon = min_lon.min(c.lon);
        max_lon = max_lon.max(c.lon);
    }
    if path.is_empty() {
        return (Coordinate::new(0.0, 0.0), 0.0);
    }

    let center = Coordinate::new((min_lat + max_lat) / 2.0, (min_lon + max_lon) / 2.0);
    let radius = [
        Coordinate::new(min_lat, min_lon),
        Coordinate::new(min_lat, max_lon),
        Coordinate::new(max_lat, min_lon),
        Coordinate::new(max_lat, max_lon),
    ]
    .iter()
    .map(|corner| center.distance_m(corner))
    .fold(0.0, f64::max);
    (center, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrimitiveError;
    use crate::graph::{WalkEdge, WalkGraph, WalkNode};
    use crate::places::{PlaceEntry, PlaceIndex};
    use crate::primitives::PointOfInterest;
    use crate::storage::PoiStore;
    use std::sync::Arc;

    // Nodes on the equator, 0.001° (~111 m) apart: 1-2-3-4 in a line,
    // island 5-6 far away.
    fn graph() -> WalkGraph {
        let node = |id: u64, lat: f64, lon: f64| WalkNode { source_id: id, lat, lon };
        let edge = |m: f64| WalkEdge { length_m: m, minutes: m / 100.0 };
        WalkGraph::from_parts(
            vec![
                node(1, 0.0, 0.000),
                node(2, 0.0, 0.001),
                node(3, 0.0, 0.002),
                node(4, 0.0, 0.003),
                node(5, 1.0, 1.000),
                node(6, 1.0, 1.001),
            ],
            vec![
                (1, 2, edge(100.0)),
                (2, 3, edge(100.0)),
                (3, 4, edge(100.0)),
                (5, 6, edge(100.0)),
            ],
        )
        .unwrap()
    }

    fn poi(id: u64, category: PoiCategory, lat: f64, lon: f64) -> PointOfInterest {
        PointOfInterest {
            id,
            category,
            lat,
            lon,
            display_name: format!("poi {}", id),
        }
    }

    fn engine(pois: Vec<PointOfInterest>) -> SpatialQueryEngine<PoiStore, WalkGraph> {
        engine_on(graph(), pois, MeridianConfig::default())
    }

    fn engine_on(
        graph: WalkGraph,
        pois: Vec<PointOfInterest>,
        config: MeridianConfig,
    ) -> SpatialQueryEngine<PoiStore, WalkGraph> {
        let places = Arc::new(PlaceIndex::new(vec![PlaceEntry::new("Camp 1", 0.0, 0.0)]));
        SpatialQueryEngine::new(PoiStore::new(pois), graph, Geocoder::new(places), config)
    }

    /// Graph from `(id, lat, lon)` nodes and `(from, to, metres)` edges at 100 m/min.
    fn network(nodes: &[(u64, f64, f64)], edges: &[(u64, u64, f64)]) -> WalkGraph {
        WalkGraph::from_parts(
            nodes
                .iter()
                .map(|&(source_id, lat, lon)| WalkNode { source_id, lat, lon })
                .collect(),
            edges
                .iter()
                .map(|&(a, b, m)| (a, b, WalkEdge { length_m: m, minutes: m / 100.0 }))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_list_pois_limit_and_total() {
        let e = engine(vec![
            poi(1, PoiCategory::Pharmacy, 0.0, 0.001),
            poi(2, PoiCategory::Pharmacy, 0.0, 0.002),
            poi(3, PoiCategory::Pharmacy, 0.0, 0.003),
        ]);
        let listing = e
            .list_pois(Coordinate::new(0.0, 0.0), PoiCategory::Pharmacy, 1000.0, 2)
            .unwrap();
        assert_eq!(listing.total_found, 3);
        assert_eq!(listing.count, 2);
        assert_eq!(listing.distance_kind, DistanceKind::StraightLine);
        assert!(listing.pois[0].distance_m <= listing.pois[1].distance_m);
    }

    #[test]
    fn test_route_reports_path_coordinates() {
        let e = engine(vec![]);
        let route = e
            .calculate_route(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.003))
            .unwrap();
        assert_eq!(route.nodes, vec![0, 1, 2, 3]);
        assert_eq!(route.path.len(), 4);
        assert_eq!(route.distance_m, 300.0);
        assert!((route.minutes - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_route_across_components_is_unreachable() {
        let e = engine(vec![]);
        let err = e
            .calculate_route(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0))
            .unwrap_err();
        assert_eq!(err, QueryError::Unreachable { from: 0, to: 4 });
    }

    #[test]
    fn test_nearest_skips_unreachable_and_orders_by_walk() {
        let e = engine(vec![
            poi(1, PoiCategory::Clinic, 0.0, 0.003),
            poi(2, PoiCategory::Clinic, 0.0, 0.001),
            poi(3, PoiCategory::Clinic, 1.0, 1.0),
        ]);
        let nearest = e
            .find_nearest_poi_with_route(Coordinate::new(0.0, 0.0), PoiCategory::Clinic, 3, None)
            .unwrap();
        let ids: Vec<u64> = nearest.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1], "island clinic is outside the cap and unreachable");
        assert!(nearest.results[0].detour_factor.is_some());
    }

    #[test]
    fn test_nearest_empty_is_not_an_error() {
        let e = engine(vec![]);
        let nearest = e
            .find_nearest_poi_with_route(Coordinate::new(0.0, 0.0), PoiCategory::Hospital, 3, None)
            .unwrap();
        assert!(nearest.results.is_empty());
        assert!(QueryOutput::Nearest(nearest).is_empty());
    }

    #[test]
    fn test_nearest_respects_max_radius() {
        let e = engine(vec![poi(1, PoiCategory::Clinic, 0.0, 0.003)]);
        let nearest = e
            .find_nearest_poi_with_route(Coordinate::new(0.0, 0.0), PoiCategory::Clinic, 1, Some(100.0))
            .unwrap();
        assert!(nearest.results.is_empty());
        assert_eq!(nearest.searched_radius_m, 100.0);
    }

    #[test]
    fn test_nearest_reorders_behind_barrier() {
        // Clinic 10 is 100 m north but only reachable around a ditch
        // (east, north, back west); clinic 11 is 222 m down a straight path.
        let g = network(
            &[
                (1, 0.0, 0.0),
                (2, 0.0, -0.002),
                (3, 0.0, 0.003),
                (4, 0.001, 0.003),
                (5, 0.001, 0.0),
            ],
            &[(1, 2, 222.0), (1, 3, 333.0), (3, 4, 111.0), (4, 5, 333.0)],
        );
        let e = engine_on(
            g,
            vec![
                poi(10, PoiCategory::Clinic, 0.0009, 0.0),
                poi(11, PoiCategory::Clinic, 0.0, -0.002),
            ],
            MeridianConfig::default(),
        );
        let nearest = e
            .find_nearest_poi_with_route(Coordinate::new(0.0, 0.0), PoiCategory::Clinic, 2, None)
            .unwrap();

        let ids: Vec<u64> = nearest.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![11, 10]);
        assert!(nearest.results[0].straight_line_m > nearest.results[1].straight_line_m);
        assert!(nearest.results[0].walking_minutes < nearest.results[1].walking_minutes);
        assert_eq!(nearest.results[1].walking_m, 777.0);
        assert!(nearest.results[1].detour_factor.unwrap() > 5.0);
    }

    #[test]
    fn test_nearest_radius_doubles_until_found() {
        // ~2224 m north: found after 500 -> 1000 -> 2000 -> 4000.
        let g = network(&[(1, 0.0, 0.0), (2, 0.02, 0.0)], &[(1, 2, 2224.0)]);
        let e = engine_on(g, vec![poi(1, PoiCategory::Clinic, 0.02, 0.0)], MeridianConfig::default());
        let origin = Coordinate::new(0.0, 0.0);

        let nearest = e.find_nearest_poi_with_route(origin, PoiCategory::Clinic, 1, None).unwrap();
        assert_eq!(nearest.searched_radius_m, 4000.0);
        assert_eq!(nearest.results.len(), 1);

        let capped = e
            .find_nearest_poi_with_route(origin, PoiCategory::Clinic, 1, Some(3000.0))
            .unwrap();
        assert_eq!(capped.searched_radius_m, 3000.0);
        assert_eq!(capped.results.len(), 1);
    }

    #[test]
    fn test_nearest_radius_stops_at_cap() {
        // ~6672 m north, beyond the 5000 m cap.
        let g = network(&[(1, 0.0, 0.0), (2, 0.06, 0.0)], &[(1, 2, 6672.0)]);
        let mut config = MeridianConfig::default();
        config.search.max_doublings = 10;
        let e = engine_on(g, vec![poi(1, PoiCategory::Clinic, 0.06, 0.0)], config);

        let nearest = e
            .find_nearest_poi_with_route(Coordinate::new(0.0, 0.0), PoiCategory::Clinic, 1, None)
            .unwrap();
        assert_eq!(nearest.searched_radius_m, 5000.0);
        assert!(nearest.results.is_empty());
        assert_eq!(nearest.candidates_routed, 0);
    }

    #[test]
    fn test_along_route_uses_corridor_not_endpoints() {
        let e = engine(vec![
            // Midpoint of the route, 55 m off it.
            poi(1, PoiCategory::School, 0.0005, 0.0015),
            // 550 m off the route.
            poi(2, PoiCategory::School, 0.005, 0.0015),
            poi(3, PoiCategory::School, 0.0, 0.0029),
        ]);
        let along = e
            .find_along_route(
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 0.003),
                PoiCategory::School,
                100.0,
            )
            .unwrap();
        let ids: Vec<u64> = along.pois.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(along.pois[0].along_m < along.pois[1].along_m);
    }

    #[test]
    fn test_isochrone_monotone_and_lists_reachable_pois() {
        let e = engine(vec![
            poi(1, PoiCategory::Shelter, 0.0, 0.001),
            poi(2, PoiCategory::Shelter, 0.0, 0.003),
        ]);
        let origin = Coordinate::new(0.0, 0.0);
        let small = e.generate_isochrone(origin, 1.5, &[PoiCategory::Shelter]).unwrap();
        let large = e.generate_isochrone(origin, 3.0, &[PoiCategory::Shelter]).unwrap();

        assert_eq!(small.node_count(), 2);
        assert_eq!(large.node_count(), 4);
        assert!(small.reachable.keys().all(|n| large.contains(*n)));
        assert!(small.boundary_approximate);

        let small_ids: Vec<u64> = small.pois.iter().map(|p| p.id).collect();
        assert_eq!(small_ids, vec![1]);
        assert_eq!(large.pois.len(), 2);
    }

    #[test]
    fn test_isochrone_lists_poi_far_from_its_node() {
        // ~556 m north of node 1, which it snaps to.
        let e = engine(vec![poi(7, PoiCategory::Shelter, 0.005, 0.0)]);
        let iso = e
            .generate_isochrone(Coordinate::new(0.0, 0.0), 1.5, &[PoiCategory::Shelter])
            .unwrap();

        assert_eq!(iso.node_count(), 2);
        assert_eq!(iso.pois.len(), 1);
        assert_eq!(iso.pois[0].id, 7);
        assert_eq!(iso.pois[0].node, 0);
        assert_eq!(iso.pois[0].walking_minutes, 0.0);
    }

    struct FailingSpatial;

    impl SpatialPrimitives for FailingSpatial {
        fn radius_search(
            &self,
            _: Coordinate,
            _: PoiCategory,
            _: f64,
        ) -> Result<Vec<PointOfInterest>, PrimitiveError> {
            Err(PrimitiveError::Timeout(500))
        }

        fn nearest_k(
            &self,
            _: Coordinate,
            _: PoiCategory,
            _: usize,
        ) -> Result<Vec<PointOfInterest>, PrimitiveError> {
            Err(PrimitiveError::Backend("connection reset".to_string()))
        }
    }

    #[test]
    fn test_primitive_failures_are_typed() {
        let places = Arc::new(PlaceIndex::new(vec![]));
        let e = SpatialQueryEngine::new(FailingSpatial, graph(), Geocoder::new(places), MeridianConfig::default());
        let origin = Coordinate::new(0.0, 0.0);

        let err = e.list_pois(origin, PoiCategory::Bank, 500.0, 10).unwrap_err();
        assert!(matches!(err, QueryError::Timeout(_)));

        let err = e.find_nearest_poi_with_route(origin, PoiCategory::Bank, 1, None).unwrap_err();
        assert!(matches!(err, QueryError::PrimitiveFailure(_)));
    }

    #[test]
    fn test_geocode_place_not_found() {
        let e = engine(vec![]);
        assert_eq!(e.geocode_place("Camp 1", 3).unwrap().matches.len(), 1);
        assert!(matches!(e.geocode_place("Nowhere", 3), Err(QueryError::NotFound(_))));
    }
}
