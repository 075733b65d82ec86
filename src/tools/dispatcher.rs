//! ToolDispatcher — validates an intent, repairs it, and runs it.
//!
//! Validation is total: every intent becomes either a [`ToolCall`] or a typed
//! rejection. Coordinates are resolved in a fixed order: explicit numbers,
//! then place-name arguments, then places named in the query text.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::repair::{category_from_text, Args, Bounds};
use super::types::{Answer, Intent, Operation, Repair, ToolCall, ToolResponse};
use crate::error::QueryError;
use crate::places::{GeocodeMatch, Geocoder, PlaceRole};
use crate::primitives::{GraphPrimitives, PoiCategory, SpatialPrimitives};
use crate::query::{QueryOutput, SpatialQueryEngine};
use crate::spatial::Coordinate;

const POI_TYPE_KEYS: &[&str] = &["poi_type", "category", "amenity", "type"];
const LAT_KEYS: &[&str] = &["lat", "latitude"];
const LON_KEYS: &[&str] = &["lon", "lng", "longitude"];
const START_LAT_KEYS: &[&str] = &["start_lat", "origin_lat"];
const START_LON_KEYS: &[&str] = &["start_lon", "start_lng", "origin_lon"];
const END_LAT_KEYS: &[&str] = &["end_lat", "dest_lat", "destination_lat"];
const END_LON_KEYS: &[&str] = &["end_lon", "end_lng", "dest_lon", "destination_lon"];
const PLACE_KEYS: &[&str] = &["place_name", "place", "location"];
const START_PLACE_KEYS: &[&str] = &["start_place", "from", "origin"];
const END_PLACE_KEYS: &[&str] = &["end_place", "to", "destination"];

pub struct ToolDispatcher<S, G> {
    engine: SpatialQueryEngine<S, G>,
}

impl<S: SpatialPrimitives, G: GraphPrimitives> ToolDispatcher<S, G> {
    pub fn new(engine: SpatialQueryEngine<S, G>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SpatialQueryEngine<S, G> {
        &self.engine
    }

    /// Validate and run `intent`. `query` is the user's original text, used
    /// as the last geocoding fallback.
    pub fn dispatch(&self, intent: &Intent, query: &str) -> Result<Answer, QueryError> {
        let (call, repairs) = self.validate(intent, query).map_err(|e| {
            warn!(tool = %intent.tool, kind = %e.kind(), error = %e, "intent rejected");
            e
        })?;
        let operation = call.operation();
        debug!(?call, "validated call");

        let output = self.execute(&call).map_err(|e| {
            warn!(%operation, kind = %e.kind(), error = %e, "operation failed");
            e
        })?;

        info!(
            %operation,
            empty = output.is_empty(),
            repairs = repairs.len(),
            "intent dispatched"
        );
        Ok(Answer {
            operation,
            output,
            repairs,
        })
    }

    /// [`dispatch`](Self::dispatch) wrapped in the response envelope.
    pub fn respond(&self, intent: &Intent, query: &str) -> ToolResponse {
        self.dispatch(intent, query).into()
    }

    /// Run an already validated call.
    pub fn execute(&self, call: &ToolCall) -> Result<QueryOutput, QueryError> {
        let e = &self.engine;
        Ok(match call {
            ToolCall::ListPois {
                center,
                category,
                radius_m,
                limit,
            } => QueryOutput::Pois(e.list_pois(*center, *category, *radius_m, *limit)?),
            ToolCall::FindNearestPoiWithRoute {
                origin,
                category,
                count,
                max_radius_m,
            } => QueryOutput::Nearest(e.find_nearest_poi_with_route(*origin, *category, *count, *max_radius_m)?),
            ToolCall::CalculateRoute { start, end } => QueryOutput::Route(e.calculate_route(*start, *end)?),
            ToolCall::FindAlongRoute {
                start,
                end,
                category,
                corridor_m,
            } => QueryOutput::AlongRoute(e.find_along_route(*start, *end, *category, *corridor_m)?),
            ToolCall::GenerateIsochrone {
                origin,
                max_minutes,
                poi_types,
            } => QueryOutput::Isochrone(e.generate_isochrone(*origin, *max_minutes, poi_types)?),
            ToolCall::GeocodePlace {
                place_name,
                max_results,
            } => QueryOutput::Geocode(e.geocode_place(place_name, *max_results)?),
        })
    }

    /// Turn an untrusted intent into a call, recording every repair.
    pub fn validate(&self, intent: &Intent, query: &str) -> Result<(ToolCall, Vec<Repair>), QueryError> {
        let operation: Operation = intent.tool.parse()?;
        let limits = &self.engine.config().limits;
        let mut args = Args::new(&intent.arguments);
        let mut places = TextPlaces::new(self.engine.geocoder(), query);

        let call = match operation {
            Operation::ListPois => {
                let category = poi_type(&mut args, query)?;
                let center = self.single_point(&mut args, &mut places)?;
                let radius_m = args.clamped(
                    &["radius_m", "radius"],
                    Bounds::new(limits.min_radius_m, limits.max_radius_m, limits.default_radius_m),
                );
                let limit = args.count(&["limit"], 1, limits.max_list, limits.default_list);
                ToolCall::ListPois {
                    center,
                    category,
                    radius_m,
                    limit,
                }
            }
            Operation::FindNearestPoiWithRoute => {
                let category = poi_type(&mut args, query)?;
                let origin = self.single_point(&mut args, &mut places)?;
                let count = args.count(
                    &["limit", "count", "k", "max_results"],
                    1,
                    limits.max_nearest,
                    limits.default_nearest,
                );
                let max_radius_m = if args.has(&["max_radius_m"]) {
                    Some(args.clamped(
                        &["max_radius_m"],
                        Bounds::new(limits.min_radius_m, limits.max_radius_m, limits.max_radius_m),
                    ))
                } else {
                    None
                };
                ToolCall::FindNearestPoiWithRoute {
                    origin,
                    category,
                    count,
                    max_radius_m,
                }
            }
            Operation::CalculateRoute => {
                let (start, end) = self.route_points(&mut args, &mut places)?;
                ToolCall::CalculateRoute { start, end }
            }
            Operation::FindAlongRoute => {
                let category = poi_type(&mut args, query)?;
                let (start, end) = self.route_points(&mut args, &mut places)?;
                let corridor_m = args.clamped(
                    &["corridor_m", "buffer_m", "corridor_width_m", "width_m"],
                    Bounds::new(limits.min_corridor_m, limits.max_corridor_m, limits.default_corridor_m),
                );
                ToolCall::FindAlongRoute {
                    start,
                    end,
                    category,
                    corridor_m,
                }
            }
            Operation::GenerateIsochrone => {
                let origin = self.single_point(&mut args, &mut places)?;
                let max_minutes = args.clamped(
                    &["max_minutes", "minutes", "time_minutes", "max_time"],
                    Bounds::new(limits.min_minutes, limits.max_minutes, limits.default_minutes),
                );
                let poi_types = isochrone_poi_types(&args, self.engine.config().isochrone.include_pois)?;
                ToolCall::GenerateIsochrone {
                    origin,
                    max_minutes,
                    poi_types,
                }
            }
            Operation::GeocodePlace => {
                let place_name = match args.text(&["place_name", "place", "name", "location", "query"]) {
                    Some(name) => name,
                    None => {
                        let text = query.trim();
                        if text.is_empty() {
                            return Err(QueryError::NotFound(String::new()));
                        }
                        args.record("place_name", Value::Null, json!(text), "taken from query text");
                        text.to_string()
                    }
                };
                let max_results = args.count(
                    &["max_results", "limit"],
                    1,
                    limits.max_geocode_results,
                    limits.max_geocode_results,
                );
                ToolCall::GeocodePlace {
                    place_name,
                    max_results,
                }
            }
        };

        Ok((call, args.into_repairs()))
    }

    /// Center or origin of a single-point operation.
    fn single_point(&self, args: &mut Args, places: &mut TextPlaces) -> Result<Coordinate, QueryError> {
        if let Some(c) = args.point(LAT_KEYS, LON_KEYS) {
            return Ok(c);
        }
        if let Some(c) = args.point(START_LAT_KEYS, START_LON_KEYS) {
            return Ok(c);
        }
        if let Some(c) = self.geocode_argument(args, PLACE_KEYS, "lat/lon") {
            return Ok(c);
        }
        if let Some(m) = places.pick(PlaceRole::Origin, None) {
            return Ok(from_query_text(args, "lat/lon", &m));
        }
        Err(QueryError::MissingCoordinate {
            parameter: "lat/lon".to_string(),
        })
    }

    /// Start and end of a route operation.
    fn route_points(
        &self,
        args: &mut Args,
        places: &mut TextPlaces,
    ) -> Result<(Coordinate, Coordinate), QueryError> {
        let mut used_span = None;

        let start = match args
            .point(START_LAT_KEYS, START_LON_KEYS)
            .or_else(|| self.geocode_argument(args, START_PLACE_KEYS, "start_lat/start_lon"))
        {
            Some(c) => c,
            None => {
                let m = places
                    .pick(PlaceRole::Origin, None)
                    .ok_or_else(|| QueryError::MissingCoordinate {
                        parameter: "start_lat/start_lon".to_string(),
                    })?;
                used_span = Some((m.start, m.end));
                from_query_text(args, "start_lat/start_lon", &m)
            }
        };

        let end = match args
            .point(END_LAT_KEYS, END_LON_KEYS)
            .or_else(|| self.geocode_argument(args, END_PLACE_KEYS, "end_lat/end_lon"))
        {
            Some(c) => c,
            None => {
                let m = places
                    .pick(PlaceRole::Destination, used_span)
                    .ok_or_else(|| QueryError::MissingCoordinate {
                        parameter: "end_lat/end_lon".to_string(),
                    })?;
                from_query_text(args, "end_lat/end_lon", &m)
            }
        };

        Ok((start, end))
    }

    /// Geocode a place-name argument, if one was given and it resolves.
    fn geocode_argument(&self, args: &mut Args, keys: &[&str], parameter: &str) -> Option<Coordinate> {
        let name = args.text(keys)?;
        match self.engine.geocoder().resolve(&name) {
            Ok(c) => {
                args.record(parameter, json!(name), json!([c.lat, c.lon]), "geocoded place argument");
                Some(c)
            }
            Err(_) => {
                debug!(place = %name, "place argument did not resolve");
                None
            }
        }
    }
}

fn from_query_text(args: &mut Args, parameter: &str, m: &GeocodeMatch) -> Coordinate {
    args.record(
        parameter,
        Value::Null,
        json!({ "place": m.name, "lat": m.lat, "lon": m.lon }),
        "geocoded from query text",
    );
    m.coordinate()
}

/// The category argument, normalized, or one named in the query text.
fn poi_type(args: &mut Args, query: &str) -> Result<PoiCategory, QueryError> {
    match args.text(POI_TYPE_KEYS) {
        Some(raw) => {
            let category = PoiCategory::normalize(&raw).ok_or_else(|| QueryError::UnknownCategory(raw.clone()))?;
            if category.as_str() != raw {
                args.record("poi_type", json!(raw), json!(category.as_str()), "normalized category");
            }
            Ok(category)
        }
        None => {
            let category = category_from_text(query)
                .ok_or_else(|| QueryError::UnknownCategory("missing poi_type".to_string()))?;
            args.record("poi_type", Value::Null, json!(category.as_str()), "taken from query text");
            Ok(category)
        }
    }
}

/// Categories to list inside an isochrone. `include_pois` with no types
/// means every category; an explicit `false` means none. With neither flag
/// nor types, `include_by_default` decides.
fn isochrone_poi_types(args: &Args, include_by_default: bool) -> Result<Vec<PoiCategory>, QueryError> {
    let requested = args.list(&["poi_types", "poi_type", "categories"]);
    match args.flag(&["include_pois"]) {
        Some(false) => return Ok(Vec::new()),
        Some(true) if requested.is_empty() => return Ok(PoiCategory::ALL.to_vec()),
        None if include_by_default && requested.is_empty() => return Ok(PoiCategory::ALL.to_vec()),
        _ => {}
    }

    let mut types = Vec::with_capacity(requested.len());
    for raw in requested {
        let category = PoiCategory::normalize(&raw).ok_or(QueryError::UnknownCategory(raw))?;
        if !types.contains(&category) {
            types.push(category);
        }
    }
    Ok(types)
}

/// Places found in the query text, computed on first use.
struct TextPlaces<'a> {
    geocoder: &'a Geocoder,
    query: &'a str,
    matches: Option<Vec<GeocodeMatch>>,
}

impl<'a> TextPlaces<'a> {
    fn new(geocoder: &'a Geocoder, query: &'a str) -> Self {
        Self {
            geocoder,
            query,
            matches: None,
        }
    }

    /// Best match for `role`, skipping the span already used.
    ///
    /// Preference: the role itself, then untagged matches, then anything.
    fn pick(&mut self, role: PlaceRole, avoid: Option<(usize, usize)>) -> Option<GeocodeMatch> {
        let geocoder = self.geocoder;
        let query = self.query;
        let matches: &[GeocodeMatch] = self.matches.get_or_insert_with(|| geocoder.find_all(query));

        let free = |m: &&GeocodeMatch| Some((m.start, m.end)) != avoid;
        matches
            .iter()
            .filter(free)
            .find(|m| m.role == role)
            .or_else(|| matches.iter().filter(free).find(|m| m.role == PlaceRole::Unspecified))
            .or_else(|| matches.iter().find(free))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeridianConfig;
    use crate::error::ErrorKind;
    use crate::graph::{WalkEdge, WalkGraph, WalkNode};
    use crate::places::{PlaceEntry, PlaceIndex};
    use crate::primitives::PointOfInterest;
    use crate::storage::PoiStore;
    use std::sync::Arc;

    fn dispatcher() -> ToolDispatcher<PoiStore, WalkGraph> {
        let node = |id: u64, lat: f64, lon: f64| WalkNode { source_id: id, lat, lon };
        let edge = WalkEdge {
            length_m: 111.0,
            minutes: 1.3,
        };
        let graph = WalkGraph::from_parts(
            vec![node(1, 21.0, 92.0), node(2, 21.0, 92.001), node(3, 21.0, 92.002)],
            vec![(1, 2, edge), (2, 3, edge)],
        )
        .unwrap();
        let pois = PoiStore::new(vec![PointOfInterest {
            id: 7,
            category: PoiCategory::Clinic,
            lat: 21.0,
            lon: 92.0015,
            display_name: "MSF Clinic".to_string(),
        }]);
        let places = Arc::new(PlaceIndex::new(vec![
            PlaceEntry::new("Camp 8", 21.0, 92.0),
            PlaceEntry::new("Camp 8E", 21.0, 92.002),
        ]));
        ToolDispatcher::new(SpatialQueryEngine::new(
            pois,
            graph,
            Geocoder::new(places),
            MeridianConfig::default(),
        ))
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let d = dispatcher();
        let err = d.dispatch(&Intent::new("teleport", json!({})), "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn test_negative_radius_clamped_into_call() {
        let d = dispatcher();
        let intent = Intent::new(
            "list_pois",
            json!({"poi_type": "clinic", "lat": 21.0, "lon": 92.0, "radius_m": -500, "colour": "red"}),
        );
        let (call, repairs) = d.validate(&intent, "").unwrap();
        match call {
            ToolCall::ListPois { radius_m, .. } => assert_eq!(radius_m, 50.0),
            other => panic!("unexpected call {:?}", other),
        }
        assert_eq!(repairs.len(), 1, "extraneous 'colour' is ignored, not repaired");
        assert_eq!(repairs[0].parameter, "radius_m");
    }

    #[test]
    fn test_zero_time_budget_clamped_to_minimum() {
        let d = dispatcher();
        let intent = Intent::new("generate_isochrone", json!({"lat": 21.0, "lon": 92.0, "max_minutes": 0}));
        let (call, _) = d.validate(&intent, "").unwrap();
        assert!(matches!(call, ToolCall::GenerateIsochrone { max_minutes, .. } if max_minutes == 1.0));
    }

    #[test]
    fn test_category_normalized_or_rejected() {
        let d = dispatcher();
        let ok = Intent::new("list_pois", json!({"poi_type": "Clinics", "lat": 21.0, "lon": 92.0}));
        let (call, repairs) = d.validate(&ok, "").unwrap();
        assert!(matches!(call, ToolCall::ListPois { category: PoiCategory::Clinic, .. }));
        assert_eq!(repairs[0].reason, "normalized category");

        let bad = Intent::new("list_pois", json!({"poi_type": "casino", "lat": 21.0, "lon": 92.0}));
        let err = d.validate(&bad, "").unwrap_err();
        assert_eq!(err, QueryError::UnknownCategory("casino".to_string()));
    }

    #[test]
    fn test_missing_coordinate_falls_back_to_query_text() {
        let d = dispatcher();
        let intent = Intent::new("find_nearest_poi_with_route", json!({"poi_type": "clinic"}));
        let (call, repairs) = d.validate(&intent, "nearest clinic to Camp 8E").unwrap();
        match call {
            ToolCall::FindNearestPoiWithRoute { origin, .. } => assert_eq!(origin, Coordinate::new(21.0, 92.002)),
            other => panic!("unexpected call {:?}", other),
        }
        assert_eq!(repairs.last().unwrap().reason, "geocoded from query text");
    }

    #[test]
    fn test_missing_coordinate_without_place_is_rejected() {
        let d = dispatcher();
        let intent = Intent::new("list_pois", json!({"poi_type": "clinic"}));
        let err = d.validate(&intent, "clinics near the river").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCoordinate);
    }

    #[test]
    fn test_route_endpoints_from_roles() {
        let d = dispatcher();
        let intent = Intent::new("calculate_route", json!({}));
        let (call, _) = d.validate(&intent, "walk to Camp 8 from Camp 8E").unwrap();
        assert_eq!(
            call,
            ToolCall::CalculateRoute {
                start: Coordinate::new(21.0, 92.002),
                end: Coordinate::new(21.0, 92.0),
            }
        );
    }

    #[test]
    fn test_route_place_arguments() {
        let d = dispatcher();
        let intent = Intent::new(
            "calculate_route",
            json!({"start_place": "Camp 8", "end_lat": "21.0", "end_lon": "92.002"}),
        );
        let (call, repairs) = d.validate(&intent, "").unwrap();
        assert_eq!(
            call,
            ToolCall::CalculateRoute {
                start: Coordinate::new(21.0, 92.0),
                end: Coordinate::new(21.0, 92.002),
            }
        );
        assert_eq!(repairs[0].reason, "geocoded place argument");
    }

    #[test]
    fn test_isochrone_poi_types() {
        let d = dispatcher();
        let all = Intent::new("generate_isochrone", json!({"lat": 21.0, "lon": 92.0, "include_pois": true}));
        match d.validate(&all, "").unwrap().0 {
            ToolCall::GenerateIsochrone { poi_types, .. } => assert_eq!(poi_types.len(), PoiCategory::ALL.len()),
            other => panic!("unexpected call {:?}", other),
        }

        let bad = Intent::new("generate_isochrone", json!({"lat": 21.0, "lon": 92.0, "poi_types": ["spa"]}));
        assert_eq!(d.validate(&bad, "").unwrap_err().kind(), ErrorKind::UnknownCategory);
    }

    #[test]
    fn test_respond_envelopes() {
        let d = dispatcher();
        let found = d.respond(
            &Intent::new("list_pois", json!({"poi_type": "clinic", "lat": 21.0, "lon": 92.0})),
            "",
        );
        assert!(matches!(found, ToolResponse::Ok { .. }));

        let empty = d.respond(
            &Intent::new("list_pois", json!({"poi_type": "hospital", "lat": 21.0, "lon": 92.0})),
            "",
        );
        assert!(matches!(empty, ToolResponse::EmptyResult { .. }));

        let failed = d.respond(&Intent::new("geocode_place", json!({"place_name": "Camp 99"})), "");
        assert_eq!(failed.error_kind(), Some(ErrorKind::NotFound));
    }
}
