//! Tool definitions — the JSON schema of every operation.
//!
//! Rendered into the model prompt and exposed to callers. Parameter names here
//! are the canonical ones; the dispatcher also accepts the aliases it knows.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::types::Operation;
use crate::primitives::PoiCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

fn poi_type_schema() -> Value {
    let tags: Vec<&str> = PoiCategory::ALL.iter().map(|c| c.as_str()).collect();
    json!({
        "type": "string",
        "description": "POI category",
        "enum": tags
    })
}

fn coordinate(description: &str) -> Value {
    json!({ "type": "number", "description": description })
}

/// Return the list of all available tools with their JSON schemas.
pub fn list_tools() -> Vec<ToolDefinition> {
    Operation::ALL.iter().map(|op| definition(*op)).collect()
}

pub fn definition(op: Operation) -> ToolDefinition {
    let (description, input_schema) = match op {
        Operation::ListPois => (
            "List POIs of one category within a radius, with straight-line \
                (as the crow flies) distances. No routing."
                .to_string(),
            json!({
                "type": "object",
                "properties": {
                    "poi_type": poi_type_schema(),
                    "lat": coordinate("Center latitude"),
                    "lon": coordinate("Center longitude"),
                    "radius_m": {
                        "type": "number",
                        "description": "Search radius in meters (default: 1000)",
                        "default": 1000
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum POIs to return (default: 20)",
                        "default": 20
                    }
                },
                "required": ["poi_type", "lat", "lon"]
            }),
        ),
        Operation::FindNearestPoiWithRoute => (
            "Find the nearest POIs of one category by actual walking time, \
                with the walking route to each."
                .to_string(),
            json!({
                "type": "object",
                "properties": {
                    "poi_type": poi_type_schema(),
                    "lat": coordinate("Origin latitude"),
                    "lon": coordinate("Origin longitude"),
                    "limit": {
                        "type": "integer",
                        "description": "Number of results (default: 3)",
                        "default": 3
                    },
                    "max_radius_m": {
                        "type": "number",
                        "description": "Optional: straight-line search cap in meters"
                    }
                },
                "required": ["poi_type", "lat", "lon"]
            }),
        ),
        Operation::CalculateRoute => (
            "Walking route between two points: path, distance and time.".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "start_lat": coordinate("Start latitude"),
                    "start_lon": coordinate("Start longitude"),
                    "end_lat": coordinate("End latitude"),
                    "end_lon": coordinate("End longitude")
                },
                "required": ["start_lat", "start_lon", "end_lat", "end_lon"]
            }),
        ),
        Operation::FindAlongRoute => (
            "Find POIs of one category within a corridor along the walking route \
                between two points."
                .to_string(),
            json!({
                "type": "object",
                "properties": {
                    "poi_type": poi_type_schema(),
                    "start_lat": coordinate("Start latitude"),
                    "start_lon": coordinate("Start longitude"),
                    "end_lat": coordinate("End latitude"),
                    "end_lon": coordinate("End longitude"),
                    "corridor_m": {
                        "type": "number",
                        "description": "Corridor half-width in meters (default: 200)",
                        "default": 200
                    }
                },
                "required": ["poi_type", "start_lat", "start_lon", "end_lat", "end_lon"]
            }),
        ),
        Operation::GenerateIsochrone => (
            "Area reachable on foot from a point within a time budget.".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "lat": coordinate("Origin latitude"),
                    "lon": coordinate("Origin longitude"),
                    "max_minutes": {
                        "type": "number",
                        "description": "Walking time budget in minutes (default: 15)",
                        "default": 15
                    },
                    "include_pois": {
                        "type": "boolean",
                        "description": "Optional: list reachable POIs",
                        "default": false
                    },
                    "poi_types": {
                        "type": "array",
                        "items": poi_type_schema(),
                        "description": "Optional: categories to list when include_pois is set"
                    }
                },
                "required": ["lat", "lon"]
            }),
        ),
        Operation::GeocodePlace => (
            "Get coordinates for a place name.".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "place_name": {
                        "type": "string",
                        "description": "Place name (e.g., 'Camp 8E')"
                    }
                },
                "required": ["place_name"]
            }),
        ),
    };

    ToolDefinition {
        name: op.as_str().to_string(),
        description,
        input_schema,
    }
}
