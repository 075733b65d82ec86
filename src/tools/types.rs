//! Tool-call types: the untrusted intent, the validated call, the response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{ErrorKind, QueryError};
use crate::primitives::PoiCategory;
use crate::query::QueryOutput;
use crate::spatial::Coordinate;

// ─── Operation ─────────────────────────────────────────────────────

/// The closed set of operations a model may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListPois,
    FindNearestPoiWithRoute,
    CalculateRoute,
    FindAlongRoute,
    GenerateIsochrone,
    GeocodePlace,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::ListPois,
        Operation::FindNearestPoiWithRoute,
        Operation::CalculateRoute,
        Operation::FindAlongRoute,
        Operation::GenerateIsochrone,
        Operation::GeocodePlace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListPois => "list_pois",
            Operation::FindNearestPoiWithRoute => "find_nearest_poi_with_route",
            Operation::CalculateRoute => "calculate_route",
            Operation::FindAlongRoute => "find_along_route",
            Operation::GenerateIsochrone => "generate_isochrone",
            Operation::GeocodePlace => "geocode_place",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = QueryError;

    /// Case- and separator-insensitive: `"Calculate-Route"` parses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == key)
            .ok_or_else(|| QueryError::UnsupportedOperation(s.to_string()))
    }
}

// ─── Intent ────────────────────────────────────────────────────────

/// Operation name plus raw arguments, exactly as the model produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(alias = "name")]
    pub tool: String,
    #[serde(default, deserialize_with = "arguments_object")]
    pub arguments: Map<String, Value>,
}

impl Intent {
    /// Build from a JSON value; anything but an object gives no arguments.
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments: match arguments {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    pub fn from_json(text: &str) -> Result<Self, QueryError> {
        serde_json::from_str(text)
            .map_err(|e| QueryError::ModelFailure(format!("malformed tool call: {}", e)))
    }
}

/// Accept `arguments` as an object, a JSON-encoded object string, or null.
fn arguments_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Map::new()),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(serde::de::Error::custom("arguments string is not a JSON object")),
        },
        other => Err(serde::de::Error::custom(format!(
            "arguments must be an object, got {}",
            other
        ))),
    }
}

// ─── Validated Call ────────────────────────────────────────────────

/// A fully validated call: every coordinate resolved, every number clamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ToolCall {
    ListPois {
        center: Coordinate,
        category: PoiCategory,
        radius_m: f64,
        limit: usize,
    },
    FindNearestPoiWithRoute {
        origin: Coordinate,
        category: PoiCategory,
        count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_radius_m: Option<f64>,
    },
    CalculateRoute {
        start: Coordinate,
        end: Coordinate,
    },
    FindAlongRoute {
        start: Coordinate,
        end: Coordinate,
        category: PoiCategory,
        corridor_m: f64,
    },
    GenerateIsochrone {
        origin: Coordinate,
        max_minutes: f64,
        poi_types: Vec<PoiCategory>,
    },
    GeocodePlace {
        place_name: String,
        max_results: usize,
    },
}

impl ToolCall {
    pub fn operation(&self) -> Operation {
        match self {
            ToolCall::ListPois { .. } => Operation::ListPois,
            ToolCall::FindNearestPoiWithRoute { .. } => Operation::FindNearestPoiWithRoute,
            ToolCall::CalculateRoute { .. } => Operation::CalculateRoute,
            ToolCall::FindAlongRoute { .. } => Operation::FindAlongRoute,
            ToolCall::GenerateIsochrone { .. } => Operation::GenerateIsochrone,
            ToolCall::GeocodePlace { .. } => Operation::GeocodePlace,
        }
    }
}

/// One deterministic fix applied to an argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    pub parameter: String,
    pub original: Value,
    pub repaired: Value,
    pub reason: String,
}

// ─── Answer / Response ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub operation: Operation,
    pub output: QueryOutput,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repairs: Vec<Repair>,
}

impl Answer {
    /// Valid query, zero matches.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }
}

/// Tagged envelope handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse {
    Ok {
        operation: Operation,
        output: QueryOutput,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        repairs: Vec<Repair>,
    },
    EmptyResult {
        operation: Operation,
        output: QueryOutput,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        repairs: Vec<Repair>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl ToolResponse {
    pub fn error(err: &QueryError) -> Self {
        ToolResponse::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResponse::Error { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ToolResponse::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<Answer> for ToolResponse {
    fn from(answer: Answer) -> Self {
        let Answer {
            operation,
            output,
            repairs,
        } = answer;
        if output.is_empty() {
            ToolResponse::EmptyResult {
                operation,
                output,
                repairs,
            }
        } else {
            ToolResponse::Ok {
                operation,
                output,
                repairs,
            }
        }
    }
}

impl From<Result<Answer, QueryError>> for ToolResponse {
    fn from(result: Result<Answer, QueryError>) -> Self {
        match result {
            Ok(answer) => answer.into(),
            Err(err) => ToolResponse::error(&err),
        }
    }
}
