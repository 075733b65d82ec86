//! # Meridian
//!
//! Offline spatial question answering for network-isolated devices.
//!
//! Meridian turns a model's tool call into a bounded spatial computation over a
//! prebuilt walking network and POI set.
//!
//! ## Key Features
//!
//! - **Geocoding**: known place names found in free text, longest name wins
//! - **Tolerant dispatch**: malformed tool calls are repaired or rejected with a typed error
//! - **Route-aware answers**: nearest POIs ordered by walking time, not distance
//! - **Isochrones**: reachable node sets with an approximate boundary
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meridian::{Dataset, Geocoder, Intent, MeridianConfig, SpatialQueryEngine, ToolDispatcher};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let config = MeridianConfig::load_or_default(Path::new("meridian.toml")).unwrap();
//! let data = Dataset::load(&config.dataset.path).unwrap().into_loaded(&config.walking).unwrap();
//!
//! let engine = SpatialQueryEngine::new(data.pois, data.graph, Geocoder::new(data.places), config);
//! let dispatcher = ToolDispatcher::new(engine);
//!
//! let intent = Intent::new("find_nearest_poi_with_route", json!({"poi_type": "clinic"}));
//! let response = dispatcher.respond(&intent, "nearest clinic to Camp 8E");
//! println!("{}", serde_json::to_string_pretty(&response).unwrap());
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod pipeline;
pub mod places;
pub mod primitives;
pub mod query;
pub mod spatial;
pub mod storage;
pub mod tools;

// Re-exports for convenience
pub use config::MeridianConfig;
pub use error::{ErrorKind, MeridianError, PrimitiveError, QueryError, Result};

pub use graph::{GraphStats, WalkGraph};
pub use model::{IntentModel, LlamaServerModel};
pub use pipeline::{QueryPipeline, QueryResult};
pub use places::{GeocodeMatch, Geocoder, PlaceEntry, PlaceIndex, PlaceRole};
pub use primitives::{GraphPrimitives, PoiCategory, PointOfInterest, SpatialPrimitives};
pub use query::{QueryOutput, SpatialQueryEngine};
pub use spatial::Coordinate;
pub use storage::{DataDir, Dataset, LoadedDataset, PoiStore};
pub use tools::{list_tools, Answer, Intent, Operation, ToolCall, ToolDispatcher, ToolResponse};
