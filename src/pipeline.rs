//! QueryPipeline — one question in, one tagged result out.
//!
//! text → geocoder annotation → model → dispatcher → [`QueryResult`].
//! Queries are processed one at a time; a failed query leaves nothing behind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::IntentModel;
use crate::places::GeocodeMatch;
use crate::primitives::{GraphPrimitives, SpatialPrimitives};
use crate::tools::{Intent, ToolDispatcher, ToolResponse};

/// Everything known about one answered (or failed) question.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub request_id: Uuid,
    pub received_at: DateTime<Utc>,
    pub query: String,
    /// The text handed to the model, place names replaced by coordinates.
    pub rewritten_query: String,
    pub geocoded: Vec<GeocodeMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub response: ToolResponse,
    pub elapsed_ms: u64,
}

impl QueryResult {
    pub fn is_success(&self) -> bool {
        !self.response.is_error()
    }
}

pub struct QueryPipeline<M, S, G> {
    model: M,
    dispatcher: ToolDispatcher<S, G>,
}

impl<M, S, G> QueryPipeline<M, S, G>
where
    M: IntentModel,
    S: SpatialPrimitives,
    G: GraphPrimitives,
{
    pub fn new(model: M, dispatcher: ToolDispatcher<S, G>) -> Self {
        Self { model, dispatcher }
    }

    pub fn dispatcher(&self) -> &ToolDispatcher<S, G> {
        &self.dispatcher
    }

    pub fn ask(&self, text: &str) -> QueryResult {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let received_at = Utc::now();
        info!(%request_id, query = %text, "query received");

        let annotated = self.dispatcher.engine().geocoder().annotate(text);
        if annotated.matches.is_empty() {
            warn!(%request_id, "no known place names in query");
        }

        let (intent, response) = match self.model.propose(&annotated.rewritten) {
            Ok(intent) => {
                let response = self.dispatcher.respond(&intent, text);
                (Some(intent), response)
            }
            Err(err) => {
                warn!(%request_id, kind = %err.kind(), error = %err, "model failed");
                (None, ToolResponse::error(&err))
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            %request_id,
            elapsed_ms,
            success = !response.is_error(),
            "query answered"
        );

        QueryResult {
            request_id,
            received_at,
            query: text.to_string(),
            rewritten_query: annotated.rewritten,
            geocoded: annotated.matches,
            intent,
            response,
            elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeridianConfig;
    use crate::error::{ErrorKind, QueryError};
    use crate::graph::{WalkEdge, WalkGraph, WalkNode};
    use crate::places::{Geocoder, PlaceEntry, PlaceIndex};
    use crate::query::SpatialQueryEngine;
    use crate::storage::PoiStore;
    use serde_json::json;
    use std::cell::RefCell;
    use std::sync::Arc;

    /// Replays canned intents and remembers the text it was shown.
    struct Scripted {
        reply: Result<Intent, QueryError>,
        seen: RefCell<Vec<String>>,
    }

    impl IntentModel for Scripted {
        fn propose(&self, text: &str) -> Result<Intent, QueryError> {
            self.seen.borrow_mut().push(text.to_string());
            self.reply.clone()
        }
    }

    fn pipeline(reply: Result<Intent, QueryError>) -> QueryPipeline<Scripted, PoiStore, WalkGraph> {
        let graph = WalkGraph::from_parts(
            vec![
                WalkNode { source_id: 1, lat: 21.0, lon: 92.0 },
                WalkNode { source_id: 2, lat: 21.0, lon: 92.001 },
            ],
            vec![(1, 2, WalkEdge { length_m: 104.0, minutes: 1.25 })],
        )
        .unwrap();
        let places = Arc::new(PlaceIndex::new(vec![
            PlaceEntry::new("Camp 8", 21.0, 92.0),
            PlaceEntry::new("Camp 8E", 21.0, 92.001),
        ]));
        let engine = SpatialQueryEngine::new(
            PoiStore::new(vec![]),
            graph,
            Geocoder::new(places),
            MeridianConfig::default(),
        );
        QueryPipeline::new(
            Scripted {
                reply,
                seen: RefCell::new(Vec::new()),
            },
            ToolDispatcher::new(engine),
        )
    }

    #[test]
    fn test_model_sees_rewritten_query() {
        let p = pipeline(Ok(Intent::new("calculate_route", json!({}))));
        let result = p.ask("route from Camp 8 to Camp 8E");

        assert!(result.is_success(), "{:?}", result.response);
        assert_eq!(result.geocoded.len(), 2);
        let seen = p.model.seen.borrow();
        assert_eq!(
            seen[0],
            "route from (lat 21.000000, lon 92.000000) to (lat 21.000000, lon 92.001000)"
        );
    }

    #[test]
    fn test_model_failure_is_typed_and_not_sticky() {
        let p = pipeline(Err(QueryError::Timeout("120s".to_string())));
        let first = p.ask("walkable area from Camp 8");
        assert_eq!(first.response.error_kind(), Some(ErrorKind::Timeout));
        assert!(first.intent.is_none());

        let second = p.ask("walkable area from Camp 8");
        assert_ne!(first.request_id, second.request_id);
        assert_eq!(second.geocoded.len(), 1);
    }
}
