//! WalkGraph — petgraph-backed walking network.

use petgraph::algo::{astar, connected_components};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, info};

use super::types::{GraphStats, WalkEdge, WalkNode};
use crate::error::{MeridianError, PrimitiveError, Result};
use crate::primitives::{GraphPath, GraphPrimitives, NodeId, ReachableSet};
use crate::spatial::{Coordinate, LocalFrame};

type SnapPoint = GeomWithData<[f64; 2], NodeId>;

/// Undirected walking graph. Node ids are petgraph indices.
pub struct WalkGraph {
    graph: UnGraph<WalkNode, WalkEdge>,
    snap: RTree<SnapPoint>,
    frame: LocalFrame,
}

impl WalkGraph {
    /// Build from node weights and `(source_id, source_id, edge)` triples.
    ///
    /// Edges naming an unknown node, or with a negative or non-finite cost,
    /// make the dataset invalid.
    pub fn from_parts(nodes: Vec<WalkNode>, edges: Vec<(u64, u64, WalkEdge)>) -> Result<Self> {
        let mut graph = UnGraph::with_capacity(nodes.len(), edges.len());
        let mut by_source: HashMap<u64, NodeIndex> = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if !node.coordinate().is_valid() {
                return Err(MeridianError::InvalidDataset(format!(
                    "node {} has invalid coordinate",
                    node.source_id
                )));
            }
            let source_id = node.source_id;
            let idx = graph.add_node(node);
            by_source.insert(source_id, idx);
        }

        for (from, to, edge) in edges {
            let (Some(&a), Some(&b)) = (by_source.get(&from), by_source.get(&to)) else {
                return Err(MeridianError::InvalidDataset(format!(
                    "edge {} -> {} references an unknown node",
                    from, to
                )));
            };
            let valid = |v: f64| v.is_finite() && v >= 0.0;
            if !valid(edge.minutes) || !valid(edge.length_m) {
                return Err(MeridianError::InvalidDataset(format!(
                    "edge {} -> {} has invalid weight",
                    from, to
                )));
            }
            graph.add_edge(a, b, edge);
        }

        let reference_lat = if graph.node_count() == 0 {
            0.0
        } else {
            graph.node_weights().map(|n| n.lat).sum::<f64>() / graph.node_count() as f64
        };
        let frame = LocalFrame::around(reference_lat);

        let points: Vec<SnapPoint> = graph
            .node_indices()
            .map(|idx| GeomWithData::new(frame.project(&graph[idx].coordinate()), idx.index() as NodeId))
            .collect();
        let snap = RTree::bulk_load(points);

        let walk = Self { graph, snap, frame };
        info!(nodes = walk.graph.node_count(), edges = walk.graph.edge_count(), "walk graph ready");
        Ok(walk)
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            components: connected_components(&self.graph),
            total_length_km: self.graph.edge_weights().map(|e| e.length_m).sum::<f64>() / 1000.0,
        }
    }

    fn index(&self, node: NodeId) -> std::result::Result<NodeIndex, PrimitiveError> {
        let idx = NodeIndex::new(node as usize);
        if idx.index() < self.graph.node_count() {
            Ok(idx)
        } else {
            Err(PrimitiveError::UnknownNode(node))
        }
    }

    /// Length of the cheapest edge between two adjacent nodes.
    fn hop_length(&self, a: NodeIndex, b: NodeIndex) -> f64 {
        self.graph
            .edges_connecting(a, b)
            .min_by(|x, y| x.weight().minutes.total_cmp(&y.weight().minutes))
            .map(|e| e.weight().length_m)
            .unwrap_or(0.0)
    }
}

impl GraphPrimitives for WalkGraph {
    fn nearest_node(&self, at: Coordinate) -> std::result::Result<NodeId, PrimitiveError> {
        let point = self.frame.project(&at);
        let nearest = self
            .snap
            .nearest_neighbor(&point)
            .ok_or(PrimitiveError::EmptyGraph)?;
        debug!(lat = at.lat, lon = at.lon, node = nearest.data, "snapped coordinate");
        Ok(nearest.data)
    }

    fn shortest_path(
        &self,
        from: NodeId,
        to: NodeId,
    ) -> std::result::Result<Option<GraphPath>, PrimitiveError> {
        let start = self.index(from)?;
        let goal = self.index(to)?;

        let found = astar(
            &self.graph,
            start,
            |n| n == goal,
            |e| e.weight().minutes,
            |_| 0.0,
        );

        Ok(found.map(|(minutes, path)| {
            let distance_m = path.windows(2).map(|w| self.hop_length(w[0], w[1])).sum();
            GraphPath {
                nodes: path.iter().map(|n| n.index() as NodeId).collect(),
                distance_m,
                minutes,
            }
        }))
    }

    fn reachable_within(
        &self,
        origin: NodeId,
        max_minutes: f64,
    ) -> std::result::Result<ReachableSet, PrimitiveError> {
        let start = self.index(origin)?;
        let mut best: HashMap<NodeIndex, f64> = HashMap::new();
        let mut frontier = BinaryHeap::new();

        best.insert(start, 0.0);
        frontier.push(Frontier { cost: 0.0, node: start });

        while let Some(Frontier { cost, node }) = frontier.pop() {
            if best.get(&node).map_or(false, |&b| cost > b) {
                continue;
            }
            for edge in self.graph.edges(node) {
                let next = cost + edge.weight().minutes;
                if next > max_minutes {
                    continue;
                }
                let target = edge.target();
                if best.get(&target).map_or(true, |&b| next < b) {
                    best.insert(target, next);
                    frontier.push(Frontier { cost: next, node: target });
                }
            }
        }

        debug!(origin, max_minutes, reachable = best.len(), "bounded expansion done");
        Ok(best
            .into_iter()
            .map(|(n, c)| (n.index() as NodeId, c))
            .collect())
    }

    fn node_coordinate(&self, node: NodeId) -> std::result::Result<Coordinate, PrimitiveError> {
        let idx = self.index(node)?;
        Ok(self.graph[idx].coordinate())
    }
}

/// Min-heap entry for the bounded expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    cost: f64,
    node: NodeIndex,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, lat: f64, lon: f64) -> WalkNode {
        WalkNode { source_id: id, lat, lon }
    }

    fn edge(minutes: f64) -> WalkEdge {
        WalkEdge {
            length_m: minutes * 80.0,
            minutes,
        }
    }

    /// Square 1-2-3-4 with a diagonal shortcut 1-3, plus island 5-6.
    fn square() -> WalkGraph {
        WalkGraph::from_parts(
            vec![
                node(1, 0.000, 0.000),
                node(2, 0.000, 0.010),
                node(3, 0.010, 0.010),
                node(4, 0.010, 0.000),
                node(5, 0.100, 0.100),
                node(6, 0.100, 0.110),
            ],
            vec![
                (1, 2, edge(5.0)),
                (2, 3, edge(5.0)),
                (3, 4, edge(5.0)),
                (4, 1, edge(5.0)),
                (1, 3, edge(8.0)),
                (5, 6, edge(2.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_snap_to_nearest() {
        let g = square();
        assert_eq!(g.nearest_node(Coordinate::new(0.0001, 0.0001)).unwrap(), 0);
        assert_eq!(g.nearest_node(Coordinate::new(0.0099, 0.0101)).unwrap(), 2);
    }

    #[test]
    fn test_shortest_path_prefers_shortcut() {
        let g = square();
        let path = g.shortest_path(0, 2).unwrap().unwrap();
        assert_eq!(path.nodes, vec![0, 2]);
        assert_eq!(path.minutes, 8.0);
        assert_eq!(path.distance_m, 640.0);
    }

    #[test]
    fn test_disconnected_is_none() {
        let g = square();
        assert!(g.shortest_path(0, 4).unwrap().is_none());
    }

    #[test]
    fn test_same_node_path() {
        let g = square();
        let path = g.shortest_path(3, 3).unwrap().unwrap();
        assert_eq!(path.nodes, vec![3]);
        assert_eq!(path.distance_m, 0.0);
    }

    #[test]
    fn test_reachable_is_bounded_and_monotone() {
        let g = square();
        let small = g.reachable_within(0, 5.0).unwrap();
        let keys: Vec<NodeId> = small.keys().copied().collect();
        assert_eq!(keys, vec![0, 1, 3]);

        let large = g.reachable_within(0, 9.0).unwrap();
        assert!(small.keys().all(|k| large.contains_key(k)));
        assert_eq!(large.get(&2), Some(&8.0));
        assert!(!large.contains_key(&4));
    }

    #[test]
    fn test_unknown_node_and_bad_edges() {
        let g = square();
        assert_eq!(g.shortest_path(0, 99), Err(PrimitiveError::UnknownNode(99)));

        let bad = WalkGraph::from_parts(vec![node(1, 0.0, 0.0)], vec![(1, 7, edge(1.0))]);
        assert!(matches!(bad, Err(MeridianError::InvalidDataset(_))));
    }

    #[test]
    fn test_empty_graph_snaps_to_error() {
        let g = WalkGraph::from_parts(vec![], vec![]).unwrap();
        assert_eq!(g.nearest_node(Coordinate::new(0.0, 0.0)), Err(PrimitiveError::EmptyGraph));
    }

    #[test]
    fn test_stats() {
        let stats = square().stats();
        assert_eq!(stats.node_count, 6);
        assert_eq!(stats.edge_count, 6);
        assert_eq!(stats.components, 2);
    }
}
