//! PoiStore — R-tree backed point-radius and nearest-k search.
//!
//! One tree per category keeps category-filtered nearest-k a plain
//! nearest-neighbour walk. Trees work in a local metric frame; final
//! distances and ordering use haversine.

use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::collections::HashMap;
use tracing::debug;

use crate::error::PrimitiveError;
use crate::primitives::{PoiCategory, PointOfInterest, SpatialPrimitives};
use crate::spatial::{Coordinate, LocalFrame};

type PoiPoint = GeomWithData<[f64; 2], usize>;

/// Planar search radius slack over the haversine radius.
const RADIUS_SLACK: f64 = 1.02;

pub struct PoiStore {
    pois: Vec<PointOfInterest>,
    trees: HashMap<PoiCategory, RTree<PoiPoint>>,
    frame: LocalFrame,
}

impl PoiStore {
    pub fn new(pois: Vec<PointOfInterest>) -> Self {
        let pois: Vec<PointOfInterest> = pois
            .into_iter()
            .filter(|p| p.coordinate().is_valid())
            .collect();

        let reference_lat = if pois.is_empty() {
            0.0
        } else {
            pois.iter().map(|p| p.lat).sum::<f64>() / pois.len() as f64
        };
        let frame = LocalFrame::around(reference_lat);

        let mut grouped: HashMap<PoiCategory, Vec<PoiPoint>> = HashMap::new();
        for (i, poi) in pois.iter().enumerate() {
            grouped
                .entry(poi.category)
                .or_default()
                .push(GeomWithData::new(frame.project(&poi.coordinate()), i));
        }
        let trees = grouped
            .into_iter()
            .map(|(category, points)| (category, RTree::bulk_load(points)))
            .collect();

        debug!(pois = pois.len(), "poi store built");
        Self { pois, trees, frame }
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    /// POI counts per category, for health output.
    pub fn counts(&self) -> Vec<(PoiCategory, usize)> {
        let mut counts: Vec<(PoiCategory, usize)> =
            self.trees.iter().map(|(c, t)| (*c, t.size())).collect();
        counts.sort();
        counts
    }

    fn sorted_by_distance(&self, center: &Coordinate, mut hits: Vec<usize>) -> Vec<PointOfInterest> {
        hits.sort_by(|&a, &b| {
            let da = center.distance_m(&self.pois[a].coordinate());
            let db = center.distance_m(&self.pois[b].coordinate());
            da.total_cmp(&db).then_with(|| self.pois[a].id.cmp(&self.pois[b].id))
        });
        hits.into_iter().map(|i| self.pois[i].clone()).collect()
    }
}

impl SpatialPrimitives for PoiStore {
    fn radius_search(
        &self,
        center: Coordinate,
        category: PoiCategory,
        radius_m: f64,
    ) -> Result<Vec<PointOfInterest>, PrimitiveError> {
        let Some(tree) = self.trees.get(&category) else {
            return Ok(Vec::new());
        };
        if !(radius_m.is_finite() && radius_m >= 0.0) {
            return Ok(Vec::new());
        }

        let planar = radius_m * RADIUS_SLACK + 1.0;
        let hits: Vec<usize> = tree
            .locate_within_distance(self.frame.project(&center), planar * planar)
            .map(|p| p.data)
            .filter(|&i| center.distance_m(&self.pois[i].coordinate()) <= radius_m)
            .collect();

        Ok(self.sorted_by_distance(&center, hits))
    }

    fn nearest_k(
        &self,
        center: Coordinate,
        category: PoiCategory,
        k: usize,
    ) -> Result<Vec<PointOfInterest>, PrimitiveError> {
        let Some(tree) = self.trees.get(&category) else {
            return Ok(Vec::new());
        };
        let hits: Vec<usize> = tree
            .nearest_neighbor_iter(&self.frame.project(&center))
            .take(k)
            .map(|p| p.data)
            .collect();

        Ok(self.sorted_by_distance(&center, hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(id: u64, category: PoiCategory, lat: f64, lon: f64) -> PointOfInterest {
        PointOfInterest {
            id,
            category,
            lat,
            lon,
            display_name: format!("poi {}", id),
        }
    }

    fn store() -> PoiStore {
        PoiStore::new(vec![
            poi(1, PoiCategory::School, 0.0, 0.002),  // ~222 m
            poi(2, PoiCategory::School, 0.0, 0.0005), // ~56 m
            poi(3, PoiCategory::School, 0.0, 0.02),   // ~2.2 km
            poi(4, PoiCategory::Clinic, 0.0, 0.0001),
            poi(5, PoiCategory::School, 99.0, 0.0),   // invalid, dropped
        ])
    }

    #[test]
    fn test_radius_search_filters_and_sorts() {
        let s = store();
        let hits = s
            .radius_search(Coordinate::new(0.0, 0.0), PoiCategory::School, 500.0)
            .unwrap();
        let ids: Vec<u64> = hits.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_radius_search_missing_category_is_empty() {
        let s = store();
        let hits = s
            .radius_search(Coordinate::new(0.0, 0.0), PoiCategory::Hospital, 2000.0)
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_nearest_k() {
        let s = store();
        let hits = s
            .nearest_k(Coordinate::new(0.0, 0.0), PoiCategory::School, 2)
            .unwrap();
        let ids: Vec<u64> = hits.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_invalid_pois_dropped() {
        let s = store();
        assert_eq!(s.len(), 4);
        assert_eq!(s.counts(), vec![(PoiCategory::Clinic, 1), (PoiCategory::School, 3)]);
    }
}
