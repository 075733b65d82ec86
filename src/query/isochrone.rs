//! Isochrone boundary derivation.
//!
//! The boundary is a hull over reachable node coordinates. It may cover
//! unreachable gaps (convex) or cut small reachable spurs (concave); the node
//! set stays the ground truth.

use geo::{ConcaveHull, ConvexHull, MultiPoint, Point};

use crate::config::HullMethod;
use crate::spatial::Coordinate;

/// Closed ring around `points`, first vertex repeated at the end.
///
/// Fewer than three distinct points, or points all on one line, have no
/// area; they are returned as-is, deduplicated and in `(lat, lon)` order.
pub fn boundary(points: &[Coordinate], method: HullMethod, concavity: f64) -> Vec<Coordinate> {
    let mut distinct = points.to_vec();
    distinct.sort_by(|a, b| a.lat.total_cmp(&b.lat).then_with(|| a.lon.total_cmp(&b.lon)));
    distinct.dedup();
    if distinct.len() < 3 || collinear(&distinct) {
        return distinct;
    }

    let cloud: MultiPoint<f64> = distinct
        .iter()
        .map(|c| Point::new(c.lon, c.lat))
        .collect::<Vec<_>>()
        .into();

    let hull = match method {
        HullMethod::Concave => cloud.concave_hull(concavity),
        HullMethod::Convex => cloud.convex_hull(),
    };

    hull.exterior()
        .coords()
        .map(|c| Coordinate::new(c.y, c.x))
        .collect()
}

/// Every point lies on the line through the first and last of a sorted set.
fn collinear(sorted: &[Coordinate]) -> bool {
    let (Some(a), Some(b)) = (sorted.first(), sorted.last()) else {
        return true;
    };
    let (dx, dy) = (b.lon - a.lon, b.lat - a.lat);
    let span = dx.hypot(dy);
    sorted.iter().all(|p| {
        let (px, py) = (p.lon - a.lon, p.lat - a.lat);
        (dx * py - dy * px).abs() <= 1e-9 * span * px.hypot(py)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Coordinate> {
        let mut pts = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                pts.push(Coordinate::new(i as f64 * 0.001, j as f64 * 0.001));
            }
        }
        pts
    }

    #[test]
    fn test_degenerate_inputs_pass_through() {
        let one = vec![Coordinate::new(1.0, 1.0), Coordinate::new(1.0, 1.0)];
        assert_eq!(boundary(&one, HullMethod::Concave, 2.0).len(), 1);

        let two = vec![Coordinate::new(1.0, 1.0), Coordinate::new(1.0, 1.001)];
        assert_eq!(boundary(&two, HullMethod::Convex, 2.0), two);
    }

    #[test]
    fn test_convex_hull_is_closed_ring_of_corners() {
        let ring = boundary(&grid(), HullMethod::Convex, 2.0);
        assert_eq!(ring.first(), ring.last(), "ring should be closed");
        assert!(ring.len() >= 5);
        for corner in [(0.0, 0.0), (0.0, 0.003), (0.003, 0.0), (0.003, 0.003)] {
            assert!(
                ring.iter().any(|c| (c.lat - corner.0).abs() < 1e-12 && (c.lon - corner.1).abs() < 1e-12),
                "missing corner {:?}",
                corner
            );
        }
    }

    #[test]
    fn test_concave_hull_is_closed_and_in_bounds() {
        let ring = boundary(&grid(), HullMethod::Concave, 2.0);
        assert!(ring.len() >= 4);
        assert_eq!(ring.first(), ring.last());
        assert!(ring.iter().all(|c| (-1e-9..=0.003 + 1e-9).contains(&c.lat) && (-1e-9..=0.003 + 1e-9).contains(&c.lon)));
    }

    #[test]
    fn test_single_street_is_not_a_ring() {
        let street: Vec<Coordinate> = (0..6).rev().map(|i| Coordinate::new(21.0, 92.0 + i as f64 * 0.001)).collect();
        for method in [HullMethod::Concave, HullMethod::Convex] {
            let line = boundary(&street, method, 2.0);
            assert_eq!(line.len(), 6);
            assert_eq!(line[0], Coordinate::new(21.0, 92.0));
            assert!(line.windows(2).all(|w| w[0].lon < w[1].lon));
        }

        let diagonal: Vec<Coordinate> = (0..5).map(|i| Coordinate::new(i as f64 * 0.001, i as f64 * 0.002)).collect();
        assert_eq!(boundary(&diagonal, HullMethod::Concave, 2.0), diagonal);
    }

    #[test]
    fn test_large_repeated_grid_hull() {
        let mut pts = Vec::with_capacity(2 * 300 * 300);
        for _ in 0..2 {
            for i in 0..300 {
                for j in 0..300 {
                    pts.push(Coordinate::new(i as f64 * 0.0001, j as f64 * 0.0001));
                }
            }
        }
        let ring = boundary(&pts, HullMethod::Convex, 2.0);
        assert_eq!(ring.first(), ring.last());
        let far = 299.0 * 0.0001;
        for corner in [(0.0, 0.0), (0.0, far), (far, 0.0), (far, far)] {
            assert!(
                ring.iter().any(|c| (c.lat - corner.0).abs() < 1e-12 && (c.lon - corner.1).abs() < 1e-12),
                "missing corner {:?}",
                corner
            );
        }
    }
}
