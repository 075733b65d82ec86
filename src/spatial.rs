//! Coordinates and small-scale geometry.
//!
//! Distances are haversine metres. Polyline math (corridor filtering) runs in
//! a local equirectangular frame, which is accurate to well under a percent
//! at city scale.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside the WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance in metres.
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        haversine_m(self.lat, self.lon, other.lat, other.lon)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

/// Equirectangular projection around a reference latitude, in metres.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    m_per_deg_lat: f64,
    m_per_deg_lon: f64,
}

impl LocalFrame {
    pub fn around(reference_lat: f64) -> Self {
        let m_per_deg = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        Self {
            m_per_deg_lat: m_per_deg,
            m_per_deg_lon: m_per_deg * reference_lat.to_radians().cos().max(1e-6),
        }
    }

    /// `[x east, y north]` in metres.
    pub fn project(&self, c: &Coordinate) -> [f64; 2] {
        [c.lon * self.m_per_deg_lon, c.lat * self.m_per_deg_lat]
    }
}

/// Where a point falls relative to a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineOffset {
    /// Perpendicular distance to the nearest segment.
    pub offset_m: f64,
    /// Distance from the start of the polyline to the foot of the perpendicular.
    pub along_m: f64,
}

/// Distance from `point` to the piecewise-linear `line`.
///
/// A single-vertex line degenerates to point distance. Returns `None` for an
/// empty line.
pub fn offset_from_polyline(point: &Coordinate, line: &[Coordinate]) -> Option<PolylineOffset> {
    let first = line.first()?;
    let frame = LocalFrame::around(point.lat);
    let p = frame.project(point);

    if line.len() == 1 {
        let a = frame.project(first);
        return Some(PolylineOffset {
            offset_m: planar_distance(p, a),
            along_m: 0.0,
        });
    }

    let mut best: Option<PolylineOffset> = None;
    let mut walked = 0.0;
    for pair in line.windows(2) {
        let a = frame.project(&pair[0]);
        let b = frame.project(&pair[1]);
        let (dist, t) = point_segment(p, a, b);
        let seg_len = planar_distance(a, b);
        let candidate = PolylineOffset {
            offset_m: dist,
            along_m: walked + t * seg_len,
        };
        if best.map_or(true, |b| candidate.offset_m < b.offset_m) {
            best = Some(candidate);
        }
        walked += seg_len;
    }
    best
}

fn planar_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// Distance from `p` to segment `ab` and the clamped projection parameter.
fn point_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> (f64, f64) {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return (planar_distance(p, a), 0.0);
    }
    let t = (((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len2).clamp(0.0, 1.0);
    let foot = [a[0] + t * dx, a[1] + t * dy];
    (planar_distance(p, foot), t)
}
