//! Argument extraction and repair.
//!
//! Model-produced arguments are read leniently: numbers may arrive as strings,
//! parameters under common aliases, latitude and longitude swapped. Out of
//! range numbers are clamped. Every change is recorded as a [`Repair`].

use serde_json::{json, Map, Value};
use tracing::warn;

use super::types::Repair;
use crate::primitives::PoiCategory;
use crate::spatial::Coordinate;

/// Inclusive bounds plus the value used when the argument is absent.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64, default: f64) -> Self {
        Self { min, max, default }
    }
}

/// Read-only view over one intent's arguments that collects repairs.
pub struct Args<'a> {
    map: &'a Map<String, Value>,
    repairs: Vec<Repair>,
}

impl<'a> Args<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            repairs: Vec::new(),
        }
    }

    pub fn into_repairs(self) -> Vec<Repair> {
        self.repairs
    }

    pub fn record(&mut self, parameter: &str, original: Value, repaired: Value, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(parameter, %original, %repaired, reason = %reason, "repaired argument");
        self.repairs.push(Repair {
            parameter: parameter.to_string(),
            original,
            repaired,
            reason,
        });
    }

    /// First key present with a non-null value.
    fn raw(&self, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
        let map: &'a Map<String, Value> = self.map;
        keys.iter().find_map(|k| {
            map.get_key_value(*k)
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.as_str(), v))
        })
    }

    pub fn has(&self, keys: &[&str]) -> bool {
        self.raw(keys).is_some()
    }

    /// Non-empty trimmed string.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        let (_, v) = self.raw(keys)?;
        let s = v.as_str()?.trim();
        (!s.is_empty()).then(|| s.to_string())
    }

    /// Boolean, also from `"true"`/`"yes"`/`1`.
    pub fn flag(&self, keys: &[&str]) -> Option<bool> {
        let (_, v) = self.raw(keys)?;
        match v {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Strings from an array or a comma-separated string.
    pub fn list(&self, keys: &[&str]) -> Vec<String> {
        match self.raw(keys) {
            Some((_, Value::Array(items))) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some((_, Value::String(s))) => s
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Numeric value, parsing numeric strings. `Err` carries the raw value
    /// when it is present but not numeric.
    fn number(&self, keys: &[&str]) -> Option<(&'a str, Result<f64, Value>)> {
        let (key, v) = self.raw(keys)?;
        let parsed = match v {
            Value::Number(n) => n.as_f64().ok_or_else(|| v.clone()),
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| v.clone()),
            other => Err(other.clone()),
        };
        Some((key, parsed))
    }

    /// Optional number with no clamping; non-numbers are dropped with a repair.
    pub fn optional_number(&mut self, keys: &[&str]) -> Option<f64> {
        let (key, parsed) = self.number(keys)?;
        match parsed {
            Ok(v) if v.is_finite() => Some(v),
            Ok(v) => {
                self.record(key, json!(v.to_string()), Value::Null, "not a finite number, ignored");
                None
            }
            Err(raw) => {
                self.record(key, raw, Value::Null, "not a number, ignored");
                None
            }
        }
    }

    /// Number clamped into `bounds`. Missing gives the default silently;
    /// unparseable or non-finite gives the default with a repair.
    pub fn clamped(&mut self, keys: &[&str], bounds: Bounds) -> f64 {
        let parameter = keys.first().copied().unwrap_or("value");
        let Some((key, parsed)) = self.number(keys) else {
            return bounds.default;
        };

        let value = match parsed {
            Ok(v) => v,
            Err(raw) => {
                self.record(key, raw, json!(bounds.default), "not a number, using default");
                return bounds.default;
            }
        };

        if !value.is_finite() {
            self.record(
                parameter,
                json!(value.to_string()),
                json!(bounds.default),
                "not a finite number, using default",
            );
            return bounds.default;
        }
        if value < bounds.min {
            self.record(parameter, json!(value), json!(bounds.min), "below minimum, clamped");
            return bounds.min;
        }
        if value > bounds.max {
            self.record(parameter, json!(value), json!(bounds.max), "above maximum, clamped");
            return bounds.max;
        }
        value
    }

    /// Whole count clamped into `min..=max`.
    pub fn count(&mut self, keys: &[&str], min: usize, max: usize, default: usize) -> usize {
        let bounds = Bounds::new(min as f64, max as f64, default as f64);
        self.clamped(keys, bounds).round() as usize
    }

    /// A coordinate from a latitude/longitude key pair.
    ///
    /// A latitude outside ±90 paired with a longitude inside ±90 is taken as
    /// swapped. Anything still invalid is ignored with a repair so the caller
    /// can fall back to geocoding.
    pub fn point(&mut self, lat_keys: &[&str], lon_keys: &[&str]) -> Option<Coordinate> {
        let lat = self.optional_number(lat_keys)?;
        let lon = self.optional_number(lon_keys)?;
        let parameter = format!(
            "{}/{}",
            lat_keys.first().copied().unwrap_or("lat"),
            lon_keys.first().copied().unwrap_or("lon")
        );

        let mut c = Coordinate::new(lat, lon);
        if lat.abs() > 90.0 && lon.abs() <= 90.0 {
            c = Coordinate::new(lon, lat);
            self.record(&parameter, json!([lat, lon]), json!([c.lat, c.lon]), "latitude and longitude swapped");
        }
        if !c.is_valid() {
            self.record(&parameter, json!([lat, lon]), Value::Null, "coordinate out of range, ignored");
            return None;
        }
        Some(c)
    }
}

/// A category named somewhere in free text: word pairs first, then words.
pub fn category_from_text(text: &str) -> Option<PoiCategory> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let pairs = words.windows(2).map(|w| format!("{} {}", w[0], w[1]));
    let singles = words.iter().cloned();
    pairs.chain(singles).find_map(|w| PoiCategory::normalize(&w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_clamp_below_and_above() {
        let m = map(json!({"radius_m": -500, "max_minutes": "600"}));
        let mut args = Args::new(&m);
        assert_eq!(args.clamped(&["radius_m"], Bounds::new(50.0, 10_000.0, 1_000.0)), 50.0);
        assert_eq!(args.clamped(&["max_minutes"], Bounds::new(1.0, 120.0, 15.0)), 120.0);
        let repairs = args.into_repairs();
        assert_eq!(repairs.len(), 2);
        assert_eq!(repairs[0].repaired, json!(50.0));
    }

    #[test]
    fn test_missing_uses_default_silently() {
        let m = map(json!({}));
        let mut args = Args::new(&m);
        assert_eq!(args.clamped(&["radius_m"], Bounds::new(50.0, 10_000.0, 1_000.0)), 1_000.0);
        assert!(args.into_repairs().is_empty());
    }

    #[test]
    fn test_nan_and_garbage_use_default() {
        let m = map(json!({"a": "NaN", "b": "five hundred"}));
        let mut args = Args::new(&m);
        let bounds = Bounds::new(1.0, 10.0, 3.0);
        assert_eq!(args.clamped(&["a"], bounds), 3.0);
        assert_eq!(args.clamped(&["b"], bounds), 3.0);
        assert_eq!(args.into_repairs().len(), 2);
    }

    #[test]
    fn test_count_rounds_and_clamps() {
        let m = map(json!({"limit": 0, "k": 2.6}));
        let mut args = Args::new(&m);
        assert_eq!(args.count(&["limit"], 1, 10, 3), 1);
        assert_eq!(args.count(&["k"], 1, 10, 3), 3);
    }

    #[test]
    fn test_point_aliases_and_swap() {
        let m = map(json!({"lat": "90.41", "lng": 23.81}));
        let mut args = Args::new(&m);
        let c = args.point(&["lat"], &["lon", "lng"]).unwrap();
        assert_eq!(c, Coordinate::new(23.81, 90.41));
        assert_eq!(args.into_repairs()[0].reason, "latitude and longitude swapped");
    }

    #[test]
    fn test_point_out_of_range_is_ignored() {
        let m = map(json!({"lat": 200.0, "lon": 300.0}));
        let mut args = Args::new(&m);
        assert!(args.point(&["lat"], &["lon"]).is_none());
    }

    #[test]
    fn test_list_and_flag() {
        let m = map(json!({"poi_types": "school, clinic", "include_pois": "yes"}));
        let args = Args::new(&m);
        assert_eq!(args.list(&["poi_types"]), vec!["school", "clinic"]);
        assert_eq!(args.flag(&["include_pois"]), Some(true));
    }

    #[test]
    fn test_category_from_text() {
        assert_eq!(category_from_text("nearest fire station to Camp 4"), Some(PoiCategory::FireStation));
        assert_eq!(category_from_text("Where are the pharmacies?"), Some(PoiCategory::Pharmacy));
        assert_eq!(category_from_text("route from A to B"), None);
    }
}
