//! PlaceIndex — immutable name → coordinate table, built once per dataset.
//!
//! Entries sharing a normalized name are grouped; the group resolves to the
//! centroid of its entries. Groups are bucketed by their first token and
//! ordered longest-first inside each bucket, so a scan always tries the most
//! specific name before any of its prefixes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::spatial::Coordinate;

/// One named place as loaded from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceEntry {
    pub name: String,
    #[serde(default)]
    pub normalized_name: String,
    pub lat: f64,
    pub lon: f64,
}

impl PlaceEntry {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        let name = name.into();
        Self {
            normalized_name: normalize_name(&name),
            name,
            lat,
            lon,
        }
    }
}

/// All entries sharing one normalized name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceGroup {
    /// Display name of the first entry seen.
    pub name: String,
    pub normalized_name: String,
    pub coordinate: Coordinate,
    pub entries: usize,
    #[serde(skip)]
    pub(crate) tokens: Vec<String>,
}

/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct PlaceIndex {
    groups: Vec<PlaceGroup>,
    by_name: HashMap<String, usize>,
    /// First token → group indices, most tokens first.
    by_first_token: HashMap<String, Vec<usize>>,
}

/// Lowercase alphanumeric tokens.
pub(crate) fn tokens_of(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Canonical form used for matching: lowercase tokens joined by one space.
pub fn normalize_name(name: &str) -> String {
    tokens_of(name).join(" ")
}

impl PlaceIndex {
    pub fn new(entries: Vec<PlaceEntry>) -> Self {
        struct Acc {
            name: String,
            lat_sum: f64,
            lon_sum: f64,
            count: usize,
        }

        let mut order: Vec<String> = Vec::new();
        let mut acc: HashMap<String, Acc> = HashMap::new();
        let mut skipped = 0usize;

        for entry in entries {
            let normalized = normalize_name(&entry.name);
            let coordinate = Coordinate::new(entry.lat, entry.lon);
            if normalized.is_empty() || !coordinate.is_valid() {
                skipped += 1;
                continue;
            }
            let slot = acc.entry(normalized.clone()).or_insert_with(|| {
                order.push(normalized.clone());
                Acc {
                    name: entry.name.clone(),
                    lat_sum: 0.0,
                    lon_sum: 0.0,
                    count: 0,
                }
            });
            slot.lat_sum += entry.lat;
            slot.lon_sum += entry.lon;
            slot.count += 1;
        }

        if skipped > 0 {
            warn!(skipped, "place entries without a usable name or coordinate");
        }

        let mut index = PlaceIndex::default();
        for normalized in order {
            let Some(a) = acc.remove(&normalized) else {
                continue;
            };
            let n = a.count as f64;
            let group = PlaceGroup {
                name: a.name,
                coordinate: Coordinate::new(a.lat_sum / n, a.lon_sum / n),
                entries: a.count,
                tokens: tokens_of(&normalized),
                normalized_name: normalized.clone(),
            };
            let idx = index.groups.len();
            index.by_name.insert(normalized, idx);
            if let Some(first) = group.tokens.first() {
                index.by_first_token.entry(first.clone()).or_default().push(idx);
            }
            index.groups.push(group);
        }

        let groups = &index.groups;
        for bucket in index.by_first_token.values_mut() {
            bucket.sort_by(|&a, &b| {
                groups[b]
                    .tokens
                    .len()
                    .cmp(&groups[a].tokens.len())
                    .then_with(|| groups[b].normalized_name.len().cmp(&groups[a].normalized_name.len()))
                    .then_with(|| groups[a].normalized_name.cmp(&groups[b].normalized_name))
            });
        }

        debug!(places = index.groups.len(), "place index built");
        index
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[PlaceGroup] {
        &self.groups
    }

    /// Exact lookup by any spelling that normalizes to a known name.
    pub fn get(&self, name: &str) -> Option<&PlaceGroup> {
        self.by_name
            .get(&normalize_name(name))
            .map(|&idx| &self.groups[idx])
    }

    /// Candidate groups whose name starts with `token`, longest first.
    pub(crate) fn candidates(&self, token: &str) -> impl Iterator<Item = &PlaceGroup> {
        self.by_first_token
            .get(token)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.groups[idx])
    }
}
