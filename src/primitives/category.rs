//! The fixed set of POI categories and loose name matching.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    Hospital,
    Clinic,
    Doctors,
    Pharmacy,
    Police,
    FireStation,
    Shelter,
    School,
    University,
    Bank,
    Atm,
    Supermarket,
    Marketplace,
    DrinkingWater,
    WaterPoint,
    Fuel,
    BusStation,
    PlaceOfWorship,
}

/// Common synonyms the model produces for the canonical tags.
const ALIASES: &[(&str, PoiCategory)] = &[
    ("police_station", PoiCategory::Police),
    ("gas_station", PoiCategory::Fuel),
    ("petrol_station", PoiCategory::Fuel),
    ("market", PoiCategory::Marketplace),
    ("mosque", PoiCategory::PlaceOfWorship),
    ("church", PoiCategory::PlaceOfWorship),
    ("temple", PoiCategory::PlaceOfWorship),
];

impl PoiCategory {
    pub const ALL: [PoiCategory; 18] = [
        PoiCategory::Hospital,
        PoiCategory::Clinic,
        PoiCategory::Doctors,
        PoiCategory::Pharmacy,
        PoiCategory::Police,
        PoiCategory::FireStation,
        PoiCategory::Shelter,
        PoiCategory::School,
        PoiCategory::University,
        PoiCategory::Bank,
        PoiCategory::Atm,
        PoiCategory::Supermarket,
        PoiCategory::Marketplace,
        PoiCategory::DrinkingWater,
        PoiCategory::WaterPoint,
        PoiCategory::Fuel,
        PoiCategory::BusStation,
        PoiCategory::PlaceOfWorship,
    ];

    /// The OSM-style tag, e.g. `fire_station`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoiCategory::Hospital => "hospital",
            PoiCategory::Clinic => "clinic",
            PoiCategory::Doctors => "doctors",
            PoiCategory::Pharmacy => "pharmacy",
            PoiCategory::Police => "police",
            PoiCategory::FireStation => "fire_station",
            PoiCategory::Shelter => "shelter",
            PoiCategory::School => "school",
            PoiCategory::University => "university",
            PoiCategory::Bank => "bank",
            PoiCategory::Atm => "atm",
            PoiCategory::Supermarket => "supermarket",
            PoiCategory::Marketplace => "marketplace",
            PoiCategory::DrinkingWater => "drinking_water",
            PoiCategory::WaterPoint => "water_point",
            PoiCategory::Fuel => "fuel",
            PoiCategory::BusStation => "bus_station",
            PoiCategory::PlaceOfWorship => "place_of_worship",
        }
    }

    /// Exact tag match.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == tag)
    }

    /// Case-insensitive, separator-insensitive, singular/plural-insensitive match.
    ///
    /// `"Fire Stations"`, `"pharmacies"` and `"doctor"` all resolve.
    pub fn normalize(raw: &str) -> Option<Self> {
        let key = tag_key(raw);
        if key.is_empty() {
            return None;
        }

        let singular = key
            .split('_')
            .map(singularize)
            .collect::<Vec<_>>()
            .join("_");
        let plural = format!("{}s", key);

        for candidate in [key.as_str(), singular.as_str(), plural.as_str()] {
            if let Some(category) = Self::from_tag(candidate) {
                return Some(category);
            }
            if let Some((_, category)) = ALIASES.iter().find(|(alias, _)| *alias == candidate) {
                return Some(*category);
            }
        }
        None
    }
}

impl std::fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercase, with runs of spaces, hyphens and underscores folded to one `_`.
fn tag_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c == ' ' || c == '-' || c == '_' {
            if !key.is_empty() && !key.ends_with('_') {
                key.push('_');
            }
        } else {
            key.extend(c.to_lowercase());
        }
    }
    key.trim_end_matches('_').to_string()
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    for suffix in ["ches", "shes", "xes", "sses"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}
