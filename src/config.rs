//! Configuration — `meridian.toml`.
//!
//! Every field has a default, so an empty or missing file is a valid config.
//!
//! ```toml
//! [dataset]
//! path = "data/dhaka/dhaka.bin"
//!
//! [limits]
//! min_radius_m = 50.0
//! max_radius_m = 10000.0
//!
//! [search]
//! initial_radius_m = 500.0
//! radius_cap_m = 5000.0
//! max_doublings = 4
//!
//! [model]
//! url = "http://localhost:8080/v1/chat/completions"
//! timeout_secs = 120
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{MeridianError, Result};

/// Default config file name, looked up relative to the working directory.
pub const CONFIG_FILE: &str = "meridian.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeridianConfig {
    pub dataset: DatasetConfig,
    pub limits: LimitsConfig,
    pub search: SearchConfig,
    pub walking: WalkingConfig,
    pub isochrone: IsochroneConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/dataset.bin"),
        }
    }
}

/// Clamp bounds and defaults applied by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub min_radius_m: f64,
    pub max_radius_m: f64,
    pub default_radius_m: f64,

    pub min_minutes: f64,
    pub max_minutes: f64,
    pub default_minutes: f64,

    pub min_corridor_m: f64,
    pub max_corridor_m: f64,
    pub default_corridor_m: f64,

    pub max_nearest: usize,
    pub default_nearest: usize,

    pub max_list: usize,
    pub default_list: usize,

    pub max_geocode_results: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_radius_m: 50.0,
            max_radius_m: 10_000.0,
            default_radius_m: 1_000.0,
            min_minutes: 1.0,
            max_minutes: 120.0,
            default_minutes: 15.0,
            min_corridor_m: 10.0,
            max_corridor_m: 2_000.0,
            default_corridor_m: 200.0,
            max_nearest: 10,
            default_nearest: 3,
            max_list: 100,
            default_list: 20,
            max_geocode_results: 5,
        }
    }
}

/// Expanding-radius search for `find_nearest_poi_with_route`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub initial_radius_m: f64,
    pub radius_cap_m: f64,
    pub max_doublings: u32,
    /// Straight-line candidates routed per requested result.
    pub candidate_factor: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            initial_radius_m: 500.0,
            radius_cap_m: 5_000.0,
            max_doublings: 4,
            candidate_factor: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkingConfig {
    /// 5 km/h.
    pub speed_m_per_min: f64,
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            speed_m_per_min: 83.33,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullMethod {
    Concave,
    Convex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochroneConfig {
    pub hull: HullMethod,
    /// Higher is closer to the convex hull.
    pub concavity: f64,
    /// List POIs of every category when a call names none.
    pub include_pois: bool,
}

impl Default for IsochroneConfig {
    fn default() -> Self {
        Self {
            hull: HullMethod::Concave,
            concavity: 2.0,
            include_pois: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/v1/chat/completions".to_string(),
            model: "xLAM".to_string(),
            timeout_secs: 120,
        }
    }
}

impl MeridianConfig {
    /// Load and normalize a config file.
    pub fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "loading config");

        let text = fs::read_to_string(path)?;
        let config: MeridianConfig = toml::from_str(&text).map_err(|e| MeridianError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(config.normalized())
    }

    /// Load `path` if it exists, otherwise return the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Repair inverted or non-positive bounds so clamping is always defined.
    pub fn normalized(mut self) -> Self {
        let l = &mut self.limits;
        order_bounds(&mut l.min_radius_m, &mut l.max_radius_m, 1.0);
        order_bounds(&mut l.min_minutes, &mut l.max_minutes, 0.1);
        order_bounds(&mut l.min_corridor_m, &mut l.max_corridor_m, 1.0);
        l.default_radius_m = l.default_radius_m.clamp(l.min_radius_m, l.max_radius_m);
        l.default_minutes = l.default_minutes.clamp(l.min_minutes, l.max_minutes);
        l.default_corridor_m = l.default_corridor_m.clamp(l.min_corridor_m, l.max_corridor_m);
        l.max_nearest = l.max_nearest.max(1);
        l.default_nearest = l.default_nearest.clamp(1, l.max_nearest);
        l.max_list = l.max_list.max(1);
        l.default_list = l.default_list.clamp(1, l.max_list);
        l.max_geocode_results = l.max_geocode_results.max(1);

        let s = &mut self.search;
        if !(s.initial_radius_m.is_finite() && s.initial_radius_m > 0.0) {
            s.initial_radius_m = SearchConfig::default().initial_radius_m;
        }
        if !(s.radius_cap_m.is_finite() && s.radius_cap_m >= s.initial_radius_m) {
            s.radius_cap_m = s.initial_radius_m;
        }
        s.candidate_factor = s.candidate_factor.max(1);

        if !(self.walking.speed_m_per_min.is_finite() && self.walking.speed_m_per_min > 0.0) {
            self.walking.speed_m_per_min = WalkingConfig::default().speed_m_per_min;
        }
        if !(self.isochrone.concavity.is_finite() && self.isochrone.concavity > 0.0) {
            self.isochrone.concavity = IsochroneConfig::default().concavity;
        }

        self
    }
}

fn order_bounds(min: &mut f64, max: &mut f64, floor: f64) {
    if !min.is_finite() || *min < floor {
        *min = floor;
    }
    if !max.is_finite() {
        *max = *min;
    }
    if *max < *min {
        std::mem::swap(min, max);
        if *min < floor {
            *min = floor;
        }
    }
}
