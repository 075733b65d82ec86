//! Dataset snapshots — load a prebuilt location from disk.
//!
//! A snapshot carries the walking network, the POIs and the gazetteer for one
//! location. `.json` files are read with serde_json, anything else as bincode.
//! Snapshots are produced by the ingestion tooling; this crate only reads them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::WalkingConfig;
use crate::error::{MeridianError, Result};
use crate::graph::{WalkEdge, WalkGraph, WalkNode};
use crate::places::{PlaceEntry, PlaceIndex};
use crate::primitives::PointOfInterest;
use crate::storage::PoiStore;

/// Edge as stored in a snapshot. `minutes` is derived from the walking speed
/// when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEdge {
    pub from: u64,
    pub to: u64,
    pub length_m: f64,
    #[serde(default)]
    pub minutes: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<WalkNode>,
    pub edges: Vec<DatasetEdge>,
    #[serde(default)]
    pub pois: Vec<PointOfInterest>,
    #[serde(default)]
    pub places: Vec<PlaceEntry>,
}

/// A dataset turned into the three query-time structures.
pub struct LoadedDataset {
    pub name: String,
    pub graph: WalkGraph,
    pub pois: PoiStore,
    pub places: Arc<PlaceIndex>,
}

impl Dataset {
    /// Read a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "loading dataset");

        if !path.exists() {
            return Err(MeridianError::DatasetNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let dataset: Dataset = if is_json {
            serde_json::from_slice(&bytes).map_err(|e| MeridianError::DatasetParse {
                path: path.to_path_buf(),
                message: format!("json: {}", e),
            })?
        } else {
            bincode::deserialize(&bytes).map_err(|e| MeridianError::DatasetParse {
                path: path.to_path_buf(),
                message: format!("bincode: {}", e),
            })?
        };

        debug!(
            nodes = dataset.nodes.len(),
            edges = dataset.edges.len(),
            pois = dataset.pois.len(),
            places = dataset.places.len(),
            "dataset read"
        );
        Ok(dataset)
    }

    /// Build the graph, POI store and place index.
    pub fn into_loaded(self, walking: &WalkingConfig) -> Result<LoadedDataset> {
        let speed = walking.speed_m_per_min;
        let edges = self
            .edges
            .into_iter()
            .map(|e| {
                let minutes = e.minutes.unwrap_or(e.length_m / speed);
                (
                    e.from,
                    e.to,
                    WalkEdge {
                        length_m: e.length_m,
                        minutes,
                    },
                )
            })
            .collect();

        let graph = WalkGraph::from_parts(self.nodes, edges)?;
        let pois = PoiStore::new(self.pois);
        let places = Arc::new(PlaceIndex::new(self.places));

        info!(
            name = %self.name,
            graph = %graph.stats(),
            pois = pois.len(),
            places = places.len(),
            "dataset ready"
        );

        Ok(LoadedDataset {
            name: self.name,
            graph,
            pois,
            places,
        })
    }
}

/// Data root holding one directory per location.
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn open(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot path for `slug`, preferring bincode over JSON.
    pub fn dataset_path(&self, slug: &str) -> Option<PathBuf> {
        let dir = self.root.join(slug);
        ["bin", "json"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", slug, ext)))
            .find(|p| p.is_file())
    }

    /// Slugs with a readable snapshot, sorted.
    pub fn locations(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut slugs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let slug = entry.file_name().to_string_lossy().to_string();
            if self.dataset_path(&slug).is_some() {
                slugs.push(slug);
            }
        }
        slugs.sort();
        Ok(slugs)
    }
}
