//! Storage — prebuilt dataset snapshots and the POI store over them.

pub mod dataset;
pub mod poi_store;

pub use dataset::{DataDir, Dataset, DatasetEdge, LoadedDataset};
pub use poi_store::PoiStore;
