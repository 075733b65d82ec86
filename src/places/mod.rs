//! Place names — the in-memory gazetteer and the geocoder over it.
//!
//! ```ignore
//! let index = Arc::new(PlaceIndex::new(dataset.places));
//! let geocoder = Geocoder::new(index);
//! let matches = geocoder.find_all("route from Camp 8E to Kutupalong Market");
//! ```

pub mod geocoder;
pub mod index;

pub use geocoder::{AnnotatedQuery, GeocodeMatch, Geocoder, PlaceRole};
pub use index::{normalize_name, PlaceEntry, PlaceGroup, PlaceIndex};
