//! Geocoding and boundary caches for the data-center sustainability dashboard.
//!
//! The dashboard plots facilities and policy data on maps. Resolving place
//! names to coordinates is slow and rate limited, so it happens offline in a
//! maintenance pass and the results are kept in flat files:
//!
//! - [`cache`]: the location cache (`LocationKey -> LocationRecord`) and its
//!   atomic on-disk store
//! - [`update`]: the pass that geocodes keys missing from the cache
//! - [`geocode`]: the provider seam plus a Nominatim client
//! - [`boundary`]: the single GeoJSON boundary document cache
//! - [`dataset`]: CSV loading for the source rows
//! - [`context`]: read-only, load-once access for the dashboard

pub mod boundary;
pub mod cache;
pub mod config;
pub mod context;
pub mod dataset;
pub mod geocode;
pub mod location;
pub mod update;
pub mod utils;

pub use boundary::{BoundaryCache, BoundarySource};
pub use cache::{CacheStore, LocationCache};
pub use config::Config;
pub use context::AppContext;
pub use dataset::{ColumnMapping, DataTable};
pub use geocode::{Geocoder, NominatimClient};
pub use location::{LocationKey, LocationLevel, LocationRecord};
pub use update::{run_update_pass, UpdateReport};

#[cfg(test)]
pub(crate) mod test_support;
