//! Geocoding provider seam.
//!
//! The update pass only talks to the [`Geocoder`] trait. The production
//! implementation is [`NominatimClient`], which queries an OpenStreetMap
//! Nominatim-compatible search endpoint; tests substitute scripted doubles.

pub mod client;
pub mod error;
pub mod query;

pub use client::NominatimClient;
pub use error::GeocodeError;
pub use query::{Coordinates, Geocoded, LocationQuery};

/// Resolves a place description to coordinates.
///
/// `Ok(None)` means the provider answered but found nothing.
#[allow(async_fn_in_trait)]
pub trait Geocoder {
    async fn geocode(&self, query: &LocationQuery) -> Result<Option<Geocoded>, GeocodeError>;
}
