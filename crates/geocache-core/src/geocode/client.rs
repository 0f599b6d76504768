//! HTTP client for an OpenStreetMap Nominatim-compatible search API.
//!
//! Calls are made one at a time and spaced at least `min_interval` apart;
//! the public Nominatim usage policy allows one request per second.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;

use super::{Coordinates, GeocodeError, Geocoded, Geocoder, LocationQuery};
use crate::config::GeocoderSettings;
use crate::location::IsoCodes;

/// Address keys Nominatim uses for first-level subdivision codes, best first.
const STATE_ISO_KEYS: [&str; 3] = ["ISO3166-2-lvl4", "ISO3166-2-lvl6", "ISO3166-2-lvl3"];

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: HashMap<String, String>,
}

/// Build the shared HTTP client with the configured timeout and user agent.
pub fn build_http_client(settings: &GeocoderSettings) -> Result<Client> {
    Client::builder()
        .timeout(settings.timeout())
        .user_agent(settings.user_agent.clone())
        .build()
        .context("Failed to build HTTP client")
}

/// Geocoder backed by Nominatim's `/search` endpoint.
pub struct NominatimClient {
    client: Client,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimClient {
    /// Create a client with its own HTTP connection pool
    pub fn new(settings: &GeocoderSettings) -> Result<Self> {
        Ok(Self::with_client(build_http_client(settings)?, settings))
    }

    /// Create a client that reuses an existing HTTP client
    pub fn with_client(client: Client, settings: &GeocoderSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.clone(),
            min_interval: settings.min_interval(),
            last_request: Mutex::new(None),
        }
    }

    /// Wait until `min_interval` has passed since the previous request.
    async fn throttle(&self) {
        let wait = {
            let mut last = match self.last_request.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let now = Instant::now();
            let wait = last
                .map(|prev| (prev + self.min_interval).saturating_duration_since(now))
                .unwrap_or_default();
            *last = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Throttling geocoding request");
            tokio::time::sleep(wait).await;
        }
    }

    fn search_params(query: &LocationQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("limit", "1".to_string()),
        ];
        if let Some(ref city) = query.city {
            params.push(("city", city.clone()));
        }
        if let Some(ref state) = query.state_province {
            params.push(("state", state.clone()));
        }
        if let Some(ref country) = query.country {
            params.push(("country", country.clone()));
        }
        params
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, query: &LocationQuery) -> Result<Option<Geocoded>, GeocodeError> {
        self.throttle().await;

        debug!(query = %query.text(), "Geocoding");
        let response = self
            .client
            .get(&self.base_url)
            .query(&Self::search_params(query))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GeocodeError::from_status(status, &body));
        }

        parse_search_response(&body)
    }
}

/// Parse a `/search?format=jsonv2` body. An empty array means no match.
pub fn parse_search_response(body: &str) -> Result<Option<Geocoded>, GeocodeError> {
    let hits: Vec<SearchHit> = serde_json::from_str(body)
        .map_err(|e| GeocodeError::InvalidResponse(format!("Malformed search response: {}", e)))?;

    let Some(hit) = hits.into_iter().next() else {
        return Ok(None);
    };

    let latitude = parse_coordinate(&hit.lat, "lat")?;
    let longitude = parse_coordinate(&hit.lon, "lon")?;

    let country_iso = hit
        .address
        .get("country_code")
        .map(|code| code.to_uppercase());
    let state_iso = STATE_ISO_KEYS
        .iter()
        .find_map(|k| hit.address.get(*k))
        .cloned();

    Ok(Some(Geocoded {
        coordinates: Coordinates {
            latitude,
            longitude,
        },
        resolved_name: hit.display_name,
        iso_codes: IsoCodes {
            country_iso,
            state_iso,
        },
    }))
}

fn parse_coordinate(raw: &str, field: &str) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeocodeError::InvalidResponse(format!("Bad {} value: {:?}", field, raw)))
}
