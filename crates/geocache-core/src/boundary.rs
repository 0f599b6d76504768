//! GeoJSON boundary cache.
//!
//! The dashboard's choropleth maps need one boundary document (US state
//! polygons). It is fetched once from a fixed upstream URL and kept on disk.
//! There is no expiry; the file only changes when [`BoundaryCache::refresh`]
//! is run explicitly.

use std::path::{Path, PathBuf};

use anyhow::Result;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::utils::{truncate_body, write_atomic};

/// Upstream source of the US state boundary polygons
pub const DEFAULT_BOUNDARY_URL: &str =
    "https://raw.githubusercontent.com/PublicaMundi/MappingAPI/master/data/geojson/us-states.json";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not a GeoJSON FeatureCollection: {0}")]
    InvalidDocument(String),
}

/// What `get` could produce.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundarySource {
    /// Parsed document, from disk or a fresh download.
    Document(Value),
    /// Cache miss and fetch failure; callers that accept a URL can stream it
    /// themselves.
    RemoteUrl(String),
}

impl BoundarySource {
    pub fn document(&self) -> Option<&Value> {
        match self {
            BoundarySource::Document(doc) => Some(doc),
            BoundarySource::RemoteUrl(_) => None,
        }
    }

    pub fn into_document(self) -> Option<Value> {
        match self {
            BoundarySource::Document(doc) => Some(doc),
            BoundarySource::RemoteUrl(_) => None,
        }
    }
}

struct Fetched {
    body: String,
    document: Value,
}

pub struct BoundaryCache {
    path: PathBuf,
    url: String,
    client: Client,
}

impl BoundaryCache {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>, client: Client) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            client,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Cached document if present, else one fetch attempt, else the URL.
    pub async fn get(&self) -> BoundarySource {
        if let Some(document) = self.read_cached() {
            return BoundarySource::Document(document);
        }

        match self.fetch().await {
            Ok(fetched) => {
                if let Err(e) = write_atomic(&self.path, fetched.body.as_bytes()) {
                    warn!(path = %self.path.display(), error = %e, "Failed to cache boundary document");
                }
                BoundarySource::Document(fetched.document)
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "Boundary fetch failed, falling back to remote URL");
                BoundarySource::RemoteUrl(self.url.clone())
            }
        }
    }

    /// Like [`get`](Self::get) for callers that need the parsed document.
    pub async fn get_document(&self) -> Option<Value> {
        self.get().await.into_document()
    }

    /// Re-download and replace the cached file. The existing file is left
    /// untouched if the download fails.
    pub async fn refresh(&self) -> Result<()> {
        let fetched = self.fetch().await?;
        write_atomic(&self.path, fetched.body.as_bytes())?;
        info!(
            path = %self.path.display(),
            bytes = fetched.body.len(),
            "Refreshed boundary cache"
        );
        Ok(())
    }

    fn read_cached(&self) -> Option<Value> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read boundary cache");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(document) => {
                debug!(path = %self.path.display(), "Boundary cache hit");
                Some(document)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt boundary cache");
                None
            }
        }
    }

    async fn fetch(&self) -> Result<Fetched, BoundaryError> {
        debug!(url = %self.url, "Fetching boundary document");
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BoundaryError::Status {
                status: status.as_u16(),
                body: truncate_body(&body, MAX_ERROR_BODY_LENGTH),
            });
        }

        let document = validate_feature_collection(&body)?;
        Ok(Fetched { body, document })
    }
}

fn validate_feature_collection(body: &str) -> Result<Value, BoundaryError> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| BoundaryError::InvalidDocument(e.to_string()))?;
    match document.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => Ok(document),
        Some(other) => Err(BoundaryError::InvalidDocument(format!("type is {}", other))),
        None => Err(BoundaryError::InvalidDocument("missing type".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, serve_once, test_http_client};

    const STATES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "id": "06", "properties": {"name": "California"}, "geometry": null}
    ]}"#;

    #[tokio::test]
    async fn test_get_returns_cached_file_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.geojson");
        std::fs::write(&path, STATES).unwrap();

        let cache = BoundaryCache::new(&path, closed_port_url().await, test_http_client());
        let doc = cache.get_document().await.unwrap();
        assert_eq!(doc["features"][0]["properties"]["name"], "California");
    }

    #[tokio::test]
    async fn test_get_fetches_and_saves_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("states.geojson");
        let server = serve_once("200 OK", STATES.to_string()).await;

        let cache = BoundaryCache::new(&path, server.url("/us-states.json"), test_http_client());
        let source = cache.get().await;
        assert!(source.document().is_some());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), STATES);

        let request = server.request().await;
        assert!(request.starts_with("GET /us-states.json"));
    }

    #[tokio::test]
    async fn test_get_falls_back_to_url_when_fetch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.geojson");
        let url = closed_port_url().await;

        let cache = BoundaryCache::new(&path, url.clone(), test_http_client());
        assert_eq!(cache.get().await, BoundarySource::RemoteUrl(url));
        assert!(cache.get_document().await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_get_rejects_non_geojson() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.geojson");
        let server = serve_once("200 OK", r#"{"type": "Topology"}"#.to_string()).await;
        let url = server.url("/topo.json");

        let cache = BoundaryCache::new(&path, url.clone(), test_http_client());
        assert_eq!(cache.get().await, BoundarySource::RemoteUrl(url));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.geojson");
        std::fs::write(&path, STATES).unwrap();
        let server = serve_once("503 Service Unavailable", "down".to_string()).await;

        let cache = BoundaryCache::new(&path, server.url("/us-states.json"), test_http_client());
        let err = cache.refresh().await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), STATES);
    }

    #[tokio::test]
    async fn test_refresh_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.geojson");
        std::fs::write(&path, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        let server = serve_once("200 OK", STATES.to_string()).await;

        let cache = BoundaryCache::new(&path, server.url("/us-states.json"), test_http_client());
        cache.refresh().await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), STATES);
    }

    #[test]
    fn test_validate_feature_collection() {
        assert!(validate_feature_collection(STATES).is_ok());
        assert!(validate_feature_collection("[]").is_err());
        assert!(validate_feature_collection("not json").is_err());
    }
}
