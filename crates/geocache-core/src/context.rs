//! Read-only access to the caches for the dashboard process.
//!
//! The dashboard never writes the caches. It loads the location cache once,
//! on first use, through this context instead of a module-level global.

use std::sync::OnceLock;

use reqwest::Client;

use crate::boundary::BoundaryCache;
use crate::cache::{CacheStore, LocationCache};
use crate::config::Config;

pub struct AppContext {
    config: Config,
    locations: OnceLock<LocationCache>,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            locations: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Location cache as it was on first access. Later writes by the
    /// maintenance tool are not picked up until the process restarts.
    pub fn locations(&self) -> &LocationCache {
        self.locations
            .get_or_init(|| self.location_store().load())
    }

    pub fn location_store(&self) -> CacheStore {
        CacheStore::new(self.config.location_cache_path.clone())
    }

    pub fn boundary_cache(&self, client: Client) -> BoundaryCache {
        BoundaryCache::new(
            self.config.boundary_cache_path.clone(),
            self.config.boundary_url.clone(),
            client,
        )
    }
}
