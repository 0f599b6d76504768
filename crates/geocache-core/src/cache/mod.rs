//! Location cache for offline map rendering.
//!
//! This module provides the in-memory `LocationCache` and the `CacheStore`
//! that loads and persists it as a single JSON file. The cache is loaded
//! wholesale, mutated only by an update pass, and written back once per
//! pass with an atomic rename.

pub mod store;

pub use store::{CacheStore, LevelCounts, LocationCache};
