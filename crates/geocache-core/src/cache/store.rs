use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::location::{LocationKey, LocationLevel, LocationRecord};
use crate::utils::write_atomic;

/// On-disk layout. Records are written in key order so an unchanged cache
/// serializes to the same bytes every time.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    records: Vec<LocationRecord>,
}

/// Record counts per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub states: usize,
    pub cities: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationCache {
    updated_at: Option<DateTime<Utc>>,
    records: BTreeMap<LocationKey, LocationRecord>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: &LocationKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn lookup(&self, key: &LocationKey) -> Option<&LocationRecord> {
        self.records.get(key)
    }

    /// Add a record. Existing records are never replaced; returns false if
    /// the key is already cached.
    pub fn insert(&mut self, record: LocationRecord) -> bool {
        match self.records.entry(record.key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &LocationRecord> {
        self.records.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &LocationKey> {
        self.records.keys()
    }

    pub fn counts(&self) -> LevelCounts {
        self.records
            .keys()
            .fold(LevelCounts::default(), |mut counts, key| {
                match key.level() {
                    LocationLevel::State => counts.states += 1,
                    LocationLevel::City => counts.cities += 1,
                }
                counts
            })
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Stamp the cache as modified now.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.updated_at.map(|at| (Utc::now() - at).num_minutes())
    }

    /// Coarse age of the last update for log lines, e.g. "3h ago".
    pub fn age_display(&self) -> String {
        match self.age_minutes() {
            None => "never".to_string(),
            Some(m) if m < 1 => "just now".to_string(),
            Some(m) if m < 60 => format!("{}m ago", m),
            Some(m) if m < 24 * 60 => format!("{}h ago", m / 60),
            Some(m) => format!("{}d ago", m / (24 * 60)),
        }
    }

    fn from_file(file: CacheFile) -> Self {
        let mut cache = Self {
            updated_at: file.updated_at,
            records: BTreeMap::new(),
        };
        for record in file.records {
            let key = record.key.clone();
            if !cache.insert(record) {
                warn!(key = %key, "Duplicate key in cache file, keeping first record");
            }
        }
        cache
    }

    fn to_file(&self) -> CacheFile {
        CacheFile {
            updated_at: self.updated_at,
            records: self.records.values().cloned().collect(),
        }
    }
}

/// Loads and saves the location cache at a fixed path.
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache. A missing file is a cold start; an unreadable or
    /// corrupt one is logged and treated the same way.
    pub fn load(&self) -> LocationCache {
        match self.try_load() {
            Ok(Some(cache)) => {
                debug!(path = %self.path.display(), records = cache.len(), "Loaded location cache");
                cache
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No location cache yet, starting cold");
                LocationCache::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable location cache");
                LocationCache::new()
            }
        }
    }

    fn try_load(&self) -> Result<Option<LocationCache>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cache file: {}", self.path.display()))?;

        let file: CacheFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", self.path.display()))?;

        Ok(Some(LocationCache::from_file(file)))
    }

    /// Write the whole cache atomically.
    pub fn save(&self, cache: &LocationCache) -> Result<()> {
        let mut contents = serde_json::to_string_pretty(&cache.to_file())?;
        contents.push('\n');
        write_atomic(&self.path, contents.as_bytes())?;
        debug!(path = %self.path.display(), records = cache.len(), "Saved location cache");
        Ok(())
    }
}
