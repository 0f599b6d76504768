//! The update pass: geocode what the dataset mentions but the cache lacks.
//!
//! A pass is an offline batch job. Keys are geocoded one at a time; a key
//! that fails is logged and skipped, never retried within the pass. Because
//! failures are not written to the cache they are picked up again by the
//! next pass. The cache is persisted exactly once, after every key has been
//! tried.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, LocationCache};
use crate::dataset::{row_value, ColumnMapping, DataTable, Row};
use crate::geocode::{Geocoder, LocationQuery};
use crate::location::{LocationKey, LocationLevel, LocationRecord};

/// Outcome of one pass at one level.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub level: LocationLevel,
    /// Distinct keys found in the dataset.
    pub distinct_keys: usize,
    /// Of those, how many were already cached.
    pub already_cached: usize,
    pub new_records: usize,
    /// Keys the provider could not resolve this time.
    pub unresolved: Vec<LocationKey>,
    /// Rows dropped for missing location fields, plus records the loader
    /// could not decode.
    pub skipped_rows: usize,
}

/// Project one row to its key at `level`, or None if a required field is blank.
pub fn project_key(row: &Row, level: LocationLevel, columns: &ColumnMapping) -> Option<LocationKey> {
    let country = row_value(row, &columns.country)?;
    let state = row_value(row, &columns.state_province);
    let key = match level {
        LocationLevel::State => LocationKey::state(state?, country),
        LocationLevel::City => LocationKey::city(row_value(row, &columns.city)?, state, country),
    };
    key.is_complete().then_some(key)
}

/// Distinct keys in the table plus the number of rows that produced none.
pub fn distinct_keys(
    table: &DataTable,
    level: LocationLevel,
    columns: &ColumnMapping,
) -> (BTreeSet<LocationKey>, usize) {
    let mut keys = BTreeSet::new();
    let mut skipped = 0;
    for row in table.rows() {
        match project_key(row, level, columns) {
            Some(key) => {
                keys.insert(key);
            }
            None => skipped += 1,
        }
    }
    (keys, skipped)
}

pub async fn run_update_pass<G: Geocoder>(
    store: &CacheStore,
    cache: &mut LocationCache,
    table: &DataTable,
    level: LocationLevel,
    columns: &ColumnMapping,
    geocoder: &G,
) -> Result<UpdateReport> {
    let (keys, incomplete_rows) = distinct_keys(table, level, columns);
    let skipped_rows = incomplete_rows + table.undecodable();
    if skipped_rows > 0 {
        debug!(level = %level, skipped_rows, "Rows without a usable location were excluded");
    }

    let missing: Vec<LocationKey> = keys.iter().filter(|k| !cache.contains(k)).cloned().collect();
    info!(
        level = %level,
        distinct = keys.len(),
        missing = missing.len(),
        "Starting update pass"
    );

    let mut new_records = 0;
    let mut unresolved = Vec::new();

    for (i, key) in missing.iter().enumerate() {
        debug!(level = %level, key = %key, progress = i + 1, total = missing.len(), "Geocoding");
        match geocoder.geocode(&LocationQuery::from_key(key)).await {
            Ok(Some(geocoded)) => {
                if cache.insert(LocationRecord::new(key.clone(), geocoded)) {
                    new_records += 1;
                }
            }
            Ok(None) => {
                warn!(key = %key, "No geocoding result, skipping");
                unresolved.push(key.clone());
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Geocoding failed, skipping");
                unresolved.push(key.clone());
            }
        }
    }

    if new_records > 0 {
        cache.touch();
    }
    store
        .save(cache)
        .with_context(|| format!("Failed to persist {} records", level))?;

    let report = UpdateReport {
        level,
        distinct_keys: keys.len(),
        already_cached: keys.len() - missing.len(),
        new_records,
        unresolved,
        skipped_rows,
    };
    info!(
        level = %level,
        new_records = report.new_records,
        unresolved = report.unresolved.len(),
        "Update pass complete"
    );
    Ok(report)
}
