//! Location identity and geocoded records.
//!
//! A `LocationKey` is the normalized identity of a place the dashboard wants
//! to plot. Source spreadsheets spell the same place many ways ("California",
//! " california ", "CALIFORNIA"), so every text component is normalized on
//! construction and the derived `Eq`/`Ord`/`Hash` only ever see the
//! normalized form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geocode::Geocoded;
use crate::utils::normalize_place;

/// Granularity of a cached location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationLevel {
    State,
    City,
}

impl LocationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationLevel::State => "state",
            LocationLevel::City => "city",
        }
    }
}

impl fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a key as it appears on disk, before normalization.
#[derive(Debug, Deserialize)]
struct RawLocationKey {
    level: LocationLevel,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state_province: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl From<RawLocationKey> for LocationKey {
    fn from(raw: RawLocationKey) -> Self {
        LocationKey::new(
            raw.level,
            raw.city.as_deref(),
            raw.state_province.as_deref(),
            raw.country.as_deref(),
        )
    }
}

/// Normalized identity of a geographic entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawLocationKey")]
pub struct LocationKey {
    level: LocationLevel,
    city: Option<String>,
    state_province: Option<String>,
    country: Option<String>,
}

impl LocationKey {
    /// Build a key, normalizing every component.
    /// State-level keys never carry a city.
    pub fn new(
        level: LocationLevel,
        city: Option<&str>,
        state_province: Option<&str>,
        country: Option<&str>,
    ) -> Self {
        let city = match level {
            LocationLevel::State => None,
            LocationLevel::City => city.and_then(normalize_place),
        };
        Self {
            level,
            city,
            state_province: state_province.and_then(normalize_place),
            country: country.and_then(normalize_place),
        }
    }

    pub fn state(state_province: &str, country: &str) -> Self {
        Self::new(LocationLevel::State, None, Some(state_province), Some(country))
    }

    pub fn city(city: &str, state_province: Option<&str>, country: &str) -> Self {
        Self::new(LocationLevel::City, Some(city), state_province, Some(country))
    }

    pub fn level(&self) -> LocationLevel {
        self.level
    }

    pub fn city_name(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn state_province(&self) -> Option<&str> {
        self.state_province.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// True when the fields the level needs are present.
    /// State keys need state/province and country; city keys need city and country.
    pub fn is_complete(&self) -> bool {
        let named = match self.level {
            LocationLevel::State => self.state_province.is_some(),
            LocationLevel::City => self.city.is_some(),
        };
        named && self.country.is_some()
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [
            self.city.as_deref(),
            self.state_province.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        write!(f, "{} [{}]", parts.join(", "), self.level)
    }
}

/// ISO 3166 codes reported by the provider for a location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsoCodes {
    #[serde(default)]
    pub country_iso: Option<String>,
    #[serde(default)]
    pub state_iso: Option<String>,
}

/// A geocoded location. Written once per key and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(flatten)]
    pub key: LocationKey,
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_name: String,
    #[serde(flatten)]
    pub iso_codes: IsoCodes,
}

impl LocationRecord {
    pub fn new(key: LocationKey, geocoded: Geocoded) -> Self {
        Self {
            key,
            latitude: geocoded.coordinates.latitude,
            longitude: geocoded.coordinates.longitude,
            resolved_name: geocoded.resolved_name,
            iso_codes: geocoded.iso_codes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::Coordinates;
    use std::collections::HashSet;

    #[test]
    fn test_key_normalizes_case_and_whitespace() {
        let a = LocationKey::state("California", "USA");
        let b = LocationKey::state("  california ", "usa");
        let c = LocationKey::state("CALIFORNIA", "  U S A ");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_eq!(a.state_province(), Some("california"));
        assert_eq!(a.country(), Some("usa"));
    }

    #[test]
    fn test_state_key_drops_city() {
        let key = LocationKey::new(
            LocationLevel::State,
            Some("San Jose"),
            Some("California"),
            Some("USA"),
        );
        assert_eq!(key.city_name(), None);
        assert_eq!(key, LocationKey::state("California", "USA"));
    }

    #[test]
    fn test_city_key_keeps_optional_state() {
        let with_state = LocationKey::city("San  Jose", Some("California"), "USA");
        let without_state = LocationKey::city("San Jose", None, "USA");
        assert_eq!(with_state.city_name(), Some("san jose"));
        assert_ne!(with_state, without_state);
        assert!(without_state.is_complete());
    }

    #[test]
    fn test_is_complete() {
        assert!(LocationKey::state("Texas", "USA").is_complete());
        assert!(!LocationKey::state("  ", "USA").is_complete());
        assert!(!LocationKey::new(LocationLevel::City, None, Some("Texas"), Some("USA")).is_complete());
        assert!(!LocationKey::new(LocationLevel::State, None, Some("Texas"), None).is_complete());
    }

    #[test]
    fn test_levels_are_distinct_keys() {
        let state = LocationKey::new(LocationLevel::State, None, Some("Texas"), Some("USA"));
        let city = LocationKey::new(LocationLevel::City, None, Some("Texas"), Some("USA"));
        assert_ne!(state, city);
    }

    #[test]
    fn test_display() {
        let key = LocationKey::city("Dublin", None, "Ireland");
        assert_eq!(key.to_string(), "dublin, ireland [city]");
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = LocationRecord::new(
            LocationKey::city("Ashburn", Some("Virginia"), "USA"),
            Geocoded {
                coordinates: Coordinates {
                    latitude: 39.0437,
                    longitude: -77.4875,
                },
                resolved_name: "Ashburn, Loudoun County, Virginia, United States".to_string(),
                iso_codes: IsoCodes {
                    country_iso: Some("US".to_string()),
                    state_iso: Some("US-VA".to_string()),
                },
            },
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["level"], "city");
        assert_eq!(value["city"], "ashburn");
        assert_eq!(value["state_province"], "virginia");
        assert_eq!(value["country"], "usa");
        assert_eq!(value["latitude"], 39.0437);
        assert_eq!(value["state_iso"], "US-VA");

        let back: LocationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_deserialize_normalizes_hand_edited_keys() {
        let json = r#"{
            "level": "state",
            "city": "ignored",
            "state_province": " Ontario ",
            "country": "Canada",
            "latitude": 50.0,
            "longitude": -85.0,
            "resolved_name": "Ontario, Canada",
            "country_iso": "CA",
            "state_iso": null
        }"#;
        let record: LocationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.key, LocationKey::state("ontario", "canada"));
        assert_eq!(record.iso_codes.state_iso, None);
    }
}
