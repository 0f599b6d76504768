use crate::location::{IsoCodes, LocationKey};

/// What gets sent to the provider for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub country: Option<String>,
}

impl LocationQuery {
    pub fn from_key(key: &LocationKey) -> Self {
        Self {
            city: key.city_name().map(str::to_string),
            state_province: key.state_province().map(str::to_string),
            country: key.country().map(str::to_string),
        }
    }

    /// Free-text rendering, most specific part first.
    pub fn text(&self) -> String {
        [&self.city, &self.state_province, &self.country]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<&LocationKey> for LocationQuery {
    fn from(key: &LocationKey) -> Self {
        Self::from_key(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A successful provider answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Geocoded {
    pub coordinates: Coordinates,
    pub resolved_name: String,
    pub iso_codes: IsoCodes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_from_state_key() {
        let query = LocationQuery::from_key(&LocationKey::state(" Bavaria", "Germany"));
        assert_eq!(query.city, None);
        assert_eq!(query.text(), "bavaria, germany");
    }

    #[test]
    fn test_query_from_city_key() {
        let key = LocationKey::city("Quincy", Some("Washington"), "USA");
        assert_eq!(LocationQuery::from(&key).text(), "quincy, washington, usa");
    }
}
