//! Free-text location to coordinate lookup.
//!
//! This is a fixed substring table, not a geocoder: the first entry whose name
//! occurs in the lowercased input wins, and anything unmatched falls back to
//! the table's default coordinate.

use tracing::debug;

use crate::model::Coordinate;

const BUILTIN_CITIES: &[(&str, &str, &str)] = &[
    ("london", "51.5074", "0.1278"),
    ("new york", "40.7128", "-74.0060"),
    ("paris", "48.8566", "2.3522"),
    ("tokyo", "35.6895", "139.6917"),
    ("lahore", "31.5497", "74.3436"),
    ("karachi", "24.8607", "67.0011"),
    ("islamabad", "33.6844", "73.0479"),
];

const DEFAULT_LATITUDE: &str = "30.3753";
const DEFAULT_LONGITUDE: &str = "69.3451";

#[derive(Debug, Clone, PartialEq)]
pub struct CityTable {
    entries: Vec<(String, Coordinate)>,
    default: Coordinate,
}

impl Default for CityTable {
    fn default() -> Self {
        Self {
            entries: BUILTIN_CITIES
                .iter()
                .map(|(name, lat, lon)| (name.to_string(), Coordinate::new(*lat, *lon)))
                .collect(),
            default: Coordinate::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE),
        }
    }
}

impl CityTable {
    /// A table with no entries; every lookup yields `default`.
    pub fn empty(default: Coordinate) -> Self {
        Self {
            entries: Vec::new(),
            default,
        }
    }

    /// Append an entry. Earlier entries keep priority.
    pub fn with_city(mut self, name: &str, coordinate: Coordinate) -> Self {
        let name = name.trim().to_lowercase();
        if !name.is_empty() {
            self.entries.push((name, coordinate));
        }
        self
    }

    pub fn lookup(&self, location: &str) -> Option<&Coordinate> {
        let needle = location.to_lowercase();
        self.entries
            .iter()
            .find(|(name, _)| needle.contains(name.as_str()))
            .map(|(_, coordinate)| coordinate)
    }

    pub fn resolve(&self, location: &str) -> Coordinate {
        let coordinate = self.lookup(location).unwrap_or(&self.default).clone();
        debug!(
            location,
            latitude = %coordinate.latitude,
            longitude = %coordinate.longitude,
            "Geocoded location"
        );
        coordinate
    }
}
