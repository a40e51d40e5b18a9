//! In-memory property search.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::{Property, PropertyStationGroup, Station};

use super::{PropertyError, PropertyFilter, PropertySearch};

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in metres between two (longitude, latitude) points.
pub fn haversine_metres(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lon2, lat2) = (b.0.to_radians(), b.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Errors loading a property fixture file.
#[derive(Debug, thiserror::Error)]
pub enum FixtureLoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Fixture file contents: `{"stations": [...], "properties": [...]}`.
#[derive(Debug, Deserialize)]
struct Fixture {
    stations: Vec<Station>,
    #[serde(default)]
    properties: Vec<Property>,
}

/// Property search over listings held in memory.
///
/// Used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryPropertySearch {
    stations: RwLock<Vec<Station>>,
    properties: RwLock<Vec<Property>>,
}

impl MemoryPropertySearch {
    pub fn new(stations: Vec<Station>, properties: Vec<Property>) -> Self {
        Self {
            stations: RwLock::new(stations),
            properties: RwLock::new(properties),
        }
    }

    /// Load stations and properties from a JSON fixture file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FixtureLoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FixtureLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fixture: Fixture =
            serde_json::from_str(&json).map_err(|source| FixtureLoadError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(fixture.stations, fixture.properties))
    }

    /// Number of stations and properties held.
    pub async fn counts(&self) -> (usize, usize) {
        (
            self.stations.read().await.len(),
            self.properties.read().await.len(),
        )
    }

    pub async fn add_station(&self, station: Station) {
        self.stations.write().await.push(station);
    }

    pub async fn add_property(&self, property: Property) {
        self.properties.write().await.push(property);
    }
}

#[async_trait]
impl PropertySearch for MemoryPropertySearch {
    async fn find_near_stations(
        &self,
        filter: &PropertyFilter,
    ) -> Result<Vec<PropertyStationGroup>, PropertyError> {
        filter.validate()?;

        let mut stations = self.stations.read().await.clone();
        stations.sort_by(|a, b| a.id.cmp(&b.id));

        let properties = self.properties.read().await;
        let mut matching: Vec<&Property> = properties.iter().filter(|p| filter.accepts(p)).collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));

        let groups = stations
            .into_iter()
            .filter_map(|station| {
                let near: Vec<Property> = matching
                    .iter()
                    .filter(|p| {
                        haversine_metres(p.location, station.location)
                            <= filter.max_station_distance
                    })
                    .map(|p| (*p).clone())
                    .collect();

                (!near.is_empty()).then_some(PropertyStationGroup {
                    station,
                    properties: near,
                })
            })
            .collect();

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StationCode;

    const READING: (f64, f64) = (-0.9718, 51.4589);
    const TWYFORD: (f64, f64) = (-0.8632, 51.4755);

    fn station(code: &str, name: &str, location: (f64, f64)) -> Station {
        Station {
            id: StationCode::parse(code).unwrap(),
            name: name.to_string(),
            location,
        }
    }

    fn property(id: &str, location: (f64, f64), price: i64) -> Property {
        Property {
            id: id.to_string(),
            location,
            address: format!("{id} High Street"),
            price,
            bedrooms: Some(2),
            bathrooms: Some(1),
        }
    }

    fn offset_north(point: (f64, f64), metres: f64) -> (f64, f64) {
        (point.0, point.1 + metres / 111_200.0)
    }

    #[test]
    fn haversine_known_distance() {
        // Reading to Twyford is roughly 7.8 km
        let d = haversine_metres(READING, TWYFORD);
        assert!((7_500.0..8_100.0).contains(&d), "got {d}");
        assert_eq!(haversine_metres(READING, READING), 0.0);
    }

    #[tokio::test]
    async fn groups_by_station_within_distance() {
        let search = MemoryPropertySearch::new(
            vec![station("TWY", "Twyford", TWYFORD), station("RDG", "Reading", READING)],
            vec![
                property("a", offset_north(READING, 300.0), 1200),
                property("b", offset_north(TWYFORD, 500.0), 1100),
                property("c", offset_north(READING, 3_000.0), 900),
            ],
        );

        let groups = search
            .find_near_stations(&PropertyFilter::new(1500, 800.0))
            .await
            .unwrap();

        let codes: Vec<&str> = groups.iter().map(|g| g.station.id.as_str()).collect();
        assert_eq!(codes, vec!["RDG", "TWY"]);
        assert_eq!(groups[0].properties[0].id, "a");
        assert_eq!(groups[1].properties[0].id, "b");
    }

    #[tokio::test]
    async fn stations_without_matches_are_omitted() {
        let search = MemoryPropertySearch::new(
            vec![station("RDG", "Reading", READING), station("TWY", "Twyford", TWYFORD)],
            vec![property("a", offset_north(READING, 100.0), 2500)],
        );

        let groups = search
            .find_near_stations(&PropertyFilter::new(1500, 800.0))
            .await
            .unwrap();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn property_can_be_near_two_stations() {
        let east = (READING.0 + 0.005, READING.1);
        let search = MemoryPropertySearch::default();
        search.add_station(station("RDG", "Reading", READING)).await;
        search.add_station(station("RDW", "Reading West", east)).await;
        search.add_property(property("a", (READING.0 + 0.0025, READING.1), 1000)).await;

        let groups = search
            .find_near_stations(&PropertyFilter::new(1500, 500.0))
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[tokio::test]
    async fn loads_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        std::fs::write(
            &path,
            r#"{
                "stations": [{"id": "rdg", "name": "Reading", "location": [-0.9718, 51.4589]}],
                "properties": [{
                    "id": "a",
                    "location": [-0.9718, 51.4600],
                    "address": "1 Station Hill",
                    "price": 1200,
                    "bedrooms": 2,
                    "bathrooms": null
                }]
            }"#,
        )
        .unwrap();

        let search = MemoryPropertySearch::from_file(&path).unwrap();
        assert_eq!(search.counts().await, (1, 1));

        let groups = search
            .find_near_stations(&PropertyFilter::new(1500, 800.0))
            .await
            .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].station.id.as_str(), "RDG");
    }

    #[test]
    fn fixture_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = MemoryPropertySearch::from_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(FixtureLoadError::Io { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"stations": [{"id": "R-G"}]}"#).unwrap();
        assert!(matches!(
            MemoryPropertySearch::from_file(&bad),
            Err(FixtureLoadError::Json { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_filter_is_rejected() {
        let search = MemoryPropertySearch::default();
        let result = search.find_near_stations(&PropertyFilter::new(1500, -5.0)).await;
        assert!(matches!(result, Err(PropertyError::InvalidFilter(_))));
    }
}
