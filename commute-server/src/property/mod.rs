//! Property search near stations.
//!
//! A [`PropertySearch`] finds listings matching a [`PropertyFilter`] and
//! groups them under every station within walking distance. A property near
//! two stations appears in both groups.

mod memory;
mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Property, PropertyStationGroup};

pub use memory::{FixtureLoadError, MemoryPropertySearch};
pub use postgres::PgPropertySearch;

/// Errors from a property search backend.
#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    #[error("property database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

/// Listing filter.
///
/// Bounds are inclusive. `max_station_distance` is in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    #[serde(default)]
    pub min_price: Option<i64>,
    pub max_price: i64,
    #[serde(default)]
    pub min_bedrooms: Option<i32>,
    #[serde(default)]
    pub max_bedrooms: Option<i32>,
    #[serde(default)]
    pub min_bathrooms: Option<i32>,
    #[serde(default)]
    pub max_bathrooms: Option<i32>,
    pub max_station_distance: f64,
}

impl PropertyFilter {
    pub fn new(max_price: i64, max_station_distance: f64) -> Self {
        Self {
            min_price: None,
            max_price,
            min_bedrooms: None,
            max_bedrooms: None,
            min_bathrooms: None,
            max_bathrooms: None,
            max_station_distance,
        }
    }

    pub fn with_min_price(mut self, min_price: i64) -> Self {
        self.min_price = Some(min_price);
        self
    }

    pub fn with_bedrooms(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.min_bedrooms = min;
        self.max_bedrooms = max;
        self
    }

    pub fn with_bathrooms(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.min_bathrooms = min;
        self.max_bathrooms = max;
        self
    }

    /// Reject filters no listing could satisfy.
    pub fn validate(&self) -> Result<(), PropertyError> {
        if !self.max_station_distance.is_finite() || self.max_station_distance < 0.0 {
            return Err(PropertyError::InvalidFilter(format!(
                "max_station_distance must be a non-negative number, got {}",
                self.max_station_distance
            )));
        }
        if self.min_price.is_some_and(|min| min > self.max_price) {
            return Err(PropertyError::InvalidFilter(
                "min_price exceeds max_price".to_string(),
            ));
        }
        for (field, min, max) in [
            ("bedrooms", self.min_bedrooms, self.max_bedrooms),
            ("bathrooms", self.min_bathrooms, self.max_bathrooms),
        ] {
            if min.zip(max).is_some_and(|(min, max)| min > max) {
                return Err(PropertyError::InvalidFilter(format!(
                    "min_{field} exceeds max_{field}"
                )));
            }
        }
        Ok(())
    }

    /// Whether a listing passes the price, bedroom and bathroom bounds.
    ///
    /// A listing with unknown bedrooms or bathrooms fails any bound on that
    /// field.
    pub fn accepts(&self, property: &Property) -> bool {
        fn within(value: Option<i32>, min: Option<i32>, max: Option<i32>) -> bool {
            match value {
                Some(v) => min.is_none_or(|m| v >= m) && max.is_none_or(|m| v <= m),
                None => min.is_none() && max.is_none(),
            }
        }

        property.price <= self.max_price
            && self.min_price.is_none_or(|m| property.price >= m)
            && within(property.bedrooms, self.min_bedrooms, self.max_bedrooms)
            && within(property.bathrooms, self.min_bathrooms, self.max_bathrooms)
    }
}

/// Finds properties grouped by nearby station.
#[async_trait]
pub trait PropertySearch: Send + Sync {
    /// Groups are ordered by station code and contain at least one property.
    async fn find_near_stations(
        &self,
        filter: &PropertyFilter,
    ) -> Result<Vec<PropertyStationGroup>, PropertyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(price: i64, bedrooms: Option<i32>, bathrooms: Option<i32>) -> Property {
        Property {
            id: "p1".to_string(),
            location: (-0.97, 51.45),
            address: "1 Station Road".to_string(),
            price,
            bedrooms,
            bathrooms,
        }
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let filter = PropertyFilter::new(1500, 800.0).with_min_price(1000);
        assert!(filter.accepts(&flat(1000, None, None)));
        assert!(filter.accepts(&flat(1500, None, None)));
        assert!(!filter.accepts(&flat(999, None, None)));
        assert!(!filter.accepts(&flat(1501, None, None)));
    }

    #[test]
    fn room_bounds() {
        let filter = PropertyFilter::new(2000, 800.0).with_bedrooms(Some(2), Some(3));
        assert!(filter.accepts(&flat(1200, Some(2), None)));
        assert!(!filter.accepts(&flat(1200, Some(1), None)));
        assert!(!filter.accepts(&flat(1200, Some(4), None)));
        assert!(!filter.accepts(&flat(1200, None, None)));
    }

    #[test]
    fn bathroom_bounds() {
        let filter = PropertyFilter::new(2000, 800.0).with_bathrooms(Some(2), None);
        assert!(filter.accepts(&flat(1200, Some(3), Some(2))));
        assert!(!filter.accepts(&flat(1200, Some(3), Some(1))));
        assert!(!filter.accepts(&flat(1200, Some(3), None)));
    }

    #[test]
    fn inverted_room_ranges_are_rejected() {
        let bedrooms = PropertyFilter::new(2000, 800.0).with_bedrooms(Some(3), Some(2));
        assert!(matches!(
            bedrooms.validate(),
            Err(PropertyError::InvalidFilter(msg)) if msg == "min_bedrooms exceeds max_bedrooms"
        ));

        let bathrooms = PropertyFilter::new(2000, 800.0).with_bathrooms(Some(2), Some(1));
        assert!(bathrooms.validate().is_err());
    }

    #[test]
    fn unknown_rooms_pass_without_bounds() {
        let filter = PropertyFilter::new(2000, 800.0);
        assert!(filter.accepts(&flat(1200, None, None)));
    }

    #[test]
    fn validate_rejects_bad_filters() {
        assert!(PropertyFilter::new(1000, 800.0).validate().is_ok());
        assert!(PropertyFilter::new(1000, -1.0).validate().is_err());
        assert!(PropertyFilter::new(1000, f64::NAN).validate().is_err());
        assert!(
            PropertyFilter::new(1000, 800.0)
                .with_min_price(2000)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn deserialize_minimal_filter() {
        let filter: PropertyFilter =
            serde_json::from_str(r#"{"max_price": 1500, "max_station_distance": 1000}"#).unwrap();
        assert_eq!(filter, PropertyFilter::new(1500, 1000.0));
    }
}
