//! Properties and the stations they are near.

use serde::{Deserialize, Serialize};

use super::station::StationCode;

/// A rental listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,

    /// (longitude, latitude)
    pub location: (f64, f64),

    pub address: String,

    /// Monthly rent in pounds
    pub price: i64,

    pub bedrooms: Option<i32>,

    pub bathrooms: Option<i32>,
}

/// A station that properties are grouped under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Station code, used as the journey origin
    pub id: StationCode,

    pub name: String,

    /// (longitude, latitude)
    pub location: (f64, f64),
}

/// All properties within range of one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyStationGroup {
    pub station: Station,
    pub properties: Vec<Property>,
}
