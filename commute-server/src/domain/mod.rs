//! Domain types for the commute matcher.
//!
//! Types here enforce their invariants at construction time: station codes
//! are validated, and journey queries are normalized so that equal queries
//! share a cache entry.

mod error;
mod property;
mod query;
mod station;
mod summary;

pub use error::InvalidQuery;
pub use property::{Property, PropertyStationGroup, Station};
pub use query::{
    Anchor, DayOfWeek, JourneyProfile, JourneyQuery, TimeConstraint, parse_clock_time,
};
pub use station::{InvalidStationCode, StationCode};
pub use summary::{FareDirection, FareQuote, JourneySummary, JourneyTimeStats};
