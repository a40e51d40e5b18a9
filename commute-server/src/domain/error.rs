//! Domain error types.
//!
//! These errors represent invalid query fields. They are distinct from
//! API/IO errors.

use super::station::InvalidStationCode;

/// A journey query could not be built from the given fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidQuery {
    /// Time was not `HH:MM` or `HH:MM:SS`
    #[error("invalid time: {0}")]
    Time(String),

    /// Anchor was not DEPART or ARRIVE
    #[error("invalid time type: {0} (expected DEPART or ARRIVE)")]
    Anchor(String),

    /// Day of week outside 0 (Sunday) to 6 (Saturday)
    #[error("invalid day of week: {0} (expected 0-6, Sunday = 0)")]
    DayOfWeek(u8),

    /// Railcard code was not alphanumeric
    #[error("invalid railcard code: {0}")]
    Railcard(String),

    /// Origin or destination code was invalid
    #[error(transparent)]
    Station(#[from] InvalidStationCode),
}
