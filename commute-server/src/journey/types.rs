//! Journey planner response DTOs.
//!
//! These map the subset of the planner's JSON response that aggregation
//! reads. Everything else in the document is ignored. Direction lists use
//! `Option` because the planner omits `inwardJourneys` for single queries.

use serde::Deserialize;
use serde::de::IgnoredAny;

/// Top-level planner response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyPlan {
    /// Outbound journey options.
    pub outward_journeys: Option<Vec<PlannedJourney>>,

    /// Return journey options.
    pub inward_journeys: Option<Vec<PlannedJourney>>,
}

/// One journey option in a direction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedJourney {
    /// Human-readable duration, e.g. "1h 5m".
    pub duration: String,

    /// Scheduled and real-time timings.
    pub timetable: Timetable,

    /// Physical segments (trains, walks, transfers). Only counted.
    #[serde(default)]
    pub legs: Vec<IgnoredAny>,

    /// Fares quoted for this option.
    #[serde(default)]
    pub fares: Vec<PlannerFare>,
}

/// Journey timings.
#[derive(Debug, Clone, Deserialize)]
pub struct Timetable {
    pub scheduled: ScheduledTimes,
}

/// Scheduled timings, as `YYYY-MM-DDTHH:MM:SSZ`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledTimes {
    pub departure: String,
    pub arrival: Option<String>,
}

/// A fare attached to a journey option.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerFare {
    /// Price in pence.
    pub total_price: i64,

    /// Fare type label.
    pub type_description: String,

    /// "OUTWARD", "INWARD" or "RETURN".
    pub direction: String,
}
