//! Journey planner payloads and their aggregation.
//!
//! The planner returns a large JSON document per query. We keep it opaque
//! ([`RawJourneyPayload`]) so that it can be cached verbatim, and only
//! deserialize the parts we need when deriving a [`JourneySummary`].
//!
//! [`JourneySummary`]: crate::domain::JourneySummary

mod aggregate;
mod payload;
mod types;

pub use aggregate::{AggregateError, aggregate, parse_duration_minutes};
pub use payload::RawJourneyPayload;
pub use types::{JourneyPlan, PlannedJourney, PlannerFare, ScheduledTimes, Timetable};
