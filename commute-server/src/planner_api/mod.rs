//! National Rail journey planner client.
//!
//! This module builds journey search requests from [`JourneyQuery`] values,
//! posts them to the planner, and classifies the responses.
//!
//! Key characteristics of the planner:
//! - Searches are for a concrete date; we derive it from the query's day
//!   of week and a caller-supplied "today"
//! - Numeric codes denote station groups (e.g. `182` = any London station)
//! - A 400 response means the route cannot be served, not a client bug
//!
//! [`JourneyQuery`]: crate::domain::JourneyQuery

mod client;
mod mock;
mod outcome;
mod request;

pub use client::{JourneyPlannerClient, PlannerApiConfig, classify};
pub use mock::{MockJourneyFetcher, MockLoadError};
pub use outcome::{FetchOutcome, JourneyFetcher, TransportError};
pub use request::{
    FareRequestDetails, Passengers, PlannerLocation, PlannerRequest, RailcardRequest, TravelTime,
    build_request,
};
