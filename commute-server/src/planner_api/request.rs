//! Journey planner request bodies.
//!
//! The planner has no notion of a "day of week": it wants a concrete
//! travel date. We pick the next occurrence of the query's day after
//! `today`, which the caller supplies so that request building stays
//! deterministic.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Anchor, JourneyQuery, StationCode, TimeConstraint};

/// Request body for the planner's journey search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerRequest {
    pub origin: PlannerLocation,
    pub destination: PlannerLocation,
    pub outward_time: TravelTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inward_time: Option<TravelTime>,
    pub fare_request_details: FareRequestDetails,
    pub direct_trains: bool,
    pub reduced_transfer_time: bool,
    pub only_search_for_sleeper: bool,
    pub overtaken_trains: bool,
    pub use_alternative_services: bool,
    pub increased_interchange: String,
}

/// A station or station group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannerLocation {
    pub crs: String,
    pub group: bool,
}

impl From<&StationCode> for PlannerLocation {
    fn from(code: &StationCode) -> Self {
        Self {
            crs: code.as_str().to_string(),
            group: code.is_group(),
        }
    }
}

/// A travel time and whether it is a departure or arrival constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelTime {
    /// `YYYY-MM-DDTHH:MM:SSZ`
    pub travel_time: String,
    #[serde(rename = "type")]
    pub anchor: Anchor,
}

impl TravelTime {
    fn on(date: NaiveDate, constraint: &TimeConstraint) -> Self {
        Self {
            travel_time: format!("{}T{}Z", date.format("%Y-%m-%d"), constraint.time_str()),
            anchor: constraint.anchor,
        }
    }
}

/// Passenger and railcard details for fare lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FareRequestDetails {
    pub passengers: Passengers,
    pub fare_class: String,
    pub railcards: Vec<RailcardRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passengers {
    pub adult: u8,
    pub child: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RailcardRequest {
    pub code: String,
    pub count: u8,
}

/// Build the planner request for a query.
///
/// The travel date is the next `query.profile.day_of_week` strictly after
/// `today`. Both outward and inward times are on that date.
pub fn build_request(query: &JourneyQuery, today: NaiveDate) -> PlannerRequest {
    let date = query.profile.day_of_week.next_after(today);

    let railcards = query
        .profile
        .railcard
        .iter()
        .map(|code| RailcardRequest {
            code: code.clone(),
            count: 1,
        })
        .collect();

    PlannerRequest {
        origin: PlannerLocation::from(&query.origin),
        destination: PlannerLocation::from(&query.destination),
        outward_time: TravelTime::on(date, &query.profile.outbound),
        inward_time: query
            .profile
            .inbound
            .as_ref()
            .map(|inbound| TravelTime::on(date, inbound)),
        fare_request_details: FareRequestDetails {
            passengers: Passengers { adult: 1, child: 0 },
            fare_class: "ANY".to_string(),
            railcards,
        },
        direct_trains: false,
        reduced_transfer_time: false,
        only_search_for_sleeper: false,
        overtaken_trains: true,
        use_alternative_services: false,
        increased_interchange: "ZERO".to_string(),
    }
}
