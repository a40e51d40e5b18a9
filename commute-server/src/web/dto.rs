//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Anchor, DayOfWeek, InvalidQuery, JourneyProfile, JourneyQuery, PropertyStationGroup,
    StationCode, TimeConstraint, parse_clock_time,
};
use crate::matching::{MatchRequest, MatchResult};
use crate::property::PropertyFilter;

/// Commute profile fields shared by the search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRequest {
    /// Outbound time, `HH:MM` or `HH:MM:SS`
    pub start_time: String,

    /// `DEPART` or `ARRIVE`
    pub start_type: String,

    /// Return time; omit for a single journey
    #[serde(default)]
    pub return_time: Option<String>,

    /// `DEPART` or `ARRIVE`; defaults to `DEPART` when a return time is set
    #[serde(default)]
    pub return_type: Option<String>,

    /// 0 (Sunday) to 6 (Saturday)
    pub day_of_week: u8,

    /// Railcard code, e.g. "YNG"
    #[serde(default)]
    pub rail_card: Option<String>,
}

fn parse_anchor(s: &str) -> Result<Anchor, InvalidQuery> {
    Anchor::parse(&s.trim().to_ascii_uppercase()).ok_or_else(|| InvalidQuery::Anchor(s.to_string()))
}

impl ProfileRequest {
    /// Validate the fields and build a journey profile.
    pub fn to_profile(&self) -> Result<JourneyProfile, InvalidQuery> {
        let outbound = TimeConstraint::new(
            parse_clock_time(&self.start_time)?,
            parse_anchor(&self.start_type)?,
        );

        let return_time = self
            .return_time
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(parse_clock_time)
            .transpose()?;

        // An anchor is only meaningful alongside a return time
        let return_anchor = match (&return_time, self.return_type.as_deref()) {
            (Some(_), Some(t)) if !t.trim().is_empty() => Some(parse_anchor(t)?),
            _ => None,
        };

        let day = DayOfWeek::from_index(self.day_of_week)
            .ok_or(InvalidQuery::DayOfWeek(self.day_of_week))?;

        JourneyProfile::new(
            outbound,
            return_time,
            return_anchor,
            day,
            self.rail_card.as_deref(),
        )
    }
}

/// Request to find properties near stations with an acceptable commute.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSearchRequest {
    pub filters: PropertyFilter,

    #[serde(flatten)]
    pub profile: ProfileRequest,

    /// Commute destination station or group code
    pub destination: String,

    /// Longest acceptable fastest journey, in minutes
    pub max_journey_time: i64,
}

impl MatchingSearchRequest {
    pub fn to_match_request(&self) -> Result<MatchRequest, InvalidQuery> {
        Ok(MatchRequest {
            filter: self.filters.clone(),
            profile: self.profile.to_profile()?,
            destination: StationCode::parse(&self.destination)?,
            max_journey_minutes: self.max_journey_time,
        })
    }
}

/// Matching stations and their properties.
#[derive(Debug, Serialize)]
pub struct MatchingSearchResponse {
    pub results: Vec<MatchResult>,
}

/// Properties grouped by nearby station.
#[derive(Debug, Serialize)]
pub struct NearStationsResponse {
    pub results: Vec<PropertyStationGroup>,
}

/// Request for a single journey summary.
#[derive(Debug, Clone, Deserialize)]
pub struct JourneySearchRequest {
    pub origin: String,

    pub destination: String,

    #[serde(flatten)]
    pub profile: ProfileRequest,
}

impl JourneySearchRequest {
    pub fn to_query(&self) -> Result<JourneyQuery, InvalidQuery> {
        Ok(JourneyQuery::new(
            StationCode::parse(&self.origin)?,
            StationCode::parse(&self.destination)?,
            self.profile.to_profile()?,
        ))
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
