//! Journey query types.
//!
//! A [`JourneyQuery`] is the unit of work for the planner and the identity
//! of a cache entry. Its fields are normalized at construction so that two
//! queries asking the same thing compare equal.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::error::InvalidQuery;
use super::station::StationCode;

/// Whether a time constrains departure or arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Anchor {
    Depart,
    Arrive,
}

impl Anchor {
    /// Wire name used by the upstream planner and the cache table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::Depart => "DEPART",
            Anchor::Arrive => "ARRIVE",
        }
    }

    /// Parse a wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEPART" => Some(Anchor::Depart),
            "ARRIVE" => Some(Anchor::Arrive),
            _ => None,
        }
    }
}

/// Desired day of travel, numbered from Sunday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DayOfWeek {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayOfWeek {
    const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sun,
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
    ];

    /// Day number, Sunday = 0 through Saturday = 6.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Look up a day by number.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// The weekday of a calendar date.
    pub fn of(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }

    /// The next date falling on this day, strictly after `today`.
    ///
    /// If `today` is already this day (or later in the Sunday-first week),
    /// the result is in the following week.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use commute_server::domain::DayOfWeek;
    ///
    /// // 2024-03-13 is a Wednesday
    /// let wed = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
    /// assert_eq!(DayOfWeek::Fri.next_after(wed), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    /// assert_eq!(DayOfWeek::Wed.next_after(wed), NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
    /// assert_eq!(DayOfWeek::Mon.next_after(wed), NaiveDate::from_ymd_opt(2024, 3, 18).unwrap());
    /// ```
    pub fn next_after(self, today: NaiveDate) -> NaiveDate {
        let current = i64::from(Self::of(today).index());
        let target = i64::from(self.index());
        let days = if current < target {
            target - current
        } else {
            7 - current + target
        };
        today + chrono::Duration::days(days)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        Self::ALL[day.num_days_from_sunday() as usize]
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = InvalidQuery;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or(InvalidQuery::DayOfWeek(index))
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.index()
    }
}

/// A time of day and whether it is a departure or arrival constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeConstraint {
    pub time: NaiveTime,
    pub anchor: Anchor,
}

impl TimeConstraint {
    pub fn new(time: NaiveTime, anchor: Anchor) -> Self {
        Self { time, anchor }
    }

    /// Time formatted as `HH:MM:SS`.
    pub fn time_str(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

/// The parts of a journey query shared by every origin in a match search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JourneyProfile {
    /// Outbound time constraint.
    pub outbound: TimeConstraint,

    /// Return time constraint, if a return journey is wanted.
    pub inbound: Option<TimeConstraint>,

    /// Desired travel day.
    pub day_of_week: DayOfWeek,

    /// Railcard code, upper case.
    pub railcard: Option<String>,
}

impl JourneyProfile {
    /// Build a profile from request fields.
    ///
    /// A return anchor without a return time is ignored. A return time
    /// without an anchor is treated as a departure.
    pub fn new(
        outbound: TimeConstraint,
        return_time: Option<NaiveTime>,
        return_anchor: Option<Anchor>,
        day_of_week: DayOfWeek,
        railcard: Option<&str>,
    ) -> Result<Self, InvalidQuery> {
        let inbound = return_time
            .map(|time| TimeConstraint::new(time, return_anchor.unwrap_or(Anchor::Depart)));

        let railcard = match railcard.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) if r.len() <= 8 && r.bytes().all(|b| b.is_ascii_alphanumeric()) => {
                Some(r.to_ascii_uppercase())
            }
            Some(r) => return Err(InvalidQuery::Railcard(r.to_string())),
            None => None,
        };

        Ok(Self {
            outbound,
            inbound,
            day_of_week,
            railcard,
        })
    }

    /// Whether a return journey is requested.
    pub fn wants_return(&self) -> bool {
        self.inbound.is_some()
    }
}

/// A journey to look up: origin, destination and the shared profile.
///
/// Equality and hashing cover every field; this is the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JourneyQuery {
    pub origin: StationCode,
    pub destination: StationCode,
    pub profile: JourneyProfile,
}

impl JourneyQuery {
    pub fn new(origin: StationCode, destination: StationCode, profile: JourneyProfile) -> Self {
        Self {
            origin,
            destination,
            profile,
        }
    }

    /// Whether a return journey is requested.
    pub fn wants_return(&self) -> bool {
        self.profile.wants_return()
    }
}

impl fmt::Display for JourneyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} {}",
            self.origin,
            self.destination,
            self.profile.outbound.anchor.as_str(),
            self.profile.outbound.time_str()
        )?;
        if let Some(inbound) = &self.profile.inbound {
            write!(f, ", return {} {}", inbound.anchor.as_str(), inbound.time_str())?;
        }
        write!(f, ", day {})", self.profile.day_of_week.index())
    }
}

/// Parse a clock time given as `HH:MM:SS` or `HH:MM`.
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, InvalidQuery> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| InvalidQuery::Time(s.to_string()))
}
