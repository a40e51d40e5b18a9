//! Aggregation of planner payloads into journey summaries.
//!
//! For each direction we report duration and change-count extremes, and
//! wait-time extremes between paired departures. Departures are paired in
//! the order the planner lists them: (0, 1), (2, 3), and so on. A trailing
//! unpaired option does not contribute a wait.
//!
//! Averages are integer means truncated toward zero.

use chrono::{DateTime, NaiveDateTime};
use tracing::trace;

use crate::domain::{FareDirection, FareQuote, JourneySummary, JourneyTimeStats};

use super::payload::RawJourneyPayload;
use super::types::{JourneyPlan, PlannedJourney};

/// Scheduled timestamps as sent by the planner.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Errors deriving a summary from a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// A duration token was not digits followed by `h` or `m`
    #[error("invalid duration {duration:?}: bad token {token:?}")]
    Duration { duration: String, token: String },

    /// A scheduled departure could not be parsed
    #[error("invalid departure timestamp: {0}")]
    Departure(String),

    /// A statistic over the journeys does not fit in an `i64`
    #[error("{0} overflowed")]
    Overflow(&'static str),

    /// The payload does not have the shape of a journey plan
    #[error("payload is not a journey plan: {0}")]
    Shape(String),
}

/// Parse a planner duration such as `"1h 5m"` into minutes.
///
/// ```
/// use commute_server::journey::parse_duration_minutes;
///
/// assert_eq!(parse_duration_minutes("1h 5m").unwrap(), 65);
/// assert_eq!(parse_duration_minutes("45m").unwrap(), 45);
/// assert_eq!(parse_duration_minutes("2h").unwrap(), 120);
/// assert!(parse_duration_minutes("5").is_err());
/// ```
pub fn parse_duration_minutes(duration: &str) -> Result<i64, AggregateError> {
    let bad_token = |token: &str| AggregateError::Duration {
        duration: duration.to_string(),
        token: token.to_string(),
    };

    let mut total: i64 = 0;
    let mut tokens = 0;

    for token in duration.split_whitespace() {
        tokens += 1;

        let (digits, per_unit) = if let Some(d) = token.strip_suffix('h') {
            (d, 60)
        } else if let Some(d) = token.strip_suffix('m') {
            (d, 1)
        } else {
            return Err(bad_token(token));
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad_token(token));
        }

        let value: i64 = digits.parse().map_err(|_| bad_token(token))?;
        total = value
            .checked_mul(per_unit)
            .and_then(|mins| total.checked_add(mins))
            .ok_or_else(|| bad_token(token))?;
    }

    if tokens == 0 {
        return Err(bad_token(duration));
    }

    Ok(total)
}

fn parse_departure(s: &str) -> Result<NaiveDateTime, AggregateError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.naive_utc()))
        .map_err(|_| AggregateError::Departure(s.to_string()))
}

/// Integer mean truncated toward zero. `values` must be non-empty.
fn mean(values: &[i64], what: &'static str) -> Result<i64, AggregateError> {
    let total = values
        .iter()
        .try_fold(0i64, |acc, &v| acc.checked_add(v))
        .ok_or(AggregateError::Overflow(what))?;
    Ok(total / values.len() as i64)
}

/// Time statistics for one direction, or `None` if it has no journeys.
fn time_stats(journeys: &[PlannedJourney]) -> Result<Option<JourneyTimeStats>, AggregateError> {
    if journeys.is_empty() {
        return Ok(None);
    }

    let durations = journeys
        .iter()
        .map(|j| parse_duration_minutes(&j.duration))
        .collect::<Result<Vec<_>, _>>()?;

    let departures = journeys
        .iter()
        .map(|j| parse_departure(&j.timetable.scheduled.departure))
        .collect::<Result<Vec<_>, _>>()?;

    let changes: Vec<usize> = journeys.iter().map(|j| j.legs.len()).collect();

    let waits: Vec<i64> = departures
        .chunks_exact(2)
        .map(|pair| pair[1].signed_duration_since(pair[0]).num_minutes())
        .collect();

    let (shortest_wait, average_wait, longest_wait) = if waits.is_empty() {
        (None, None, None)
    } else {
        (
            waits.iter().min().copied(),
            Some(mean(&waits, "average wait")?),
            waits.iter().max().copied(),
        )
    };

    // Non-empty, so min/max exist
    Ok(Some(JourneyTimeStats {
        fastest_time: durations.iter().copied().min().unwrap_or_default(),
        average_time: mean(&durations, "average duration")?,
        slowest_time: durations.iter().copied().max().unwrap_or_default(),
        least_changes: changes.iter().copied().min().unwrap_or_default(),
        most_changes: changes.iter().copied().max().unwrap_or_default(),
        shortest_wait,
        average_wait,
        longest_wait,
    }))
}

/// Cheapest single fares and cheapest return fare.
///
/// Return-direction fares are only considered when a return is wanted.
fn fare_details(plan: &JourneyPlan, wants_return: bool) -> (Option<Vec<FareQuote>>, Option<FareQuote>) {
    let outward = plan.outward_journeys.as_deref().unwrap_or_default();
    let inward: &[PlannedJourney] = if wants_return {
        plan.inward_journeys.as_deref().unwrap_or_default()
    } else {
        &[]
    };

    let mut returns = Vec::new();
    let mut out_singles = Vec::new();
    let mut in_singles = Vec::new();

    for fare in outward.iter().chain(inward).flat_map(|j| &j.fares) {
        let Some(direction) = FareDirection::parse(&fare.direction) else {
            trace!(direction = %fare.direction, "Ignoring fare with unknown direction");
            continue;
        };
        let quote = FareQuote {
            price: fare.total_price,
            fare_type: fare.type_description.clone(),
            direction,
        };
        match direction {
            FareDirection::Return => returns.push(quote),
            FareDirection::Outward => out_singles.push(quote),
            FareDirection::Inward => in_singles.push(quote),
        }
    }

    let cheapest_return = FareQuote::cheapest(&returns).cloned();

    let cheapest_single = FareQuote::cheapest(&out_singles).map(|out| {
        let mut singles = vec![out.clone()];
        if let Some(inb) = FareQuote::cheapest(&in_singles) {
            singles.push(inb.clone());
        }
        singles
    });

    (cheapest_single, cheapest_return)
}

/// Summarize a planner payload.
///
/// Returns `Ok(None)` when there are no outbound journeys. Return statistics
/// are only computed when `wants_return` is set, and are `None` if the
/// planner found no return journeys.
pub fn aggregate(
    payload: &RawJourneyPayload,
    wants_return: bool,
) -> Result<Option<JourneySummary>, AggregateError> {
    let plan = payload
        .plan()
        .map_err(|e| AggregateError::Shape(e.to_string()))?;

    let Some(outbound) = time_stats(plan.outward_journeys.as_deref().unwrap_or_default())? else {
        return Ok(None);
    };

    let inbound = if wants_return {
        time_stats(plan.inward_journeys.as_deref().unwrap_or_default())?
    } else {
        None
    };

    let (cheapest_single, cheapest_return) = fare_details(&plan, wants_return);

    Ok(Some(JourneySummary {
        outbound,
        inbound,
        cheapest_single,
        cheapest_return,
    }))
}
