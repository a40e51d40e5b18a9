//! Journey summary types derived from planner results.

use serde::{Deserialize, Serialize};

/// Which part of a round trip a fare covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FareDirection {
    /// Single fare for the outbound journey
    Outward,
    /// Single fare for the return journey
    Inward,
    /// Return fare covering both journeys
    Return,
}

impl FareDirection {
    /// Parse an upstream direction tag. Unknown tags yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OUTWARD" => Some(FareDirection::Outward),
            "INWARD" => Some(FareDirection::Inward),
            "RETURN" => Some(FareDirection::Return),
            _ => None,
        }
    }
}

/// A fare quoted by the planner.
///
/// Fares compare by price via [`FareQuote::cheapest`]; among equal prices the
/// first one seen wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareQuote {
    /// Price in pence
    pub price: i64,

    /// Fare type label (e.g. "Off-Peak Return")
    #[serde(rename = "type")]
    pub fare_type: String,

    /// Direction tag
    pub direction: FareDirection,
}

impl FareQuote {
    /// The cheapest fare, preferring the earliest among equal prices.
    pub fn cheapest<'a>(fares: impl IntoIterator<Item = &'a FareQuote>) -> Option<&'a FareQuote> {
        fares.into_iter().min_by_key(|f| f.price)
    }
}

/// Time statistics for one direction of travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyTimeStats {
    /// Shortest journey duration (minutes)
    pub fastest_time: i64,

    /// Mean journey duration, truncated (minutes)
    pub average_time: i64,

    /// Longest journey duration (minutes)
    pub slowest_time: i64,

    /// Fewest sub-legs in any journey
    pub least_changes: usize,

    /// Most sub-legs in any journey
    pub most_changes: usize,

    /// Shortest wait between paired departures (minutes)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shortest_wait: Option<i64>,

    /// Mean wait between paired departures, truncated (minutes)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub average_wait: Option<i64>,

    /// Longest wait between paired departures (minutes)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub longest_wait: Option<i64>,
}

/// Everything we report about a journey query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneySummary {
    /// Outbound statistics
    pub outbound: JourneyTimeStats,

    /// Return statistics, when a return was requested and found
    #[serde(rename = "return")]
    pub inbound: Option<JourneyTimeStats>,

    /// Cheapest outbound single, then cheapest inbound single if any
    pub cheapest_single: Option<Vec<FareQuote>>,

    /// Cheapest return fare
    pub cheapest_return: Option<FareQuote>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fare(price: i64, label: &str, direction: FareDirection) -> FareQuote {
        FareQuote {
            price,
            fare_type: label.to_string(),
            direction,
        }
    }

    #[test]
    fn direction_parse() {
        assert_eq!(FareDirection::parse("OUTWARD"), Some(FareDirection::Outward));
        assert_eq!(FareDirection::parse("INWARD"), Some(FareDirection::Inward));
        assert_eq!(FareDirection::parse("RETURN"), Some(FareDirection::Return));
        assert_eq!(FareDirection::parse("SEASON"), None);
    }

    #[test]
    fn cheapest_prefers_first_on_tie() {
        let fares = vec![
            fare(40, "Anytime", FareDirection::Outward),
            fare(30, "Off-Peak", FareDirection::Outward),
            fare(30, "Advance", FareDirection::Outward),
        ];
        assert_eq!(FareQuote::cheapest(&fares).unwrap().fare_type, "Off-Peak");
        let none: Vec<FareQuote> = Vec::new();
        assert!(FareQuote::cheapest(&none).is_none());
    }

    #[test]
    fn fare_serializes_with_type_key() {
        let json = serde_json::to_value(fare(20, "Off-Peak Return", FareDirection::Return)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"price": 20, "type": "Off-Peak Return", "direction": "RETURN"})
        );
    }

    #[test]
    fn stats_omit_absent_waits() {
        let stats = JourneyTimeStats {
            fastest_time: 45,
            average_time: 45,
            slowest_time: 45,
            least_changes: 1,
            most_changes: 1,
            shortest_wait: None,
            average_wait: None,
            longest_wait: None,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("shortest_wait").is_none());
        assert_eq!(json["fastest_time"], 45);
    }
}
