//! Station code types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum length of a station or station-group code.
const MAX_CODE_LEN: usize = 8;

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// A station identifier accepted by the journey planner.
///
/// Usually a 3-letter CRS code (`KGX`), but the planner also accepts numeric
/// station-group codes such as `182` ("any London station"). Codes are
/// 1 to 8 ASCII alphanumeric characters and are stored upper case.
///
/// # Examples
///
/// ```
/// use commute_server::domain::StationCode;
///
/// let kgx = StationCode::parse("KGX").unwrap();
/// assert_eq!(kgx.as_str(), "KGX");
/// assert!(!kgx.is_group());
///
/// let london = StationCode::parse("182").unwrap();
/// assert!(london.is_group());
///
/// // Lowercase is normalized
/// assert_eq!(StationCode::parse("pad").unwrap().as_str(), "PAD");
///
/// assert!(StationCode::parse("").is_err());
/// assert!(StationCode::parse("K-X").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationCode(String);

impl StationCode {
    /// Parse a station code, normalizing to upper case.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let s = s.trim();

        if s.is_empty() {
            return Err(InvalidStationCode {
                reason: "must not be empty",
            });
        }

        if s.len() > MAX_CODE_LEN {
            return Err(InvalidStationCode {
                reason: "must be at most 8 characters",
            });
        }

        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(InvalidStationCode {
                reason: "must be ASCII letters or digits",
            });
        }

        Ok(StationCode(s.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the planner should treat this code as a station group.
    ///
    /// All-digit codes are assumed to be groups. A numeric CRS code for an
    /// individual station would be misclassified.
    pub fn is_group(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.0)
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StationCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        StationCode::parse(&raw).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any alphanumeric code of valid length parses to its upper-case form
        #[test]
        fn valid_always_parses(s in "[A-Za-z0-9]{1,8}") {
            let code = StationCode::parse(&s).unwrap();
            prop_assert_eq!(code.as_str(), s.to_ascii_uppercase());
        }

        /// Only all-digit codes are groups
        #[test]
        fn digits_are_groups(s in "[0-9]{1,8}") {
            prop_assert!(StationCode::parse(&s).unwrap().is_group());
        }

        /// Overlong codes are rejected
        #[test]
        fn overlong_rejected(s in "[A-Z]{9,16}") {
            prop_assert!(StationCode::parse(&s).is_err());
        }
    }
}
