//! Opaque planner payloads.

use serde::{Deserialize, Serialize};

use super::types::JourneyPlan;

/// A planner response body, kept as JSON so it can be cached as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawJourneyPayload(serde_json::Value);

impl RawJourneyPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Parse a payload from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s).map(Self)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Deserialize the parts of the payload that aggregation reads.
    pub fn plan(&self) -> Result<JourneyPlan, serde_json::Error> {
        JourneyPlan::deserialize(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_reads_wrapped_value() {
        let payload = RawJourneyPayload::from_json_str(
            r#"{"outwardJourneys": [], "extra": {"ignored": true}}"#,
        )
        .unwrap();
        let plan = payload.plan().unwrap();
        assert_eq!(plan.outward_journeys.unwrap().len(), 0);
    }

    #[test]
    fn non_plan_json_still_wraps() {
        let payload = RawJourneyPayload::from_json_str("[1, 2, 3]").unwrap();
        assert!(payload.plan().is_err());
        assert_eq!(payload.as_value(), &serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn serializes_transparently() {
        let payload = RawJourneyPayload::new(serde_json::json!({"a": 1}));
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#"{"a":1}"#);
    }
}
