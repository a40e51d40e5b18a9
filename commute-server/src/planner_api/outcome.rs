//! Planner fetch outcomes.

use async_trait::async_trait;

use crate::journey::RawJourneyPayload;

use super::request::PlannerRequest;

/// Maximum number of body characters kept for diagnostics.
pub(crate) const BODY_SNIPPET_CHARS: usize = 500;

/// Result of asking the planner for a journey.
///
/// Only `Success` carries a payload worth caching. The other outcomes
/// are expected in normal operation and are handled per query.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The planner returned a journey plan.
    Success(RawJourneyPayload),

    /// The planner rejected the query (unknown station, unserviceable route).
    NoResults,

    /// The planner answered with something that is not a journey plan.
    Malformed { body: String },

    /// The request did not complete.
    Transport(TransportError),
}

impl FetchOutcome {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchOutcome::Success(_) => "success",
            FetchOutcome::NoResults => "no_results",
            FetchOutcome::Malformed { .. } => "malformed",
            FetchOutcome::Transport(_) => "transport",
        }
    }
}

/// Network-level failures talking to the planner.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Planner returned an unexpected error status
    #[error("planner returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// Source of planner responses.
///
/// Implemented by the HTTP client and by test doubles. Fetches are
/// independent: many may be in flight at once, and dropping one does not
/// affect the others.
#[async_trait]
pub trait JourneyFetcher: Send + Sync {
    async fn fetch(&self, request: &PlannerRequest) -> FetchOutcome;
}

/// Truncate a body for logging.
pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}
