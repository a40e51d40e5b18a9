//! Journey planner HTTP client.
//!
//! Posts journey search requests to the National Rail journey planner and
//! classifies each response into a [`FetchOutcome`].

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::journey::RawJourneyPayload;

use super::outcome::{FetchOutcome, JourneyFetcher, TransportError, snippet};
use super::request::PlannerRequest;

/// Default planner endpoint.
const DEFAULT_BASE_URL: &str = "https://jpservices.nationalrail.co.uk/journey-planner";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the planner client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerApiConfig {
    /// Planner endpoint URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl PlannerApiConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom endpoint URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for PlannerApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Journey planner API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct JourneyPlannerClient {
    http: reqwest::Client,
    base_url: String,
}

impl JourneyPlannerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: PlannerApiConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("commute-server/", env!("CARGO_PKG_VERSION"))),
        );

        // gzip/deflate features make reqwest negotiate and decode compression
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl JourneyFetcher for JourneyPlannerClient {
    async fn fetch(&self, request: &PlannerRequest) -> FetchOutcome {
        let response = match self.http.post(&self.base_url).json(request).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Transport(TransportError::Http(e)),
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return FetchOutcome::Transport(TransportError::Http(e)),
        };

        debug!(
            origin = %request.origin.crs,
            status = status.as_u16(),
            bytes = body.len(),
            "Planner responded"
        );

        classify(status, content_type.as_deref(), body)
    }
}

/// Classify a planner response.
///
/// 400 and 422 mean the planner understood the request but cannot serve it.
/// Other error statuses are transport failures. A successful status must
/// carry a JSON journey plan.
pub fn classify(status: StatusCode, content_type: Option<&str>, body: String) -> FetchOutcome {
    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
        return FetchOutcome::NoResults;
    }

    if !status.is_success() {
        return FetchOutcome::Transport(TransportError::Status {
            status: status.as_u16(),
            message: snippet(&body),
        });
    }

    if content_type.is_some_and(|ct| !ct.contains("json")) {
        return FetchOutcome::Malformed {
            body: snippet(&body),
        };
    }

    let Ok(payload) = RawJourneyPayload::from_json_str(&body) else {
        return FetchOutcome::Malformed {
            body: snippet(&body),
        };
    };

    if payload.plan().is_err() {
        return FetchOutcome::Malformed {
            body: snippet(&body),
        };
    }

    FetchOutcome::Success(payload)
}
