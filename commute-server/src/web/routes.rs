//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use tracing::{error, warn};

use crate::cache::CacheError;
use crate::domain::{InvalidQuery, JourneySummary};
use crate::matching::MatchError;
use crate::property::{PropertyError, PropertyFilter};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search/matching", post(search_matching))
        .route("/search/near-stations", post(search_near_stations))
        .route("/journey/summary", post(journey_summary))
        .with_state(state)
}

/// Travel dates are derived relative to the server's local date.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Find properties near stations whose commute fits the limit.
async fn search_matching(
    State(state): State<AppState>,
    Json(req): Json<MatchingSearchRequest>,
) -> Result<Json<MatchingSearchResponse>, AppError> {
    let request = req.to_match_request()?;
    let results = state.engine.search(&request, today()).await?;
    Ok(Json(MatchingSearchResponse { results }))
}

/// Find properties grouped by nearby station.
async fn search_near_stations(
    State(state): State<AppState>,
    Json(filter): Json<PropertyFilter>,
) -> Result<Json<NearStationsResponse>, AppError> {
    let results = state.engine.property_search().find_near_stations(&filter).await?;
    Ok(Json(NearStationsResponse { results }))
}

/// Summarize journeys between two stations.
async fn journey_summary(
    State(state): State<AppState>,
    Json(req): Json<JourneySearchRequest>,
) -> Result<Json<JourneySummary>, AppError> {
    let query = req.to_query()?;

    state
        .engine
        .resolver()
        .resolve_one(&query, today())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: format!("No journeys found for {query}"),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<InvalidQuery> for AppError {
    fn from(e: InvalidQuery) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<PropertyError> for AppError {
    fn from(e: PropertyError) -> Self {
        match e {
            PropertyError::InvalidFilter(message) => AppError::BadRequest { message },
            other => AppError::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<MatchError> for AppError {
    fn from(e: MatchError) -> Self {
        match e {
            MatchError::Cache(e) => e.into(),
            MatchError::Property(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            warn!(%status, %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
