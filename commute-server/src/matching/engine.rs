//! Matching property groups against commute feasibility.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::config::ResolverConfig;
use super::resolver::BatchJourneyResolver;
use crate::cache::{CacheError, JourneyCache};
use crate::domain::{
    JourneyProfile, JourneyQuery, JourneySummary, Property, PropertyStationGroup, Station,
    StationCode,
};
use crate::planner_api::JourneyFetcher;
use crate::property::{PropertyError, PropertyFilter, PropertySearch};

/// Errors that fail a whole match request.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Property(#[from] PropertyError),
}

/// A station whose commute is acceptable, with its nearby properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub station: Station,
    pub journey_summary: JourneySummary,
    pub properties: Vec<Property>,
}

/// A full match request: which properties, and which commute.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub filter: PropertyFilter,
    pub profile: JourneyProfile,
    pub destination: StationCode,
    pub max_journey_minutes: i64,
}

/// Whether a commute summary is within the time limit.
///
/// The fastest outbound journey must fit, and if a return was requested
/// the planner must have found one whose fastest journey also fits.
pub fn is_acceptable(summary: &JourneySummary, wants_return: bool, max_journey_minutes: i64) -> bool {
    if summary.outbound.fastest_time > max_journey_minutes {
        return false;
    }
    if !wants_return {
        return true;
    }
    summary
        .inbound
        .as_ref()
        .is_some_and(|inbound| inbound.fastest_time <= max_journey_minutes)
}

/// Combines property search with journey resolution.
#[derive(Clone)]
pub struct MatchEngine {
    cache: Arc<dyn JourneyCache>,
    fetcher: Arc<dyn JourneyFetcher>,
    properties: Arc<dyn PropertySearch>,
    config: ResolverConfig,
}

impl MatchEngine {
    pub fn new(
        cache: Arc<dyn JourneyCache>,
        fetcher: Arc<dyn JourneyFetcher>,
        properties: Arc<dyn PropertySearch>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            cache,
            fetcher,
            properties,
            config,
        }
    }

    /// A resolver over this engine's cache and planner.
    pub fn resolver(&self) -> BatchJourneyResolver<'_> {
        BatchJourneyResolver::new(self.cache.as_ref(), self.fetcher.as_ref(), &self.config)
    }

    pub fn property_search(&self) -> &dyn PropertySearch {
        self.properties.as_ref()
    }

    /// Keep the groups whose station has an acceptable commute to
    /// `destination`.
    ///
    /// Results keep the input group order. Stations without a usable
    /// summary are dropped.
    pub async fn match_groups(
        &self,
        groups: Vec<PropertyStationGroup>,
        profile: &JourneyProfile,
        destination: &StationCode,
        max_journey_minutes: i64,
        today: NaiveDate,
    ) -> Result<Vec<MatchResult>, CacheError> {
        let queries: Vec<JourneyQuery> = groups
            .iter()
            .map(|g| JourneyQuery::new(g.station.id.clone(), destination.clone(), profile.clone()))
            .collect();

        let summaries = self.resolver().resolve_batch(&queries, today).await?;
        let wants_return = profile.wants_return();

        let results: Vec<MatchResult> = groups
            .into_iter()
            .zip(summaries)
            .filter_map(|(group, summary)| {
                let summary = summary?;
                if !is_acceptable(&summary, wants_return, max_journey_minutes) {
                    debug!(
                        station = %group.station.id,
                        fastest = summary.outbound.fastest_time,
                        "Commute too long"
                    );
                    return None;
                }
                Some(MatchResult {
                    station: group.station,
                    journey_summary: summary,
                    properties: group.properties,
                })
            })
            .collect();

        Ok(results)
    }

    /// Search for properties, then match their stations.
    pub async fn search(
        &self,
        request: &MatchRequest,
        today: NaiveDate,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let groups = self.properties.find_near_stations(&request.filter).await?;
        let stations = groups.len();

        let results = self
            .match_groups(
                groups,
                &request.profile,
                &request.destination,
                request.max_journey_minutes,
                today,
            )
            .await?;

        info!(
            destination = %request.destination,
            stations,
            matched = results.len(),
            "Matching search complete"
        );
        Ok(results)
    }
}
