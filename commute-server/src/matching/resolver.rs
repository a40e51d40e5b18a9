//! Batch journey resolution: cache first, planner for the misses.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::config::ResolverConfig;
use crate::cache::{CacheError, JourneyCache};
use crate::domain::{JourneyQuery, JourneySummary};
use crate::journey::{RawJourneyPayload, aggregate};
use crate::planner_api::{FetchOutcome, JourneyFetcher, build_request};

/// Resolves many journey queries to summaries.
///
/// Cached payloads are used as-is. Misses are fetched concurrently, up to
/// [`ResolverConfig::max_in_flight`] at a time, and every successful fetch
/// is written back in one batched cache write.
pub struct BatchJourneyResolver<'a> {
    cache: &'a dyn JourneyCache,
    fetcher: &'a dyn JourneyFetcher,
    config: &'a ResolverConfig,
}

/// A distinct cache miss and every input slot that shares its key.
struct Miss {
    first: usize,
    slots: Vec<usize>,
}

impl<'a> BatchJourneyResolver<'a> {
    pub fn new(
        cache: &'a dyn JourneyCache,
        fetcher: &'a dyn JourneyFetcher,
        config: &'a ResolverConfig,
    ) -> Self {
        Self {
            cache,
            fetcher,
            config,
        }
    }

    /// Resolve a batch of queries.
    ///
    /// The result is aligned with `queries`. A slot is `None` when the
    /// planner had nothing, failed, or returned a payload that could not be
    /// summarized; those failures never affect other slots. Only cache
    /// errors fail the whole batch.
    pub async fn resolve_batch(
        &self,
        queries: &[JourneyQuery],
        today: NaiveDate,
    ) -> Result<Vec<Option<JourneySummary>>, CacheError> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let mut payloads: Vec<Option<RawJourneyPayload>> = self
            .cache
            .get_many(queries)
            .await?
            .into_iter()
            .map(|entry| entry.map(|e| e.payload))
            .collect();

        let misses = distinct_misses(queries, &payloads);
        debug!(
            queries = queries.len(),
            misses = misses.len(),
            "Resolving journey batch"
        );

        let firsts: Vec<usize> = misses.iter().map(|miss| miss.first).collect();
        let mut fetched: Vec<(usize, Option<RawJourneyPayload>)> = stream::iter(
            firsts.into_iter().enumerate().map(|(m, first)| async move {
                (m, self.fetch_one(&queries[first], today).await)
            }),
        )
        .buffer_unordered(self.config.concurrency())
        .collect()
        .await;

        // Completion order is arbitrary; write back in input order.
        fetched.sort_by_key(|(m, _)| *m);

        let mut new_entries = Vec::new();
        for (m, payload) in fetched {
            let Some(payload) = payload else { continue };
            let miss = &misses[m];
            for &slot in &miss.slots {
                payloads[slot] = Some(payload.clone());
            }
            new_entries.push((queries[miss.first].clone(), payload));
        }

        if !new_entries.is_empty() {
            debug!(entries = new_entries.len(), "Caching fetched journeys");
            self.cache.put_many(new_entries).await?;
        }

        Ok(queries
            .iter()
            .zip(&payloads)
            .map(|(query, payload)| payload.as_ref().and_then(|p| summarize(query, p)))
            .collect())
    }

    /// Resolve a single query.
    pub async fn resolve_one(
        &self,
        query: &JourneyQuery,
        today: NaiveDate,
    ) -> Result<Option<JourneySummary>, CacheError> {
        let mut results = self
            .resolve_batch(std::slice::from_ref(query), today)
            .await?;
        Ok(results.pop().flatten())
    }

    async fn fetch_one(&self, query: &JourneyQuery, today: NaiveDate) -> Option<RawJourneyPayload> {
        let request = build_request(query, today);

        let outcome = self.fetcher.fetch(&request).await;
        let kind = outcome.kind();
        match outcome {
            FetchOutcome::Success(payload) => Some(payload),
            FetchOutcome::NoResults => {
                info!(query = %query, kind, "Planner found no journeys");
                None
            }
            FetchOutcome::Malformed { body } => {
                warn!(query = %query, kind, body = %body, "Planner returned a malformed response");
                None
            }
            FetchOutcome::Transport(e) => {
                warn!(query = %query, kind, error = %e, "Planner request failed");
                None
            }
        }
    }
}

/// Group cache misses by key, keeping the first slot for each.
fn distinct_misses(queries: &[JourneyQuery], payloads: &[Option<RawJourneyPayload>]) -> Vec<Miss> {
    let mut misses: Vec<Miss> = Vec::new();
    let mut by_key: HashMap<&JourneyQuery, usize> = HashMap::new();

    for (slot, (query, payload)) in queries.iter().zip(payloads).enumerate() {
        if payload.is_some() {
            continue;
        }
        match by_key.entry(query) {
            Entry::Occupied(e) => misses[*e.get()].slots.push(slot),
            Entry::Vacant(e) => {
                e.insert(misses.len());
                misses.push(Miss {
                    first: slot,
                    slots: vec![slot],
                });
            }
        }
    }

    misses
}

fn summarize(query: &JourneyQuery, payload: &RawJourneyPayload) -> Option<JourneySummary> {
    match aggregate(payload, query.wants_return()) {
        Ok(summary) => summary,
        Err(e) => {
            warn!(query = %query, error = %e, "Could not summarize planner response");
            None
        }
    }
}
