//! Tests for batch resolution and matching.

use super::*;
use crate::cache::{CacheEntry, CacheError, JourneyCache, MemoryJourneyCache};
use crate::domain::{
    Anchor, DayOfWeek, JourneyProfile, JourneyQuery, Property, PropertyStationGroup, Station,
    StationCode, TimeConstraint,
};
use crate::journey::RawJourneyPayload;
use crate::planner_api::{FetchOutcome, JourneyFetcher, PlannerRequest, TransportError};
use crate::property::{MemoryPropertySearch, PropertyFilter};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn today() -> NaiveDate {
    // A Wednesday
    NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()
}

fn code(s: &str) -> StationCode {
    StationCode::parse(s).unwrap()
}

fn profile(with_return: bool) -> JourneyProfile {
    JourneyProfile::new(
        TimeConstraint::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap(), Anchor::Arrive),
        with_return.then(|| NaiveTime::from_hms_opt(17, 30, 0).unwrap()),
        with_return.then_some(Anchor::Depart),
        DayOfWeek::Tue,
        None,
    )
    .unwrap()
}

fn query(origin: &str) -> JourneyQuery {
    JourneyQuery::new(code(origin), code("182"), profile(false))
}

fn journey(minutes: i64) -> Value {
    json!({
        "duration": format!("{minutes}m"),
        "timetable": {"scheduled": {"departure": "2024-03-19T08:00:00Z", "arrival": null}},
        "legs": [{"mode": "TRAIN"}],
        "fares": [{"totalPrice": 1000, "typeDescription": "Anytime Day Single", "direction": "OUTWARD"}],
    })
}

/// A planner payload with one outbound option and optionally one return.
fn plan(outbound: i64, inbound: Option<i64>) -> Value {
    let inward: Vec<Value> = inbound.into_iter().map(journey).collect();
    json!({"outwardJourneys": [journey(outbound)], "inwardJourneys": inward})
}

#[derive(Clone)]
enum Scripted {
    Success(Value),
    NoResults,
    Malformed,
    Status(u16),
}

/// Fetcher that answers per origin after a fixed delay.
#[derive(Default)]
struct ScriptedFetcher {
    script: HashMap<String, (u64, Scripted)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn with(mut self, origin: &str, delay_ms: u64, outcome: Scripted) -> Self {
        self.script.insert(origin.to_string(), (delay_ms, outcome));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JourneyFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &PlannerRequest) -> FetchOutcome {
        self.calls.lock().unwrap().push(request.origin.crs.clone());

        let Some((delay_ms, outcome)) = self.script.get(&request.origin.crs).cloned() else {
            return FetchOutcome::NoResults;
        };
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        match outcome {
            Scripted::Success(value) => FetchOutcome::Success(RawJourneyPayload::new(value)),
            Scripted::NoResults => FetchOutcome::NoResults,
            Scripted::Malformed => FetchOutcome::Malformed {
                body: "<html>maintenance</html>".to_string(),
            },
            Scripted::Status(status) => FetchOutcome::Transport(TransportError::Status {
                status,
                message: "upstream unavailable".to_string(),
            }),
        }
    }
}

/// Memory cache that records every write batch.
#[derive(Default)]
struct RecordingCache {
    inner: MemoryJourneyCache,
    writes: Mutex<Vec<Vec<JourneyQuery>>>,
}

impl RecordingCache {
    fn writes(&self) -> Vec<Vec<JourneyQuery>> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl JourneyCache for RecordingCache {
    async fn get_many(&self, keys: &[JourneyQuery]) -> Result<Vec<Option<CacheEntry>>, CacheError> {
        self.inner.get_many(keys).await
    }

    async fn put_many(&self, entries: Vec<(JourneyQuery, RawJourneyPayload)>) -> Result<(), CacheError> {
        self.writes
            .lock()
            .unwrap()
            .push(entries.iter().map(|(q, _)| q.clone()).collect());
        self.inner.put_many(entries).await
    }
}

/// Cache whose reads always fail.
struct BrokenCache;

#[async_trait]
impl JourneyCache for BrokenCache {
    async fn get_many(&self, _keys: &[JourneyQuery]) -> Result<Vec<Option<CacheEntry>>, CacheError> {
        Err(CacheError::MalformedRow("connection reset".to_string()))
    }

    async fn put_many(&self, _entries: Vec<(JourneyQuery, RawJourneyPayload)>) -> Result<(), CacheError> {
        Ok(())
    }
}

fn fastest(summary: &Option<crate::domain::JourneySummary>) -> Option<i64> {
    summary.as_ref().map(|s| s.outbound.fastest_time)
}

#[tokio::test]
async fn results_align_with_input_despite_completion_order() {
    // Earlier queries finish last
    let fetcher = ScriptedFetcher::default()
        .with("AAA", 60, Scripted::Success(plan(10, None)))
        .with("BBB", 30, Scripted::Success(plan(20, None)))
        .with("CCC", 0, Scripted::Success(plan(30, None)));
    let cache = RecordingCache::default();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);

    let queries = vec![query("AAA"), query("BBB"), query("CCC")];
    let results = resolver.resolve_batch(&queries, today()).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(fastest(&results[0]), Some(10));
    assert_eq!(fastest(&results[1]), Some(20));
    assert_eq!(fastest(&results[2]), Some(30));
}

fn assert_send<T: Send>(_: &T) {}

#[test]
fn batch_future_is_send() {
    let fetcher = ScriptedFetcher::default();
    let cache = RecordingCache::default();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);
    let queries = vec![query("RDG"), query("SWI")];

    let batch = resolver.resolve_batch(&queries, today());
    assert_send(&batch);
    let one = resolver.resolve_one(&queries[0], today());
    assert_send(&one);
}

#[tokio::test]
async fn empty_batch_touches_nothing() {
    let fetcher = ScriptedFetcher::default();
    let cache = RecordingCache::default();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);

    let results = resolver.resolve_batch(&[], today()).await.unwrap();
    assert!(results.is_empty());
    assert!(fetcher.calls().is_empty());
    assert!(cache.writes().is_empty());
}

#[tokio::test]
async fn second_resolution_is_served_from_cache() {
    let fetcher = ScriptedFetcher::default().with("RDG", 0, Scripted::Success(plan(45, None)));
    let cache = RecordingCache::default();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);

    let first = resolver.resolve_one(&query("RDG"), today()).await.unwrap();
    let second = resolver.resolve_one(&query("RDG"), today()).await.unwrap();

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(fetcher.calls(), vec!["RDG"]);
    assert_eq!(cache.writes().len(), 1);
}

#[tokio::test]
async fn failures_are_isolated_per_query() {
    let fetcher = ScriptedFetcher::default()
        .with("AAA", 0, Scripted::Success(plan(40, None)))
        .with("BBB", 0, Scripted::NoResults)
        .with("CCC", 0, Scripted::Malformed)
        .with("DDD", 0, Scripted::Status(503))
        .with("EEE", 0, Scripted::Success(json!({"outwardJourneys": [{"duration": "soon", "timetable": {"scheduled": {"departure": "2024-03-19T08:00:00Z"}}}]})))
        .with("FFF", 0, Scripted::Success(plan(50, None)));
    let cache = RecordingCache::default();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);

    let queries: Vec<_> = ["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"]
        .into_iter()
        .map(query)
        .collect();
    let results = resolver.resolve_batch(&queries, today()).await.unwrap();

    let fastest: Vec<_> = results.iter().map(fastest).collect();
    assert_eq!(fastest, vec![Some(40), None, None, None, None, Some(50)]);
}

#[tokio::test]
async fn one_write_with_only_new_successes() {
    let fetcher = ScriptedFetcher::default()
        .with("AAA", 0, Scripted::Success(plan(40, None)))
        .with("BBB", 0, Scripted::NoResults)
        .with("CCC", 0, Scripted::Success(plan(35, None)))
        .with("DDD", 0, Scripted::Success(plan(25, None)));
    let cache = RecordingCache::default();
    cache
        .inner
        .put_many(vec![(query("DDD"), RawJourneyPayload::new(plan(25, None)))])
        .await
        .unwrap();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);

    let queries: Vec<_> = ["AAA", "BBB", "CCC", "DDD"].into_iter().map(query).collect();
    resolver.resolve_batch(&queries, today()).await.unwrap();

    assert_eq!(cache.writes(), vec![vec![query("AAA"), query("CCC")]]);
    assert!(!fetcher.calls().contains(&"DDD".to_string()));
}

#[tokio::test]
async fn no_write_without_successes() {
    let fetcher = ScriptedFetcher::default()
        .with("AAA", 0, Scripted::NoResults)
        .with("BBB", 0, Scripted::Status(500));
    let cache = RecordingCache::default();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);

    let results = resolver
        .resolve_batch(&[query("AAA"), query("BBB")], today())
        .await
        .unwrap();

    assert_eq!(results, vec![None, None]);
    assert!(cache.writes().is_empty());
}

#[tokio::test]
async fn duplicate_queries_fetch_once() {
    let fetcher = ScriptedFetcher::default().with("RDG", 10, Scripted::Success(plan(45, None)));
    let cache = RecordingCache::default();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);

    let queries = vec![query("RDG"), query("SWI"), query("RDG")];
    let results = resolver.resolve_batch(&queries, today()).await.unwrap();

    assert_eq!(fastest(&results[0]), Some(45));
    assert_eq!(results[1], None);
    assert_eq!(results[0], results[2]);
    assert_eq!(fetcher.calls().iter().filter(|c| *c == "RDG").count(), 1);
    assert_eq!(cache.writes(), vec![vec![query("RDG")]]);
}

#[tokio::test]
async fn unsummarizable_payload_is_still_cached() {
    let odd = json!({"outwardJourneys": [{"duration": "5x", "timetable": {"scheduled": {"departure": "2024-03-19T08:00:00Z"}}}]});
    let fetcher = ScriptedFetcher::default().with("RDG", 0, Scripted::Success(odd));
    let cache = RecordingCache::default();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);

    assert_eq!(resolver.resolve_one(&query("RDG"), today()).await.unwrap(), None);
    assert_eq!(cache.writes(), vec![vec![query("RDG")]]);
}

#[tokio::test]
async fn serial_resolution_with_single_slot() {
    let fetcher = ScriptedFetcher::default()
        .with("AAA", 5, Scripted::Success(plan(10, None)))
        .with("BBB", 5, Scripted::Success(plan(20, None)));
    let cache = RecordingCache::default();
    let config = ResolverConfig::new(1);
    let resolver = BatchJourneyResolver::new(&cache, &fetcher, &config);

    let results = resolver
        .resolve_batch(&[query("AAA"), query("BBB")], today())
        .await
        .unwrap();
    assert_eq!(fastest(&results[0]), Some(10));
    assert_eq!(fastest(&results[1]), Some(20));
    assert_eq!(fetcher.calls(), vec!["AAA", "BBB"]);
}

#[tokio::test]
async fn cache_failure_fails_batch() {
    let fetcher = ScriptedFetcher::default();
    let config = ResolverConfig::default();
    let resolver = BatchJourneyResolver::new(&BrokenCache, &fetcher, &config);

    let result = resolver.resolve_batch(&[query("RDG")], today()).await;
    assert!(matches!(result, Err(CacheError::MalformedRow(_))));
    assert!(fetcher.calls().is_empty());
}

// ---- MatchEngine ----

fn station(id: &str, location: (f64, f64)) -> Station {
    Station {
        id: code(id),
        name: format!("{id} station"),
        location,
    }
}

fn property(id: &str, location: (f64, f64)) -> Property {
    Property {
        id: id.to_string(),
        location,
        address: format!("{id} Station Road"),
        price: 1200,
        bedrooms: Some(2),
        bathrooms: Some(1),
    }
}

fn group(id: &str, property_id: &str) -> PropertyStationGroup {
    PropertyStationGroup {
        station: station(id, (0.0, 51.0)),
        properties: vec![property(property_id, (0.0, 51.0))],
    }
}

fn engine(fetcher: ScriptedFetcher, properties: MemoryPropertySearch) -> MatchEngine {
    MatchEngine::new(
        Arc::new(MemoryJourneyCache::new()),
        Arc::new(fetcher),
        Arc::new(properties),
        ResolverConfig::default(),
    )
}

#[test]
fn acceptability_rules() {
    let summary = |out: i64, inb: Option<i64>| {
        crate::journey::aggregate(&RawJourneyPayload::new(plan(out, inb)), inb.is_some())
            .unwrap()
            .unwrap()
    };

    assert!(is_acceptable(&summary(45, None), false, 60));
    assert!(is_acceptable(&summary(60, None), false, 60));
    assert!(!is_acceptable(&summary(75, None), false, 60));
    assert!(is_acceptable(&summary(45, Some(50)), true, 60));
    assert!(!is_acceptable(&summary(45, Some(70)), true, 60));

    let no_return = crate::journey::aggregate(&RawJourneyPayload::new(plan(45, None)), true)
        .unwrap()
        .unwrap();
    assert!(!is_acceptable(&no_return, true, 60));
}

#[tokio::test]
async fn match_groups_filters_and_keeps_order() {
    let fetcher = ScriptedFetcher::default()
        .with("AAA", 20, Scripted::Success(plan(45, None)))
        .with("BBB", 0, Scripted::Success(plan(75, None)))
        .with("CCC", 0, Scripted::NoResults)
        .with("DDD", 0, Scripted::Success(plan(30, None)));
    let engine = engine(fetcher, MemoryPropertySearch::default());

    let groups = vec![
        group("AAA", "a1"),
        group("BBB", "b1"),
        group("CCC", "c1"),
        group("DDD", "d1"),
    ];
    let results = engine
        .match_groups(groups, &profile(false), &code("182"), 60, today())
        .await
        .unwrap();

    let stations: Vec<&str> = results.iter().map(|r| r.station.id.as_str()).collect();
    assert_eq!(stations, vec!["AAA", "DDD"]);
    assert_eq!(results[0].properties[0].id, "a1");
    assert_eq!(results[0].journey_summary.outbound.fastest_time, 45);
}

#[tokio::test]
async fn match_groups_applies_return_limit() {
    let fetcher = ScriptedFetcher::default()
        .with("AAA", 0, Scripted::Success(plan(45, Some(50))))
        .with("BBB", 0, Scripted::Success(plan(45, Some(90))))
        .with("CCC", 0, Scripted::Success(plan(45, None)));
    let engine = engine(fetcher, MemoryPropertySearch::default());

    let groups = vec![group("AAA", "a1"), group("BBB", "b1"), group("CCC", "c1")];
    let results = engine
        .match_groups(groups, &profile(true), &code("182"), 60, today())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].station.id.as_str(), "AAA");
}

#[tokio::test]
async fn search_runs_property_search_first() {
    let reading = (-0.9718, 51.4589);
    let search = MemoryPropertySearch::new(
        vec![station("RDG", reading), station("SWI", (-1.7855, 51.5655))],
        vec![property("flat-1", (reading.0, reading.1 + 0.002))],
    );
    let fetcher = ScriptedFetcher::default().with("RDG", 0, Scripted::Success(plan(28, None)));
    let engine = engine(fetcher, search);

    let request = MatchRequest {
        filter: PropertyFilter::new(1500, 800.0),
        profile: profile(false),
        destination: code("182"),
        max_journey_minutes: 60,
    };
    let results = engine.search(&request, today()).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].station.id.as_str(), "RDG");
    assert_eq!(results[0].properties[0].id, "flat-1");
}

#[tokio::test]
async fn search_with_no_groups_is_empty() {
    let engine = engine(ScriptedFetcher::default(), MemoryPropertySearch::default());
    let request = MatchRequest {
        filter: PropertyFilter::new(1500, 800.0),
        profile: profile(false),
        destination: code("182"),
        max_journey_minutes: 60,
    };
    assert!(engine.search(&request, today()).await.unwrap().is_empty());
}
