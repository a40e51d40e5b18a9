//! Postgres-backed journey cache.
//!
//! Entries live in the `journeys` table, one row per normalized query.
//! Optional query fields are stored as sentinels so that the composite
//! primary key never contains NULLs: no return is `return_time = ''` and
//! `return_type = 'NONE'`, no railcard is `rail_card = ''`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::debug;

use crate::domain::JourneyQuery;
use crate::journey::RawJourneyPayload;

use super::error::CacheError;
use super::{CacheEntry, JourneyCache};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS journeys (
        origin      text        NOT NULL,
        destination text        NOT NULL,
        start_time  text        NOT NULL,
        start_type  text        NOT NULL,
        return_time text        NOT NULL,
        return_type text        NOT NULL,
        day_of_week smallint    NOT NULL,
        rail_card   text        NOT NULL,
        checked_at  timestamptz NOT NULL DEFAULT now(),
        data        jsonb       NOT NULL,
        PRIMARY KEY (origin, destination, start_time, start_type,
                     return_time, return_type, day_of_week, rail_card)
    )
";

/// Rows come back tagged with their 1-based position in the key arrays.
const SELECT_MANY: &str = "
    SELECT k.idx, j.checked_at, j.data::text AS data
    FROM unnest($1::text[], $2::text[], $3::text[], $4::text[],
                $5::text[], $6::text[], $7::int2[], $8::text[])
         WITH ORDINALITY AS k(origin, destination, start_time, start_type,
                              return_time, return_type, day_of_week, rail_card, idx)
    JOIN journeys j USING (origin, destination, start_time, start_type,
                           return_time, return_type, day_of_week, rail_card)
";

const UPSERT_MANY: &str = "
    INSERT INTO journeys (origin, destination, start_time, start_type,
                          return_time, return_type, day_of_week, rail_card, data)
    SELECT origin, destination, start_time, start_type,
           return_time, return_type, day_of_week, rail_card, data::jsonb
    FROM unnest($1::text[], $2::text[], $3::text[], $4::text[],
                $5::text[], $6::text[], $7::int2[], $8::text[], $9::text[])
         AS t(origin, destination, start_time, start_type,
              return_time, return_type, day_of_week, rail_card, data)
    ON CONFLICT (origin, destination, start_time, start_type,
                 return_time, return_type, day_of_week, rail_card)
    DO UPDATE SET checked_at = now(), data = excluded.data
";

/// Sentinel for an absent return anchor.
const NO_RETURN_TYPE: &str = "NONE";

/// Key columns for a batch of queries, one array per column.
#[derive(Debug, Default, PartialEq)]
struct KeyColumns {
    origin: Vec<String>,
    destination: Vec<String>,
    start_time: Vec<String>,
    start_type: Vec<String>,
    return_time: Vec<String>,
    return_type: Vec<String>,
    day_of_week: Vec<i16>,
    rail_card: Vec<String>,
}

impl KeyColumns {
    fn from_keys<'a>(keys: impl IntoIterator<Item = &'a JourneyQuery>) -> Self {
        let mut cols = KeyColumns::default();
        for key in keys {
            let profile = &key.profile;
            cols.origin.push(key.origin.as_str().to_string());
            cols.destination.push(key.destination.as_str().to_string());
            cols.start_time.push(profile.outbound.time_str());
            cols.start_type.push(profile.outbound.anchor.as_str().to_string());
            match &profile.inbound {
                Some(inbound) => {
                    cols.return_time.push(inbound.time_str());
                    cols.return_type.push(inbound.anchor.as_str().to_string());
                }
                None => {
                    cols.return_time.push(String::new());
                    cols.return_type.push(NO_RETURN_TYPE.to_string());
                }
            }
            cols.day_of_week.push(i16::from(profile.day_of_week.index()));
            cols.rail_card.push(profile.railcard.clone().unwrap_or_default());
        }
        cols
    }

    fn bind<'q>(
        self,
        query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        query
            .bind(self.origin)
            .bind(self.destination)
            .bind(self.start_time)
            .bind(self.start_type)
            .bind(self.return_time)
            .bind(self.return_type)
            .bind(self.day_of_week)
            .bind(self.rail_card)
    }
}

/// Collapse duplicate keys, keeping the last payload for each and the
/// position of its first occurrence.
fn dedupe_last_wins(
    entries: Vec<(JourneyQuery, RawJourneyPayload)>,
) -> Vec<(JourneyQuery, RawJourneyPayload)> {
    let mut positions: HashMap<JourneyQuery, usize> = HashMap::new();
    let mut unique: Vec<(JourneyQuery, RawJourneyPayload)> = Vec::with_capacity(entries.len());

    for (query, payload) in entries {
        match positions.get(&query) {
            Some(&pos) => unique[pos].1 = payload,
            None => {
                positions.insert(query.clone(), unique.len());
                unique.push((query, payload));
            }
        }
    }

    unique
}

/// A `journeys` row matched by a lookup, tagged with its 1-based key index.
#[derive(Debug)]
struct CachedRow {
    idx: i64,
    fetched_at: DateTime<Utc>,
    data: String,
}

/// Place matched rows into one slot per key, in key order.
fn place_rows(
    keys: &[JourneyQuery],
    rows: impl IntoIterator<Item = CachedRow>,
) -> Result<Vec<Option<CacheEntry>>, CacheError> {
    let mut found: Vec<Option<CacheEntry>> = vec![None; keys.len()];

    for row in rows {
        let slot = row
            .idx
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < keys.len())
            .ok_or_else(|| CacheError::MalformedRow(format!("row index {} out of range", row.idx)))?;

        let payload = RawJourneyPayload::from_json_str(&row.data)
            .map_err(|e| CacheError::MalformedRow(format!("data is not JSON: {e}")))?;

        found[slot] = Some(CacheEntry {
            query: keys[slot].clone(),
            fetched_at: row.fetched_at,
            payload,
        });
    }

    Ok(found)
}

/// Journey cache stored in Postgres.
#[derive(Debug, Clone)]
pub struct PgJourneyCache {
    pool: PgPool,
}

impl PgJourneyCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `journeys` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), CacheError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl JourneyCache for PgJourneyCache {
    async fn get_many(&self, keys: &[JourneyQuery]) -> Result<Vec<Option<CacheEntry>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let rows = KeyColumns::from_keys(keys)
            .bind(sqlx::query(SELECT_MANY))
            .fetch_all(&self.pool)
            .await?;

        debug!(keys = keys.len(), hits = rows.len(), "Journey cache lookup");

        let hits = rows
            .iter()
            .map(|row| {
                Ok(CachedRow {
                    idx: row.try_get("idx")?,
                    fetched_at: row.try_get("checked_at")?,
                    data: row.try_get("data")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        place_rows(keys, hits)
    }

    async fn put_many(&self, entries: Vec<(JourneyQuery, RawJourneyPayload)>) -> Result<(), CacheError> {
        if entries.is_empty() {
            return Ok(());
        }

        let entries = dedupe_last_wins(entries);
        let data = entries
            .iter()
            .map(|(_, payload)| serde_json::to_string(payload.as_value()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CacheError::MalformedRow(format!("payload not serializable: {e}")))?;

        let result = KeyColumns::from_keys(entries.iter().map(|(q, _)| q))
            .bind(sqlx::query(UPSERT_MANY))
            .bind(data)
            .execute(&self.pool)
            .await?;

        debug!(rows = result.rows_affected(), "Journey cache upsert");
        Ok(())
    }
}
