//! Persistent cache of planner responses.
//!
//! Planner lookups are slow and rate-limited, so every successful response
//! is stored against its normalized [`JourneyQuery`]. Entries never expire:
//! a hit is served regardless of age, and a refetch overwrites the payload
//! and refreshes `fetched_at`.
//!
//! Concurrent writers to the same key race; the last write wins. Payloads
//! for a key are re-fetches of the same query, so either is acceptable.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::JourneyQuery;
use crate::journey::RawJourneyPayload;

pub use error::CacheError;
pub use memory::MemoryJourneyCache;
pub use postgres::PgJourneyCache;

/// A cached planner response.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub query: JourneyQuery,
    pub fetched_at: DateTime<Utc>,
    pub payload: RawJourneyPayload,
}

/// Keyed store of planner responses.
#[async_trait]
pub trait JourneyCache: Send + Sync {
    /// Look up a single query.
    async fn get(&self, key: &JourneyQuery) -> Result<Option<CacheEntry>, CacheError> {
        let mut found = self.get_many(std::slice::from_ref(key)).await?;
        Ok(found.pop().flatten())
    }

    /// Look up a batch of queries.
    ///
    /// The result has one slot per key, in the same order; misses are `None`.
    async fn get_many(&self, keys: &[JourneyQuery]) -> Result<Vec<Option<CacheEntry>>, CacheError>;

    /// Insert or overwrite entries, stamping them with the current time.
    ///
    /// The batch is written atomically.
    async fn put_many(&self, entries: Vec<(JourneyQuery, RawJourneyPayload)>) -> Result<(), CacheError>;
}
