//! In-process journey cache.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache as MokaCache;

use crate::domain::JourneyQuery;
use crate::journey::RawJourneyPayload;

use super::error::CacheError;
use super::{CacheEntry, JourneyCache};

/// Journey cache held in memory.
///
/// Unbounded and without expiry, matching the persistent store. Contents
/// are lost on restart.
#[derive(Clone)]
pub struct MemoryJourneyCache {
    entries: MokaCache<JourneyQuery, Arc<CacheEntry>>,
}

impl MemoryJourneyCache {
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder().build(),
        }
    }

    /// Number of cached entries.
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

impl Default for MemoryJourneyCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JourneyCache for MemoryJourneyCache {
    async fn get_many(&self, keys: &[JourneyQuery]) -> Result<Vec<Option<CacheEntry>>, CacheError> {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            found.push(self.entries.get(key).await.map(|e| (*e).clone()));
        }
        Ok(found)
    }

    async fn put_many(&self, entries: Vec<(JourneyQuery, RawJourneyPayload)>) -> Result<(), CacheError> {
        let fetched_at = Utc::now();
        for (query, payload) in entries {
            let entry = CacheEntry {
                query: query.clone(),
                fetched_at,
                payload,
            };
            self.entries.insert(query, Arc::new(entry)).await;
        }
        Ok(())
    }
}
