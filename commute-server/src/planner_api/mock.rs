//! Mock planner for running without network access.
//!
//! Loads sample planner responses from JSON files and serves them as if
//! they were live responses, keyed by origin station.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::StationCode;
use crate::journey::RawJourneyPayload;

use super::outcome::{FetchOutcome, JourneyFetcher};
use super::request::PlannerRequest;

/// Errors loading mock planner data.
#[derive(Debug, thiserror::Error)]
pub enum MockLoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid station code in filename {0:?}")]
    InvalidFilename(PathBuf),

    #[error("no mock journey files found in {0:?}")]
    Empty(PathBuf),
}

/// Mock planner serving canned payloads by origin.
///
/// Origins without a payload get `NoResults`, like an unserviceable route.
#[derive(Clone, Default)]
pub struct MockJourneyFetcher {
    payloads: Arc<RwLock<HashMap<StationCode, RawJourneyPayload>>>,
    calls: Arc<AtomicUsize>,
}

impl MockJourneyFetcher {
    /// Create a mock from in-memory payloads.
    pub fn from_payloads(payloads: impl IntoIterator<Item = (StationCode, RawJourneyPayload)>) -> Self {
        Self {
            payloads: Arc::new(RwLock::new(payloads.into_iter().collect())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Load payloads from a directory of `{ORIGIN}.json` files.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, MockLoadError> {
        let data_dir = data_dir.as_ref();
        let mut payloads = HashMap::new();

        let entries = std::fs::read_dir(data_dir).map_err(|source| MockLoadError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| MockLoadError::Io {
                path: data_dir.to_path_buf(),
                source,
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let origin = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| StationCode::parse(s).ok())
                .ok_or_else(|| MockLoadError::InvalidFilename(path.clone()))?;

            let json = std::fs::read_to_string(&path).map_err(|source| MockLoadError::Io {
                path: path.clone(),
                source,
            })?;

            let payload = RawJourneyPayload::from_json_str(&json)
                .map_err(|source| MockLoadError::Json { path, source })?;

            payloads.insert(origin, payload);
        }

        if payloads.is_empty() {
            return Err(MockLoadError::Empty(data_dir.to_path_buf()));
        }

        Ok(Self::from_payloads(payloads))
    }

    /// Number of fetches served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Origins with canned payloads.
    pub async fn available_origins(&self) -> Vec<StationCode> {
        let payloads = self.payloads.read().await;
        let mut origins: Vec<_> = payloads.keys().cloned().collect();
        origins.sort();
        origins
    }
}

#[async_trait]
impl JourneyFetcher for MockJourneyFetcher {
    async fn fetch(&self, request: &PlannerRequest) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let Ok(origin) = StationCode::parse(&request.origin.crs) else {
            return FetchOutcome::NoResults;
        };

        let payloads = self.payloads.read().await;
        match payloads.get(&origin) {
            Some(payload) => FetchOutcome::Success(payload.clone()),
            None => FetchOutcome::NoResults,
        }
    }
}
