//! Application state for the web layer.

use std::sync::Arc;

use crate::matching::MatchEngine;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Property search, journey cache and planner
    pub engine: Arc<MatchEngine>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(engine: MatchEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
