//! Resolver configuration.

/// Default cap on concurrent planner requests per batch.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Configuration for batch journey resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum planner requests in flight at once for a single batch.
    /// Values below 1 are treated as 1.
    pub max_in_flight: usize,
}

impl ResolverConfig {
    pub fn new(max_in_flight: usize) -> Self {
        Self { max_in_flight }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub(crate) fn concurrency(&self) -> usize {
        self.max_in_flight.max(1)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}
