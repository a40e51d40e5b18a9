//! Commute matching.
//!
//! [`BatchJourneyResolver`] turns journey queries into summaries through the
//! cache and the planner. [`MatchEngine`] pairs property search results with
//! those summaries and keeps the stations within the commute limit.

mod config;
mod engine;
mod resolver;

#[cfg(test)]
mod resolver_tests;

pub use config::{DEFAULT_MAX_IN_FLIGHT, ResolverConfig};
pub use engine::{MatchEngine, MatchError, MatchRequest, MatchResult, is_acceptable};
pub use resolver::BatchJourneyResolver;
