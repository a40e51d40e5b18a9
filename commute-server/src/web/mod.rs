//! Web layer for the commute matcher.
//!
//! Provides JSON endpoints for matching properties against commutes, plain
//! property search, and single journey summaries.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::create_router;
pub use state::AppState;
