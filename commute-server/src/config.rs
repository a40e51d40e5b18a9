//! Server configuration from the environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::matching::{DEFAULT_MAX_IN_FLIGHT, ResolverConfig};
use crate::planner_api::PlannerApiConfig;

/// Everything `main` needs to assemble the server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres URL; without it the server runs on in-memory stores
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub planner: PlannerApiConfig,
    /// Serve canned planner responses from this directory instead of
    /// calling the planner
    pub planner_mock_dir: Option<PathBuf>,
    /// Stations and properties for the in-memory property search, used
    /// when no database is configured
    pub property_fixture_file: Option<PathBuf>,
    pub resolver: ResolverConfig,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut planner = PlannerApiConfig::default();
        if let Some(url) = lookup("PLANNER_BASE_URL") {
            planner = planner.with_base_url(url);
        }
        if let Some(secs) = lookup("PLANNER_TIMEOUT_SECS") {
            planner = planner.with_timeout(
                secs.parse::<u64>()
                    .context("Failed to parse PLANNER_TIMEOUT_SECS")?,
            );
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .context("Failed to parse DB_MAX_CONNECTIONS")?,
            planner,
            planner_mock_dir: lookup("PLANNER_MOCK_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            property_fixture_file: lookup("PROPERTY_FIXTURE_FILE")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            resolver: ResolverConfig::new(
                lookup("MAX_IN_FLIGHT")
                    .map(|s| s.parse::<usize>())
                    .transpose()
                    .context("Failed to parse MAX_IN_FLIGHT")?
                    .unwrap_or(DEFAULT_MAX_IN_FLIGHT),
            ),
            bind_addr: lookup("BIND_ADDR")
                .unwrap_or_else(|| "127.0.0.1:3000".to_string())
                .parse()
                .context("Failed to parse BIND_ADDR")?,
        })
    }
}
