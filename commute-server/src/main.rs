use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commute_server::cache::{JourneyCache, MemoryJourneyCache, PgJourneyCache};
use commute_server::config::AppConfig;
use commute_server::db;
use commute_server::matching::MatchEngine;
use commute_server::planner_api::{JourneyFetcher, JourneyPlannerClient, MockJourneyFetcher};
use commute_server::property::{MemoryPropertySearch, PgPropertySearch, PropertySearch};
use commute_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("commute_server=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let (cache, properties): (Arc<dyn JourneyCache>, Arc<dyn PropertySearch>) =
        match &config.database_url {
            Some(url) => {
                let pool = db::connect(url, config.db_max_connections)
                    .await
                    .context("Failed to connect to database")?;
                let cache = PgJourneyCache::new(pool.clone());
                cache
                    .ensure_schema()
                    .await
                    .context("Failed to create journeys table")?;
                (Arc::new(cache), Arc::new(PgPropertySearch::new(pool)))
            }
            None => {
                let properties = match &config.property_fixture_file {
                    Some(path) => {
                        let search = MemoryPropertySearch::from_file(path).with_context(|| {
                            format!("Failed to load property fixtures from {}", path.display())
                        })?;
                        let (stations, listings) = search.counts().await;
                        info!(stations, listings, "DATABASE_URL not set, using property fixtures");
                        search
                    }
                    None => {
                        warn!(
                            "Neither DATABASE_URL nor PROPERTY_FIXTURE_FILE is set; \
                             property search is empty and every match will be empty"
                        );
                        MemoryPropertySearch::default()
                    }
                };
                (Arc::new(MemoryJourneyCache::new()), Arc::new(properties))
            }
        };

    let fetcher: Arc<dyn JourneyFetcher> = match &config.planner_mock_dir {
        Some(dir) => {
            let mock = MockJourneyFetcher::from_dir(dir)
                .with_context(|| format!("Failed to load mock planner data from {}", dir.display()))?;
            info!(
                origins = mock.available_origins().await.len(),
                "Using mock planner"
            );
            Arc::new(mock)
        }
        None => {
            info!(base_url = %config.planner.base_url, "Using journey planner");
            Arc::new(
                JourneyPlannerClient::new(config.planner.clone())
                    .context("Failed to create planner client")?,
            )
        }
    };

    let engine = MatchEngine::new(cache, fetcher, properties, config.resolver.clone());
    let app = create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Commute matcher listening");
    info!("  GET  /health                - Health check");
    info!("  POST /search/matching       - Properties near stations with an acceptable commute");
    info!("  POST /search/near-stations  - Properties grouped by nearby station");
    info!("  POST /journey/summary       - Journey summary for one origin");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
