mod analysis;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;
mod taxonomy;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::taxonomy::SkillTaxonomy;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Skillmap API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite
    let db = create_pool(&config.database_url).await?;

    // Load skill taxonomy
    let taxonomy = match &config.skill_taxonomy_path {
        Some(path) => SkillTaxonomy::from_file(path)
            .with_context(|| format!("Failed to load taxonomy from {}", path.display()))?,
        None => SkillTaxonomy::builtin(),
    };
    info!(
        "Skill taxonomy loaded (majors: {})",
        taxonomy.major_names().collect::<Vec<_>>().join(", ")
    );

    // Initialize matcher (PhraseMatcher by default, swap via MATCH_STRATEGY)
    let matcher = Arc::from(config.match_strategy.matcher());
    info!("Skill matcher: {}", config.match_strategy);

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        taxonomy: Arc::new(taxonomy),
        matcher,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
