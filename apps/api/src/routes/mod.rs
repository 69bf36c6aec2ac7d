pub mod health;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/taxonomy", get(handlers::handle_get_taxonomy))
        .route(
            "/api/v1/analyses",
            get(handlers::handle_list_analyses).post(handlers::handle_analyze),
        )
        .route("/api/v1/analyses/:id", get(handlers::handle_get_analysis))
        .route(
            "/api/v1/analyses/:id/report",
            get(handlers::handle_download_report),
        )
        .layer(body_limit)
        .with_state(state)
}
