use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Health
        .route("/api/health", get(handlers::health::health_check))
        // Runs
        .route("/api/runs", post(handlers::runs::trigger_run))
        .route("/api/runs", get(handlers::runs::list_runs))
        .route("/api/runs/{id}", get(handlers::runs::get_run))
}
