use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use docgraph_core::api_types::HealthResponse;

use crate::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    info!("Health check requested");

    let (neo4j_connected, node_count, relationship_count) = match state.graph.node_count().await {
        Ok(nodes) => {
            let relationships = state.graph.relationship_count().await.unwrap_or(0);
            (true, nodes, relationships)
        }
        Err(e) => {
            tracing::warn!("Neo4j connectivity check failed: {e}");
            (false, 0, 0)
        }
    };

    let status = if neo4j_connected { "ok" } else { "degraded" };

    let response = HealthResponse {
        status: status.to_string(),
        version: VERSION.to_string(),
        neo4j_connected,
        node_count,
        relationship_count,
    };

    (StatusCode::OK, Json(response))
}
