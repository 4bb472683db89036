use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use docgraph_core::api_types::{
    RunState, RunStatus, RunTriggerRequest, RunTriggerResponse, RunsResponse,
};
use docgraph_core::document::DocumentSource;

use crate::state::AppState;

/// POST /api/runs: ingest a document in the background.
/// Returns 202 Accepted immediately with a run_id to track progress.
pub async fn trigger_run(
    State(state): State<AppState>,
    Json(req): Json<RunTriggerRequest>,
) -> impl IntoResponse {
    if req.source.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "source must not be empty" })),
        )
            .into_response();
    }

    let source = DocumentSource::parse(req.source.trim());
    let run_id = Uuid::new_v4().to_string();
    info!(run_id = %run_id, source = %source, "Triggering pipeline run");

    {
        let mut runs = state.runs.write().await;
        runs.push(RunStatus {
            run_id: run_id.clone(),
            source: source.to_string(),
            status: RunState::Running,
            started_at: Utc::now(),
            finished_at: None,
            outcome: None,
            attempts: 0,
            records_written: 0,
            error: None,
        });
    }

    let run_id_clone = run_id.clone();
    let runs = state.runs.clone();
    let pipeline = state.pipeline.clone();

    tokio::spawn(async move {
        let result = pipeline.run(&source).await;

        let mut runs_lock = runs.write().await;
        if let Some(run) = runs_lock.iter_mut().find(|r| r.run_id == run_id_clone) {
            run.finished_at = Some(Utc::now());
            match result {
                Ok(report) => {
                    run.status = RunState::Completed;
                    run.outcome = Some(report.outcome.kind());
                    run.attempts = report.outcome.attempts();
                    run.records_written = report.outcome.records_written();
                    info!(
                        run_id = %run_id_clone,
                        outcome = ?report.outcome.kind(),
                        attempts = run.attempts,
                        "Pipeline run completed"
                    );
                }
                Err(e) => {
                    run.status = RunState::Failed;
                    run.error = Some(e.to_string());
                    error!(run_id = %run_id_clone, error = %e, "Pipeline run failed");
                }
            }
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(RunTriggerResponse {
            run_id,
            source: req.source,
            status: "running".to_string(),
            message: "Pipeline triggered, running in background".to_string(),
        }),
    )
        .into_response()
}

/// GET /api/runs: all runs, newest first.
pub async fn list_runs(State(state): State<AppState>) -> impl IntoResponse {
    let runs = state.runs.read().await;
    let runs_vec: Vec<RunStatus> = runs.iter().rev().cloned().collect();
    (StatusCode::OK, Json(RunsResponse { runs: runs_vec }))
}

/// GET /api/runs/{id}
pub async fn get_run(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let runs = state.runs.read().await;
    match runs.iter().find(|r| r.run_id == id) {
        Some(run) => (StatusCode::OK, Json(run.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("Run '{}' not found", id) })),
        )
            .into_response(),
    }
}
