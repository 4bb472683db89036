use chrono::Utc;
use uuid::Uuid;

use docgraph_core::api_types::{
    HealthResponse, RunOutcome, RunState, RunStatus, RunTriggerRequest, RunTriggerResponse,
    RunsResponse,
};

fn completed_run(outcome: RunOutcome, attempts: u32) -> RunStatus {
    let now = Utc::now();
    RunStatus {
        run_id: Uuid::new_v4().to_string(),
        source: "reports/energy.txt".to_string(),
        status: RunState::Completed,
        started_at: now,
        finished_at: Some(now),
        outcome: Some(outcome),
        attempts,
        records_written: 1,
        error: None,
    }
}

// ---------------------------------------------------------------------------
// HealthResponse serialization/deserialization
// ---------------------------------------------------------------------------

#[test]
fn health_response_roundtrip() {
    let hr = HealthResponse {
        status: "ok".to_string(),
        version: "0.1.0".to_string(),
        neo4j_connected: true,
        node_count: 120,
        relationship_count: 340,
    };

    let json = serde_json::to_string(&hr).expect("failed to serialize HealthResponse");
    let deserialized: HealthResponse =
        serde_json::from_str(&json).expect("failed to deserialize HealthResponse");

    assert_eq!(deserialized.status, "ok");
    assert_eq!(deserialized.version, "0.1.0");
    assert!(deserialized.neo4j_connected);
    assert_eq!(deserialized.node_count, 120);
    assert_eq!(deserialized.relationship_count, 340);
}

// ---------------------------------------------------------------------------
// Run trigger request/response
// ---------------------------------------------------------------------------

#[test]
fn run_trigger_request_from_client_json() {
    let req: RunTriggerRequest =
        serde_json::from_str(r#"{"source": "https://example.org/report.txt"}"#)
            .expect("failed to deserialize RunTriggerRequest");
    assert_eq!(req.source, "https://example.org/report.txt");
}

#[test]
fn run_trigger_request_requires_source() {
    let result = serde_json::from_str::<RunTriggerRequest>("{}");
    assert!(result.is_err());
}

#[test]
fn run_trigger_response_roundtrip() {
    let run_id = Uuid::new_v4().to_string();
    let resp = RunTriggerResponse {
        run_id: run_id.clone(),
        source: "reports/energy.txt".to_string(),
        status: "running".to_string(),
        message: "Pipeline triggered, running in background".to_string(),
    };

    let json = serde_json::to_string(&resp).expect("failed to serialize RunTriggerResponse");
    let deserialized: RunTriggerResponse =
        serde_json::from_str(&json).expect("failed to deserialize RunTriggerResponse");

    assert_eq!(deserialized.run_id, run_id);
    assert_eq!(deserialized.status, "running");
}

// ---------------------------------------------------------------------------
// Run state and outcome wire names
// ---------------------------------------------------------------------------

#[test]
fn run_state_uses_snake_case() {
    assert_eq!(serde_json::to_value(RunState::Running).unwrap(), "running");
    assert_eq!(serde_json::to_value(RunState::Completed).unwrap(), "completed");
    assert_eq!(serde_json::to_value(RunState::Failed).unwrap(), "failed");
}

#[test]
fn run_outcome_uses_snake_case() {
    assert_eq!(serde_json::to_value(RunOutcome::Applied).unwrap(), "applied");
    assert_eq!(
        serde_json::to_value(RunOutcome::DegradedApplied).unwrap(),
        "degraded_applied"
    );
    let parsed: RunOutcome = serde_json::from_str(r#""degraded_failure""#).unwrap();
    assert_eq!(parsed, RunOutcome::DegradedFailure);
}

// ---------------------------------------------------------------------------
// RunStatus / RunsResponse
// ---------------------------------------------------------------------------

#[test]
fn running_status_has_null_outcome() {
    let status = RunStatus {
        run_id: Uuid::new_v4().to_string(),
        source: "reports/energy.txt".to_string(),
        status: RunState::Running,
        started_at: Utc::now(),
        finished_at: None,
        outcome: None,
        attempts: 0,
        records_written: 0,
        error: None,
    };

    let json = serde_json::to_value(&status).expect("failed to serialize RunStatus");
    assert_eq!(json["status"], "running");
    assert!(json["outcome"].is_null());
    assert!(json["finished_at"].is_null());
}

#[test]
fn failed_status_roundtrip_keeps_error() {
    let mut status = completed_run(RunOutcome::Applied, 0);
    status.status = RunState::Failed;
    status.outcome = None;
    status.error = Some("Network error: connection refused".to_string());

    let json = serde_json::to_string(&status).expect("failed to serialize RunStatus");
    let deserialized: RunStatus =
        serde_json::from_str(&json).expect("failed to deserialize RunStatus");

    assert_eq!(deserialized.status, RunState::Failed);
    assert_eq!(
        deserialized.error.as_deref(),
        Some("Network error: connection refused")
    );
    assert_eq!(deserialized.started_at, status.started_at);
}

#[test]
fn runs_response_roundtrip() {
    let response = RunsResponse {
        runs: vec![
            completed_run(RunOutcome::Applied, 1),
            completed_run(RunOutcome::DegradedApplied, 4),
            completed_run(RunOutcome::DegradedFailure, 4),
        ],
    };

    let json = serde_json::to_string(&response).expect("failed to serialize RunsResponse");
    let deserialized: RunsResponse =
        serde_json::from_str(&json).expect("failed to deserialize RunsResponse");

    assert_eq!(deserialized.runs.len(), 3);
    assert_eq!(deserialized.runs[0].outcome, Some(RunOutcome::Applied));
    assert_eq!(deserialized.runs[1].attempts, 4);
    assert_eq!(
        deserialized.runs[2].outcome,
        Some(RunOutcome::DegradedFailure)
    );
    assert_ne!(deserialized.runs[0].run_id, deserialized.runs[1].run_id);
}
