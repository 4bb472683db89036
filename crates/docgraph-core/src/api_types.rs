use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Health ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub neo4j_connected: bool,
    pub node_count: u64,
    pub relationship_count: u64,
}

// --- Runs ---

#[derive(Debug, Serialize, Deserialize)]
pub struct RunTriggerRequest {
    /// File path or http(s) URL of the document to ingest.
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunTriggerResponse {
    pub run_id: String,
    pub source: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Completed,
    Failed,
}

/// How a completed run ended up writing to the graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Applied,
    DegradedApplied,
    DegradedFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub run_id: String,
    pub source: String,
    pub status: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: Option<RunOutcome>,
    pub attempts: u32,
    /// Sum of the `count` fields returned by the graph database.
    pub records_written: u64,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunsResponse {
    pub runs: Vec<RunStatus>,
}
