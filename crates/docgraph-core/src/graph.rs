use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One result row returned while applying a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplyRecord(pub serde_json::Value);

impl ApplyRecord {
    pub fn count(&self) -> Option<i64> {
        self.0.get("count").and_then(|c| c.as_i64())
    }
}

/// Executes a Cypher script against the graph database.
///
/// The call is atomic-or-failing from the caller's point of view; every
/// failure is reported as `DocgraphError::Apply`.
#[async_trait]
pub trait GraphApplier: Send + Sync {
    async fn apply(&self, script: &str) -> Result<Vec<ApplyRecord>>;
}
