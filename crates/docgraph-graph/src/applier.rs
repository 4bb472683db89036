use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph};
use std::future::Future;

use docgraph_core::config::AppConfig;
use docgraph_core::error::{DocgraphError, Result};
use docgraph_core::graph::{ApplyRecord, GraphApplier};

/// Timeout for a single Neo4j operation (seconds). Generated scripts can be long.
const NEO4J_TIMEOUT_SECS: u64 = 30;

pub struct Neo4jGraphApplier {
    graph: Option<Graph>,
    database: String,
}

impl Neo4jGraphApplier {
    pub async fn new(config: &AppConfig) -> Self {
        match Self::connect(config).await {
            Ok(graph) => {
                tracing::info!(
                    uri = %config.neo4j_uri,
                    database = %config.neo4j_database,
                    "Connected to Neo4j"
                );
                Self {
                    graph: Some(graph),
                    database: config.neo4j_database.clone(),
                }
            }
            Err(e) => {
                tracing::warn!(uri = %config.neo4j_uri, error = %e, "Failed to connect to Neo4j, every apply will fail");
                Self {
                    graph: None,
                    database: config.neo4j_database.clone(),
                }
            }
        }
    }

    async fn connect(config: &AppConfig) -> std::result::Result<Graph, neo4rs::Error> {
        let neo4j_config = ConfigBuilder::default()
            .uri(config.neo4j_uri.as_str())
            .user(config.neo4j_user.as_str())
            .password(config.neo4j_password.as_str())
            .db(config.neo4j_database.as_str())
            .build()?;
        Graph::connect(neo4j_config).await
    }

    fn graph(&self) -> Result<&Graph> {
        self.graph
            .as_ref()
            .ok_or_else(|| DocgraphError::Apply("Neo4j not connected".into()))
    }

    pub fn is_connected(&self) -> bool {
        self.graph.is_some()
    }

    pub async fn node_count(&self) -> Result<u64> {
        self.count("MATCH (n) RETURN count(n) AS cnt").await
    }

    pub async fn relationship_count(&self) -> Result<u64> {
        self.count("MATCH ()-[r]->() RETURN count(r) AS cnt").await
    }

    async fn count(&self, cypher: &str) -> Result<u64> {
        let mut stream = timed(self.graph()?.execute(query(cypher)))
            .await?
            .map_err(|e| DocgraphError::Apply(format!("Failed to run count query: {e}")))?;

        match stream.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get("cnt")
                    .map_err(|e| DocgraphError::Apply(format!("Failed to get count: {e}")))?;
                Ok(count.max(0) as u64)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(DocgraphError::Apply(format!("Error reading count: {e}"))),
        }
    }
}

/// Wrap any async operation with a timeout, converting timeout to DocgraphError::Apply.
async fn timed<T, F: Future<Output = T>>(op: F) -> Result<T> {
    tokio::time::timeout(std::time::Duration::from_secs(NEO4J_TIMEOUT_SECS), op)
        .await
        .map_err(|_| {
            tracing::warn!("Neo4j operation timed out after {}s", NEO4J_TIMEOUT_SECS);
            DocgraphError::Apply(format!(
                "Neo4j operation timed out after {}s",
                NEO4J_TIMEOUT_SECS
            ))
        })
}

#[async_trait]
impl GraphApplier for Neo4jGraphApplier {
    async fn apply(&self, script: &str) -> Result<Vec<ApplyRecord>> {
        if script.trim().is_empty() {
            return Err(DocgraphError::Apply("Refusing to apply an empty script".into()));
        }

        let mut txn = timed(self.graph()?.start_txn())
            .await?
            .map_err(|e| DocgraphError::Apply(format!("Failed to start transaction: {e}")))?;

        let mut stream = timed(txn.execute(query(script)))
            .await?
            .map_err(|e| DocgraphError::Apply(format!("Failed to execute script: {e}")))?;

        let mut records = Vec::new();
        loop {
            let row = timed(stream.next(txn.handle()))
                .await?
                .map_err(|e| DocgraphError::Apply(format!("Failed to read result row: {e}")))?;
            let Some(row) = row else { break };

            let value: serde_json::Value = row
                .to()
                .unwrap_or(serde_json::Value::Object(Default::default()));
            let record = ApplyRecord(value);
            if let Some(count) = record.count() {
                tracing::info!(count, "Applied statement");
            }
            records.push(record);
        }

        timed(txn.commit())
            .await?
            .map_err(|e| DocgraphError::Apply(format!("Failed to commit transaction: {e}")))?;

        tracing::info!(
            database = %self.database,
            records = records.len(),
            script_len = script.len(),
            "Neo4j updated"
        );

        Ok(records)
    }
}
