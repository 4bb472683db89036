use std::sync::Arc;

use tokio::sync::RwLock;

use docgraph_core::api_types::RunStatus;
use docgraph_graph::Neo4jGraphApplier;
use docgraph_pipeline::KnowledgeGraphPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<KnowledgeGraphPipeline>,
    pub graph: Arc<Neo4jGraphApplier>,
    pub runs: Arc<RwLock<Vec<RunStatus>>>,
}
