use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use docgraph_core::{AppConfig, DocgraphError, DocumentSource, Result};
use docgraph_extraction::{ChunkedTextExtractor, LlmStages, WatsonxClient};
use docgraph_graph::Neo4jGraphApplier;
use docgraph_pipeline::{KnowledgeGraphPipeline, Outcome, PipelineSettings};

mod handlers;
mod routes;
mod state;

use state::AppState;

/// Turn documents into a Neo4j knowledge graph with hosted LLMs.
#[derive(Debug, Parser)]
#[command(name = "docgraph", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest a single document and exit
    Run {
        /// File path or http(s) URL of the document
        source: String,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP API
    Serve,
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("docgraph=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!(error = %e, "docgraph failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing::info!("Credential loaded");

    let instructions = config.load_instructions()?;
    let graph = Arc::new(Neo4jGraphApplier::new(&config).await);
    let pipeline = Arc::new(build_pipeline(&config, instructions, graph.clone())?);

    match cli.command {
        Command::Run { source, json } => run_once(&pipeline, &source, json).await,
        Command::Serve => serve(&config, pipeline, graph).await,
    }
}

fn build_pipeline(
    config: &AppConfig,
    instructions: docgraph_core::InstructionSet,
    graph: Arc<Neo4jGraphApplier>,
) -> Result<KnowledgeGraphPipeline> {
    let generator = Arc::new(WatsonxClient::new(config)?);
    let extractor = Arc::new(ChunkedTextExtractor::new(config)?);
    let stages = LlmStages::new(generator, config);

    Ok(KnowledgeGraphPipeline::new(
        extractor,
        stages,
        graph,
        PipelineSettings::from_config(config, instructions),
    ))
}

async fn run_once(pipeline: &KnowledgeGraphPipeline, source: &str, json: bool) -> Result<()> {
    let report = pipeline.run(&DocumentSource::parse(source)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &report.outcome {
        Outcome::Applied { attempts, records, .. } => {
            println!(
                "Graph updated after {attempts} attempt(s), {} record(s) returned",
                records.len()
            );
        }
        Outcome::DegradedApplied { attempts, records, .. } => {
            println!(
                "Repaired script failed {attempts} time(s); truncated draft applied, {} record(s) returned",
                records.len()
            );
        }
        Outcome::DegradedFailure { attempts, reason } => {
            println!("Repaired script failed {attempts} time(s); truncated draft failed: {reason}");
        }
    }
    Ok(())
}

async fn serve(
    config: &AppConfig,
    pipeline: Arc<KnowledgeGraphPipeline>,
    graph: Arc<Neo4jGraphApplier>,
) -> Result<()> {
    let state = AppState {
        pipeline,
        graph,
        runs: Arc::new(RwLock::new(Vec::new())),
    };

    let app = routes::create_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("docgraph server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DocgraphError::Config(format!("failed to bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| DocgraphError::Unexpected(format!("server error: {e}")))
}
