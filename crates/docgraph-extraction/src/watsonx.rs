use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docgraph_core::config::{AppConfig, Token};
use docgraph_core::error::{DocgraphError, Result};
use docgraph_core::llm::{GenerationParameters, GenerationRequest, TextGenerator};

/// Client for the watsonx.ai text generation endpoint.
pub struct WatsonxClient {
    client: reqwest::Client,
    url: String,
    project_id: String,
}

// ── watsonx.ai request/response types ──────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerationBody<'a> {
    input: &'a str,
    parameters: &'a GenerationParameters,
    model_id: &'a str,
    project_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
    #[serde(default)]
    stop_reason: Option<String>,
}

// ── Implementation ─────────────────────────────────────────────────────────

impl WatsonxClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .map_err(|e| DocgraphError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.watsonx_url.clone(),
            project_id: config.watsonx_project_id.clone(),
        })
    }

    fn first_generated_text(body: &str) -> Result<String> {
        let response: GenerationResponse = serde_json::from_str(body).map_err(|e| {
            DocgraphError::Unexpected(format!("Failed to parse generation response: {e}"))
        })?;

        let first = response.results.into_iter().next().ok_or_else(|| {
            DocgraphError::Unexpected("Generation response contained no results".to_string())
        })?;

        tracing::debug!(
            stop_reason = ?first.stop_reason,
            response_len = first.generated_text.len(),
            "Received generation response"
        );

        Ok(first.generated_text)
    }
}

fn transport_error(e: reqwest::Error) -> DocgraphError {
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        DocgraphError::Network(format!("Request error occurred: {e}"))
    } else {
        DocgraphError::Unexpected(format!("An error occurred: {e}"))
    }
}

#[async_trait]
impl TextGenerator for WatsonxClient {
    async fn generate(&self, request: &GenerationRequest, credential: &Token) -> Result<String> {
        let body = GenerationBody {
            input: &request.input,
            parameters: &request.parameters,
            model_id: &request.model_id,
            project_id: &self.project_id,
        };

        tracing::debug!(
            model = %request.model_id,
            input_len = request.input.len(),
            "Sending generation request to watsonx.ai"
        );

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(DocgraphError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(transport_error)?;
        Self::first_generated_text(&text)
    }
}
