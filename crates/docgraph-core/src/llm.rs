use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Token;
use crate::error::Result;

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub decoding_method: String,
    pub max_new_tokens: u32,
    pub min_new_tokens: u32,
    pub repetition_penalty: f64,
}

impl GenerationParameters {
    /// Greedy decoding with no repetition penalty adjustment.
    pub fn greedy(max_new_tokens: u32) -> Self {
        Self {
            decoding_method: "greedy".to_string(),
            max_new_tokens,
            min_new_tokens: 0,
            repetition_penalty: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model_id: String,
    pub input: String,
    pub parameters: GenerationParameters,
}

/// A hosted text-generation endpoint.
///
/// Implementations return the first generated text of the response and map
/// failures onto `Api`, `Network` or `Unexpected`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest, credential: &Token) -> Result<String>;
}
