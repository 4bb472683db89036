use std::sync::Arc;

use docgraph_core::config::{AppConfig, Token};
use docgraph_core::document::{
    CypherDraft, CypherFinal, DocumentText, NormalizedExtraction, ThemeExtraction,
};
use docgraph_core::error::{DocgraphError, Result};
use docgraph_core::llm::{GenerationParameters, GenerationRequest, TextGenerator};

const ANALYST_PREAMBLE: &str = "You are Granite, an AI language model developed by IBM. \
You are an insightful assistant, carefully analyzing the provided text to identify the core \
themes, key topics, and important relationships.";

const CODE_PREAMBLE: &str = "You are an intelligent AI programming assistant, utilizing a \
Granite code language model developed by IBM. Your primary function is to assist users in \
programming tasks, including code generation, code explanation and code fixing.";

/// The three LLM call sites of the pipeline: theme extraction on the instruct
/// model, then Cypher drafting and repair on the code model.
#[derive(Clone)]
pub struct LlmStages {
    generator: Arc<dyn TextGenerator>,
    instruct_model: String,
    code_model: String,
    parameters: GenerationParameters,
}

impl LlmStages {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &AppConfig) -> Self {
        Self::with_models(
            generator,
            config.instruct_model_id.clone(),
            config.code_model_id.clone(),
            config.max_new_tokens,
        )
    }

    pub fn with_models(
        generator: Arc<dyn TextGenerator>,
        instruct_model: impl Into<String>,
        code_model: impl Into<String>,
        max_new_tokens: u32,
    ) -> Self {
        Self {
            generator,
            instruct_model: instruct_model.into(),
            code_model: code_model.into(),
            parameters: GenerationParameters::greedy(max_new_tokens),
        }
    }

    fn build_theme_prompt(instruction: &str, document: &str) -> String {
        format!(
            "<|start_of_role|>system<|end_of_role|>{ANALYST_PREAMBLE} {instruction}<|end_of_text|>\n\
             <|start_of_role|>assistant<|end_of_role|>\n\
             \n\
             %%start\n\
             {document}\n\
             %%end\n"
        )
    }

    fn build_code_prompt(instruction: &str, input: &str) -> String {
        format!(
            "System:\n\
             {CODE_PREAMBLE}\n\
             {instruction}\n\
             \n\
             %%start\n\
             {input}\n\
             %%end\n\
             Answer:\n"
        )
    }

    /// Ask the instruct model for the themes, entities and relationships of a document.
    pub async fn extract_themes(
        &self,
        instruction: &str,
        document: &DocumentText,
        credential: &Token,
    ) -> Result<ThemeExtraction> {
        require_inputs(
            [("instruction", instruction), ("document text", document.as_str())],
            credential,
        )?;

        tracing::info!(
            model = %self.instruct_model,
            document_len = document.as_str().len(),
            "Extracting themes from document"
        );

        let request = GenerationRequest {
            model_id: self.instruct_model.clone(),
            input: Self::build_theme_prompt(instruction, document.as_str()),
            parameters: self.parameters.clone(),
        };
        let text = self.generator.generate(&request, credential).await?;

        tracing::info!(response_len = text.len(), "Theme extraction complete");
        Ok(ThemeExtraction::new(text))
    }

    /// Run the code model on `input` under `instruction`. Drafting and repair
    /// both go through here.
    pub async fn generate_code(
        &self,
        input: &str,
        instruction: &str,
        credential: &Token,
    ) -> Result<String> {
        require_inputs([("input", input), ("instruction", instruction)], credential)?;

        let request = GenerationRequest {
            model_id: self.code_model.clone(),
            input: Self::build_code_prompt(instruction, input),
            parameters: self.parameters.clone(),
        };
        self.generator.generate(&request, credential).await
    }

    pub async fn draft_cypher(
        &self,
        extraction: &NormalizedExtraction,
        instruction: &str,
        credential: &Token,
    ) -> Result<CypherDraft> {
        tracing::info!(model = %self.code_model, "Drafting Cypher script");
        let script = self
            .generate_code(extraction.as_str(), instruction, credential)
            .await?;
        tracing::debug!(script_len = script.len(), "Cypher draft generated");
        Ok(CypherDraft::new(script))
    }

    pub async fn repair_cypher(
        &self,
        draft: &CypherDraft,
        instruction: &str,
        credential: &Token,
    ) -> Result<CypherFinal> {
        tracing::info!(model = %self.code_model, "Repairing Cypher draft");
        let script = self
            .generate_code(draft.as_str(), instruction, credential)
            .await?;
        tracing::debug!(script_len = script.len(), "Cypher repair generated");
        Ok(CypherFinal::new(script))
    }
}

fn require_inputs<const N: usize>(inputs: [(&str, &str); N], credential: &Token) -> Result<()> {
    for (name, value) in inputs {
        if value.is_empty() {
            return Err(DocgraphError::InvalidInput(format!("{name} must not be empty")));
        }
    }
    if credential.is_empty() {
        return Err(DocgraphError::InvalidInput("credential must not be empty".into()));
    }
    Ok(())
}
