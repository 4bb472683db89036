use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocgraphError, Result};

const DEFAULT_WATSONX_URL: &str =
    "https://us-south.ml.cloud.ibm.com/ml/v1/text/generation?version=2023-05-29";
const DEFAULT_INSTRUCT_MODEL: &str = "ibm/granite-3-8b-instruct";
const DEFAULT_CODE_MODEL: &str = "ibm/granite-34b-code-instruct";

/// Opaque bearer credential for the LLM endpoint. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// The three role instructions, one per LLM call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionSet {
    /// Theme extraction (instruct model).
    pub system_instruct_0: String,
    /// Cypher drafting (code model).
    pub system_instruct_1: String,
    /// Cypher repair (code model).
    pub system_instruct_2: String,
}

impl InstructionSet {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DocgraphError::Config(format!(
                "Instructions file not found: {} ({e})",
                path.display()
            ))
        })?;
        let set: InstructionSet = serde_json::from_str(&raw).map_err(|e| {
            DocgraphError::Config(format!(
                "Error decoding JSON from file {}: {e}",
                path.display()
            ))
        })?;
        set.validate()?;

        tracing::info!(path = %path.display(), "Loaded system instructions");
        Ok(set)
    }

    pub fn validate(&self) -> Result<()> {
        let slots = [
            ("system_instruct_0", &self.system_instruct_0),
            ("system_instruct_1", &self.system_instruct_1),
            ("system_instruct_2", &self.system_instruct_2),
        ];
        for (slot, value) in slots {
            if value.trim().is_empty() {
                return Err(DocgraphError::Config(format!(
                    "instruction slot {slot} is empty"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: Token,
    pub watsonx_url: String,
    pub watsonx_project_id: String,
    pub instruct_model_id: String,
    pub code_model_id: String,
    pub max_new_tokens: u32,
    pub llm_timeout_secs: u64,
    pub instructions_path: PathBuf,
    pub max_attempts: u32,
    pub max_chunk_tokens: usize,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_database: String,
    pub server_host: String,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process environment.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = var("MY_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                DocgraphError::Config("MY_TOKEN not found in environment variables".into())
            })?;

        let string_or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.into());

        let config = Self {
            token: Token::new(token),
            watsonx_url: string_or("WATSONX_URL", DEFAULT_WATSONX_URL),
            watsonx_project_id: var("WATSONX_PROJECT_ID").unwrap_or_default(),
            instruct_model_id: string_or("INSTRUCT_MODEL_ID", DEFAULT_INSTRUCT_MODEL),
            code_model_id: string_or("CODE_MODEL_ID", DEFAULT_CODE_MODEL),
            max_new_tokens: parse_or(&var, "MAX_NEW_TOKENS", 900)?,
            llm_timeout_secs: parse_or(&var, "LLM_TIMEOUT_SECS", 120)?,
            instructions_path: PathBuf::from(string_or("INSTRUCTIONS_PATH", "instructions.json")),
            max_attempts: parse_or(&var, "MAX_ATTEMPTS", 4)?,
            max_chunk_tokens: parse_or(&var, "MAX_CHUNK_TOKENS", 32_000)?,
            neo4j_uri: string_or("NEO4J_URI", "bolt://localhost:7687"),
            neo4j_user: string_or("NEO4J_USER", "neo4j"),
            neo4j_password: string_or("NEO4J_PASSWORD", "neo4j"),
            neo4j_database: string_or("NEO4J_DATABASE", "neo4j"),
            server_host: string_or("SERVER_HOST", "0.0.0.0"),
            server_port: parse_or(&var, "SERVER_PORT", 8080)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(DocgraphError::Config("MAX_ATTEMPTS must be at least 1".into()));
        }
        if self.max_new_tokens == 0 {
            return Err(DocgraphError::Config("MAX_NEW_TOKENS must be at least 1".into()));
        }
        if self.max_chunk_tokens == 0 {
            return Err(DocgraphError::Config("MAX_CHUNK_TOKENS must be at least 1".into()));
        }
        Ok(())
    }

    pub fn load_instructions(&self) -> Result<InstructionSet> {
        InstructionSet::load(&self.instructions_path)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| DocgraphError::Config(format!("{key}={raw:?} is invalid: {e}"))),
        None => Ok(default),
    }
}
