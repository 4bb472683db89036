//! Fixtures for the cross-crate integration tests. Collaborator stubs come
//! from `docgraph_core::testing`.

use std::sync::Arc;

use docgraph_core::config::{InstructionSet, Token};
use docgraph_core::llm::TextGenerator;
use docgraph_extraction::LlmStages;
use docgraph_pipeline::PipelineSettings;

pub use docgraph_core::testing::{FailingGenerator, ScriptedApplier, ScriptedGenerator};

pub const INSTRUCT_MODEL: &str = "ibm/granite-3-8b-instruct";
pub const CODE_MODEL: &str = "ibm/granite-34b-code-instruct";

pub fn instructions() -> InstructionSet {
    InstructionSet {
        system_instruct_0: "Identify the core themes and their relationships as node/edge/node lines."
            .into(),
        system_instruct_1: "Translate each line into a Neo4j Cypher MERGE statement.".into(),
        system_instruct_2: "Fix any issues in the Cypher query.".into(),
    }
}

pub fn settings(max_attempts: u32) -> PipelineSettings {
    PipelineSettings {
        instructions: instructions(),
        credential: Token::new("test-token"),
        max_attempts,
    }
}

pub fn stages(generator: Arc<dyn TextGenerator>) -> LlmStages {
    LlmStages::with_models(generator, INSTRUCT_MODEL, CODE_MODEL, 900)
}

/// A generator answering a full run in call order: themes, then the draft,
/// then `repair` for every repair call.
pub fn models(themes: &str, draft: &str, repair: &str) -> Arc<ScriptedGenerator> {
    Arc::new(ScriptedGenerator::with_responses(&[themes, draft, repair]))
}
