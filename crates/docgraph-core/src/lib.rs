pub mod api_types;
pub mod config;
pub mod document;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod llm;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{AppConfig, InstructionSet, Token};
pub use document::{
    CypherDraft, CypherFinal, DocumentSource, DocumentText, NormalizedExtraction,
    ThemeExtraction, TruncatedCypher,
};
pub use error::{DocgraphError, Result};
pub use extraction::TextExtractor;
pub use graph::{ApplyRecord, GraphApplier};
pub use llm::{GenerationParameters, GenerationRequest, TextGenerator};
