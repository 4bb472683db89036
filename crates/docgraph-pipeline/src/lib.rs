mod pipeline;
mod retry;

pub use pipeline::{KnowledgeGraphPipeline, Outcome, PipelineReport, PipelineSettings};
pub use retry::{truncate_last_line, AppliedScript, AttemptState, RetryController};
