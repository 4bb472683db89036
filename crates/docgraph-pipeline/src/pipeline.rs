use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use docgraph_core::api_types::RunOutcome;
use docgraph_core::config::{AppConfig, InstructionSet, Token};
use docgraph_core::document::{
    CypherDraft, CypherFinal, DocumentSource, DocumentText, NormalizedExtraction,
    ThemeExtraction, TruncatedCypher,
};
use docgraph_core::error::{DocgraphError, Result};
use docgraph_core::extraction::TextExtractor;
use docgraph_core::graph::{ApplyRecord, GraphApplier};
use docgraph_extraction::{normalize, LlmStages};

use crate::retry::RetryController;

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub instructions: InstructionSet,
    pub credential: Token,
    pub max_attempts: u32,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig, instructions: InstructionSet) -> Self {
        Self {
            instructions,
            credential: config.token.clone(),
            max_attempts: config.max_attempts,
        }
    }
}

/// How the graph write ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// A repaired script was accepted.
    Applied {
        script: CypherFinal,
        attempts: u32,
        records: Vec<ApplyRecord>,
    },
    /// Retries ran out; the truncated draft was accepted instead.
    DegradedApplied {
        script: TruncatedCypher,
        attempts: u32,
        records: Vec<ApplyRecord>,
    },
    /// Retries ran out and the truncated draft failed too.
    DegradedFailure { attempts: u32, reason: String },
}

impl Outcome {
    pub fn kind(&self) -> RunOutcome {
        match self {
            Outcome::Applied { .. } => RunOutcome::Applied,
            Outcome::DegradedApplied { .. } => RunOutcome::DegradedApplied,
            Outcome::DegradedFailure { .. } => RunOutcome::DegradedFailure,
        }
    }

    /// Submissions of repaired scripts, excluding the fallback submission.
    pub fn attempts(&self) -> u32 {
        match self {
            Outcome::Applied { attempts, .. }
            | Outcome::DegradedApplied { attempts, .. }
            | Outcome::DegradedFailure { attempts, .. } => *attempts,
        }
    }

    /// Retries consumed on the primary path; `None` unless it succeeded.
    pub fn retries(&self) -> Option<u32> {
        match self {
            Outcome::Applied { attempts, .. } => Some(attempts.saturating_sub(1)),
            _ => None,
        }
    }

    /// Sum of the `count` fields reported by the graph database.
    pub fn records_written(&self) -> u64 {
        self.records()
            .iter()
            .filter_map(|r| r.count())
            .map(|c| c.max(0) as u64)
            .sum()
    }

    pub fn records(&self) -> &[ApplyRecord] {
        match self {
            Outcome::Applied { records, .. } | Outcome::DegradedApplied { records, .. } => {
                records
            }
            Outcome::DegradedFailure { .. } => &[],
        }
    }
}

/// Every intermediate payload of a run, plus its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub themes: ThemeExtraction,
    pub normalized: NormalizedExtraction,
    pub draft: CypherDraft,
    pub outcome: Outcome,
}

/// Document → themes → normalized lines → Cypher draft → repair/apply with retry.
pub struct KnowledgeGraphPipeline {
    extractor: Arc<dyn TextExtractor>,
    stages: LlmStages,
    applier: Arc<dyn GraphApplier>,
    settings: PipelineSettings,
}

impl KnowledgeGraphPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        stages: LlmStages,
        applier: Arc<dyn GraphApplier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor,
            stages,
            applier,
            settings,
        }
    }

    #[instrument(skip_all, fields(source = %source))]
    pub async fn run(&self, source: &DocumentSource) -> Result<PipelineReport> {
        let document = self.extractor.extract(source).await?;
        info!(document_len = document.as_str().len(), "Document text extracted");
        self.run_text(document).await
    }

    pub async fn run_text(&self, document: DocumentText) -> Result<PipelineReport> {
        let instructions = &self.settings.instructions;
        let credential = &self.settings.credential;

        let themes = self
            .stages
            .extract_themes(&instructions.system_instruct_0, &document, credential)
            .await?;

        let normalized = normalize(&themes);
        info!(
            lines = normalized.as_str().lines().count(),
            "Normalized theme extraction"
        );

        let draft = self
            .stages
            .draft_cypher(&normalized, &instructions.system_instruct_1, credential)
            .await?;

        let controller = RetryController::new(&self.stages, self.applier.as_ref());
        let outcome = match controller
            .apply_with_retry(
                &draft,
                &instructions.system_instruct_2,
                credential,
                self.settings.max_attempts,
            )
            .await
        {
            Ok(applied) => Outcome::Applied {
                script: applied.script,
                attempts: applied.attempts,
                records: applied.records,
            },
            Err(DocgraphError::RetriesExhausted {
                attempts,
                last_error,
            }) => {
                warn!(attempts, last_error = %last_error, "Falling back to truncated draft");
                match controller.apply_truncated(&draft).await {
                    Ok((script, records)) => Outcome::DegradedApplied {
                        script,
                        attempts,
                        records,
                    },
                    Err(e) => {
                        error!(error = %e, "Truncated Cypher failed, giving up");
                        Outcome::DegradedFailure {
                            attempts,
                            reason: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => return Err(e),
        };

        info!(
            outcome = ?outcome.kind(),
            attempts = outcome.attempts(),
            records = outcome.records().len(),
            "Pipeline finished"
        );

        Ok(PipelineReport {
            themes,
            normalized,
            draft,
            outcome,
        })
    }
}
