use tracing::{error, info, warn};

use docgraph_core::config::Token;
use docgraph_core::document::{CypherDraft, CypherFinal, TruncatedCypher};
use docgraph_core::error::{DocgraphError, Result};
use docgraph_core::graph::{ApplyRecord, GraphApplier};
use docgraph_extraction::LlmStages;

/// Bookkeeping for one `apply_with_retry` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptState {
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub success: bool,
}

impl AttemptState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt_count: 0,
            max_attempts,
            success: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }
}

/// A repaired script the graph database accepted.
#[derive(Debug, Clone)]
pub struct AppliedScript {
    pub script: CypherFinal,
    /// Submissions made, including the successful one.
    pub attempts: u32,
    pub records: Vec<ApplyRecord>,
}

/// Drop the last line of a draft, the usual home of an unterminated clause.
pub fn truncate_last_line(draft: &CypherDraft) -> TruncatedCypher {
    let lines: Vec<&str> = draft.as_str().trim().split('\n').collect();
    let keep = lines.len().saturating_sub(1);
    TruncatedCypher::new(lines[..keep].join("\n"))
}

/// Repairs a draft and submits it, retrying on graph failures only.
/// Errors from the repair call are never retried.
pub struct RetryController<'a> {
    stages: &'a LlmStages,
    applier: &'a dyn GraphApplier,
}

impl<'a> RetryController<'a> {
    pub fn new(stages: &'a LlmStages, applier: &'a dyn GraphApplier) -> Self {
        Self { stages, applier }
    }

    /// Each iteration repairs the same `draft` afresh and submits the result.
    ///
    /// Any error from the applier is logged and retried until `max_attempts`
    /// submissions have failed, which yields `RetriesExhausted`. Any error from
    /// the repair call itself is returned immediately.
    pub async fn apply_with_retry(
        &self,
        draft: &CypherDraft,
        repair_instruction: &str,
        credential: &Token,
        max_attempts: u32,
    ) -> Result<AppliedScript> {
        let mut state = AttemptState::new(max_attempts);
        let mut last_error = String::from("no attempt was made");

        while !state.is_exhausted() {
            let script = self
                .stages
                .repair_cypher(draft, repair_instruction, credential)
                .await?;

            match self.applier.apply(script.as_str()).await {
                Ok(records) => {
                    state.success = true;
                    let attempts = state.attempt_count + 1;
                    info!(attempts, records = records.len(), "Query executed successfully");
                    return Ok(AppliedScript {
                        script,
                        attempts,
                        records,
                    });
                }
                Err(e) => {
                    state.attempt_count += 1;
                    warn!(
                        error = %e,
                        apply_error = e.is_apply(),
                        attempt = state.attempt_count,
                        max_attempts = state.max_attempts,
                        "Graph apply failed, retrying with a fresh repair"
                    );
                    last_error = e.to_string();
                }
            }
        }

        error!(attempts = state.attempt_count, "Max retries reached, query failed");
        Err(DocgraphError::RetriesExhausted {
            attempts: state.attempt_count,
            last_error,
        })
    }

    /// One direct submission of the truncated original draft, no repair.
    pub async fn apply_truncated(
        &self,
        draft: &CypherDraft,
    ) -> Result<(TruncatedCypher, Vec<ApplyRecord>)> {
        let truncated = truncate_last_line(draft);
        info!(
            script_len = truncated.as_str().len(),
            "Attempting truncated Cypher"
        );
        let records = self.applier.apply(truncated.as_str()).await?;
        Ok((truncated, records))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use docgraph_core::llm::TextGenerator;
    use docgraph_core::testing::{FailingGenerator, ScriptedApplier, ScriptedGenerator};

    fn stages_with(generator: Arc<dyn TextGenerator>) -> LlmStages {
        LlmStages::with_models(generator, "instruct-model", "code-model", 900)
    }

    const DRAFT: &str = "MERGE (a:Topic {name: 'Energy'})\nMERGE (b:Topic {name: 'Cooling'})\nMERGE (a)-[:DRIVES]->(";

    #[test]
    fn truncation_drops_last_line() {
        let draft = CypherDraft::from("LINE1\nLINE2\nLINE3");
        assert_eq!(truncate_last_line(&draft).as_str(), "LINE1\nLINE2");
    }

    #[test]
    fn truncation_of_single_line_is_empty() {
        assert_eq!(truncate_last_line(&CypherDraft::from("LINE1")).as_str(), "");
        assert_eq!(truncate_last_line(&CypherDraft::from("")).as_str(), "");
    }

    #[test]
    fn truncation_ignores_trailing_newlines() {
        let draft = CypherDraft::from("LINE1\nLINE2\n\n");
        assert_eq!(truncate_last_line(&draft).as_str(), "LINE1");
    }

    #[test]
    fn attempt_state_exhaustion() {
        let mut state = AttemptState::new(2);
        assert!(!state.is_exhausted());
        state.attempt_count = 2;
        assert!(state.is_exhausted());
        assert!(AttemptState::new(0).is_exhausted());
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let generator = Arc::new(ScriptedGenerator::new("MERGE (t:Topic {name: 'Energy'})"));
        let stages = stages_with(generator.clone());
        let applier = ScriptedApplier::failing_times(2);
        let controller = RetryController::new(&stages, &applier);

        let applied = controller
            .apply_with_retry(&CypherDraft::from(DRAFT), "fix", &Token::new("t"), 4)
            .await
            .unwrap();

        assert_eq!(applied.attempts, 3);
        assert_eq!(applier.submissions(), 3);
        assert_eq!(generator.calls(), 3);
        assert_eq!(applied.script.as_str(), "MERGE (t:Topic {name: 'Energy'})");
    }

    #[tokio::test]
    async fn first_try_success_repairs_once() {
        let generator = Arc::new(ScriptedGenerator::new("MERGE (t:Topic)"));
        let stages = stages_with(generator.clone());
        let applier = ScriptedApplier::healthy();
        let controller = RetryController::new(&stages, &applier);

        let applied = controller
            .apply_with_retry(&CypherDraft::from(DRAFT), "fix", &Token::new("t"), 4)
            .await
            .unwrap();

        assert_eq!(applied.attempts, 1);
        assert_eq!(generator.calls(), 1);
        assert_eq!(applier.submissions(), 1);
    }

    #[tokio::test]
    async fn repair_always_sees_the_original_draft() {
        let generator = Arc::new(ScriptedGenerator::new("MERGE (t:Topic)"));
        let stages = stages_with(generator.clone());
        let applier = ScriptedApplier::failing_times(2);
        let controller = RetryController::new(&stages, &applier);

        controller
            .apply_with_retry(&CypherDraft::from(DRAFT), "fix", &Token::new("t"), 4)
            .await
            .unwrap();

        let inputs = generator.inputs();
        assert_eq!(inputs.len(), 3);
        assert!(inputs
            .iter()
            .all(|input| input.contains(&format!("%%start\n{DRAFT}\n%%end"))));
    }

    #[tokio::test]
    async fn exhaustion_after_max_attempts() {
        let generator = Arc::new(ScriptedGenerator::new("MERGE (t:Topic)"));
        let stages = stages_with(generator.clone());
        let applier = ScriptedApplier::always_failing();
        let controller = RetryController::new(&stages, &applier);

        let err = controller
            .apply_with_retry(&CypherDraft::from(DRAFT), "fix", &Token::new("t"), 4)
            .await
            .unwrap_err();

        assert!(matches!(err, DocgraphError::RetriesExhausted { attempts: 4, .. }));
        assert_eq!(applier.submissions(), 4);
        assert_eq!(generator.calls(), 4);
    }

    #[tokio::test]
    async fn llm_failure_during_repair_is_not_retried() {
        let stages = stages_with(Arc::new(FailingGenerator::Network));
        let applier = ScriptedApplier::always_failing();
        let controller = RetryController::new(&stages, &applier);

        let err = controller
            .apply_with_retry(&CypherDraft::from(DRAFT), "fix", &Token::new("t"), 4)
            .await
            .unwrap_err();

        assert!(matches!(err, DocgraphError::Network(_)));
        assert_eq!(applier.submissions(), 0);
    }

    #[tokio::test]
    async fn truncated_submission_uses_draft_without_last_line() {
        let stages = stages_with(Arc::new(ScriptedGenerator::new("unused")));
        let applier = ScriptedApplier::healthy();
        let controller = RetryController::new(&stages, &applier);

        let (truncated, _) = controller
            .apply_truncated(&CypherDraft::from(DRAFT))
            .await
            .unwrap();

        assert_eq!(
            truncated.as_str(),
            "MERGE (a:Topic {name: 'Energy'})\nMERGE (b:Topic {name: 'Cooling'})"
        );
        assert_eq!(applier.scripts(), vec![truncated.into_inner()]);
    }

    #[tokio::test]
    async fn non_apply_graph_failures_are_retried_too() {
        let generator = Arc::new(ScriptedGenerator::new("MERGE (t:Topic)"));
        let stages = stages_with(generator.clone());
        let applier = ScriptedApplier::failing_times(2)
            .with_error(|n| DocgraphError::Unexpected(format!("bolt connection dropped ({n})")));
        let controller = RetryController::new(&stages, &applier);

        let applied = controller
            .apply_with_retry(&CypherDraft::from(DRAFT), "fix", &Token::new("t"), 4)
            .await
            .unwrap();

        assert_eq!(applied.attempts, 3);
        assert_eq!(applier.submissions(), 3);
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn non_apply_graph_failures_exhaust_like_apply_failures() {
        let stages = stages_with(Arc::new(ScriptedGenerator::new("MERGE (t:Topic)")));
        let applier = ScriptedApplier::always_failing()
            .with_error(|_| DocgraphError::Network("connection refused".into()));
        let controller = RetryController::new(&stages, &applier);

        let err = controller
            .apply_with_retry(&CypherDraft::from(DRAFT), "fix", &Token::new("t"), 2)
            .await
            .unwrap_err();

        match err {
            DocgraphError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("connection refused"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(applier.submissions(), 2);
    }
}
