//! In-memory collaborators for tests. Built for this crate's tests and for
//! dependents that enable the `testing` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::Token;
use crate::error::{DocgraphError, Result};
use crate::graph::{ApplyRecord, GraphApplier};
use crate::llm::{GenerationRequest, TextGenerator};

/// Replies with `responses` in order, repeating the last one once they run out,
/// and records every request it receives.
pub struct ScriptedGenerator {
    responses: Vec<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(response: &str) -> Self {
        Self::with_responses(&[response])
    }

    pub fn with_responses(responses: &[&str]) -> Self {
        Self {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn calls_to(&self, model_id: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.model_id == model_id)
            .count()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.input).collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest, _credential: &Token) -> Result<String> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len().min(self.responses.len().saturating_sub(1));
        requests.push(request.clone());
        Ok(self.responses.get(index).cloned().unwrap_or_default())
    }
}

/// Fails every call without producing text.
pub enum FailingGenerator {
    Network,
    Api { status: u16 },
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _request: &GenerationRequest, _credential: &Token) -> Result<String> {
        Err(match self {
            FailingGenerator::Network => DocgraphError::Network("connection reset".into()),
            FailingGenerator::Api { status } => DocgraphError::Api {
                status: *status,
                message: "model overloaded".into(),
            },
        })
    }
}

/// Rejects the first `failures` submissions, then accepts. Accepted scripts
/// answer with one record whose `count` is the number of non-blank lines.
pub struct ScriptedApplier {
    failures: usize,
    error: fn(usize) -> DocgraphError,
    submissions: AtomicUsize,
    scripts: Mutex<Vec<String>>,
}

impl ScriptedApplier {
    pub fn failing_times(failures: usize) -> Self {
        Self {
            failures,
            error: |submission| {
                DocgraphError::Apply(format!(
                    "Neo.ClientError.Statement.SyntaxError at submission {submission}"
                ))
            },
            submissions: AtomicUsize::new(0),
            scripts: Mutex::new(Vec::new()),
        }
    }

    pub fn healthy() -> Self {
        Self::failing_times(0)
    }

    pub fn always_failing() -> Self {
        Self::failing_times(usize::MAX)
    }

    /// Replace the rejection error; receives the 1-based submission number.
    pub fn with_error(mut self, error: fn(usize) -> DocgraphError) -> Self {
        self.error = error;
        self
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphApplier for ScriptedApplier {
    async fn apply(&self, script: &str) -> Result<Vec<ApplyRecord>> {
        let submission = self.submissions.fetch_add(1, Ordering::SeqCst);
        self.scripts.lock().unwrap().push(script.to_string());
        if submission < self.failures {
            return Err((self.error)(submission + 1));
        }
        let statements = script.lines().filter(|l| !l.trim().is_empty()).count();
        Ok(vec![ApplyRecord(serde_json::json!({ "count": statements }))])
    }
}
