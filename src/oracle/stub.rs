//! Deterministic in-process oracle for tests and dry runs.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::prompts::{ExtractionRequest, ScoringRequest};
use super::{Oracle, OracleError, OracleScore};
use crate::types::identifiers::DocumentId;
use crate::types::keyword::Keyword;

#[derive(Debug, Default)]
struct StubState {
    keywords: BTreeMap<DocumentId, Vec<Keyword>>,
    scores: BTreeMap<DocumentId, OracleScore>,
    extraction_failures: BTreeMap<DocumentId, VecDeque<OracleError>>,
    scoring_failures: BTreeMap<DocumentId, VecDeque<OracleError>>,
    delays: BTreeMap<DocumentId, Duration>,
    unavailable: bool,

    extraction_prompts: Vec<String>,
    scoring_prompts: Vec<String>,
}

/// Scripted oracle that records every request it receives.
///
/// Unscripted documents get one keyword (the file stem) and a score of 5.
#[derive(Debug, Default)]
pub struct StubOracle {
    state: Mutex<StubState>,
}

impl StubOracle {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_keywords(self, document: &DocumentId, keywords: Vec<Keyword>) -> Self {
        self.state().keywords.insert(document.clone(), keywords);
        self
    }

    pub fn with_score(self, document: &DocumentId, value: f32, justification: &str) -> Self {
        self.state().scores.insert(
            document.clone(),
            OracleScore {
                value,
                justification: justification.to_string(),
            },
        );
        self
    }

    /// Fail the next extraction calls for `document` with `errors`, in order.
    pub fn fail_extraction(self, document: &DocumentId, errors: Vec<OracleError>) -> Self {
        self.state()
            .extraction_failures
            .insert(document.clone(), errors.into());
        self
    }

    /// Fail the next scoring calls for `document` with `errors`, in order.
    pub fn fail_scoring(self, document: &DocumentId, errors: Vec<OracleError>) -> Self {
        self.state()
            .scoring_failures
            .insert(document.clone(), errors.into());
        self
    }

    /// Delay every response for `document`.
    pub fn with_delay(self, document: &DocumentId, delay: Duration) -> Self {
        self.state().delays.insert(document.clone(), delay);
        self
    }

    /// Every call fails with a transport error.
    pub fn unavailable(self) -> Self {
        self.state().unavailable = true;
        self
    }

    pub fn extraction_calls(&self) -> usize {
        self.state().extraction_prompts.len()
    }

    pub fn scoring_calls(&self) -> usize {
        self.state().scoring_prompts.len()
    }

    pub fn extraction_prompts(&self) -> Vec<String> {
        self.state().extraction_prompts.clone()
    }

    pub fn scoring_prompts(&self) -> Vec<String> {
        self.state().scoring_prompts.clone()
    }

    fn delay_for(&self, document: &DocumentId) -> Option<Duration> {
        self.state().delays.get(document).copied()
    }
}

fn default_keyword(document: &DocumentId) -> Keyword {
    let stem = document
        .as_str()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim_end_matches(".md");
    Keyword::new(stem, 1.0)
}

#[async_trait]
impl Oracle for StubOracle {
    async fn extract_keywords(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Vec<Keyword>, OracleError> {
        let outcome = {
            let mut state = self.state();
            state.extraction_prompts.push(request.prompt.clone());
            if state.unavailable {
                Err(OracleError::Transport("stub oracle unavailable".to_string()))
            } else if let Some(err) = state
                .extraction_failures
                .get_mut(&request.document)
                .and_then(VecDeque::pop_front)
            {
                Err(err)
            } else {
                Ok(state
                    .keywords
                    .get(&request.document)
                    .cloned()
                    .unwrap_or_else(|| vec![default_keyword(&request.document)]))
            }
        };

        if let Some(delay) = self.delay_for(&request.document) {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    async fn score(&self, request: &ScoringRequest) -> Result<OracleScore, OracleError> {
        let outcome = {
            let mut state = self.state();
            state.scoring_prompts.push(request.prompt.clone());
            if state.unavailable {
                Err(OracleError::Transport("stub oracle unavailable".to_string()))
            } else if let Some(err) = state
                .scoring_failures
                .get_mut(&request.document)
                .and_then(VecDeque::pop_front)
            {
                Err(err)
            } else {
                Ok(state
                    .scores
                    .get(&request.document)
                    .cloned()
                    .unwrap_or_else(|| OracleScore {
                        value: 5.0,
                        justification: format!("Stub judgment for {}", request.document),
                    }))
            }
        };

        if let Some(delay) = self.delay_for(&request.document) {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}
