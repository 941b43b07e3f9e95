//! Control-to-document relevance via the oracle.

use thiserror::Error;
use tracing::{debug, warn};

use crate::batch::{map_bounded, Progress};
use crate::cache::KeywordSignature;
use crate::cache::DEFAULT_CONCURRENCY;
use crate::control::ControlDefinition;
use crate::oracle::prompts::MAX_SCORE;
use crate::oracle::{OracleClient, OracleError, ScoringRequest};
use crate::types::evidence::RelevanceScore;
use crate::types::identifiers::DocumentId;

/// The oracle could not judge one document. Never fatal to a batch.
#[derive(Debug, Clone, Error)]
#[error("Scoring failed for {document}: {source}")]
pub struct ScoringFailure {
    pub document: DocumentId,
    #[source]
    pub source: OracleError,
}

impl ScoringFailure {
    /// Zero-valued score carrying the failure reason as its justification.
    pub fn into_score(self) -> RelevanceScore {
        let reason = self.source.to_string();
        RelevanceScore::failed(self.document, reason)
    }
}

pub struct RelevanceScorer {
    oracle: OracleClient,
    concurrency: usize,
}

impl RelevanceScorer {
    pub fn new(oracle: OracleClient) -> Self {
        Self {
            oracle,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// One score per signature, in input order. Failures become zero-valued
    /// `Failed` scores rather than errors.
    pub async fn score(
        &self,
        control: &ControlDefinition,
        signatures: &[KeywordSignature],
    ) -> Vec<RelevanceScore> {
        let progress = Progress::new(signatures.len());
        self.score_tracked(control, signatures, &progress)
            .await
            .into_iter()
            .map(|result| result.unwrap_or_else(ScoringFailure::into_score))
            .collect()
    }

    /// Per-document results in input order, keeping failure detail for the caller.
    pub async fn score_tracked(
        &self,
        control: &ControlDefinition,
        signatures: &[KeywordSignature],
        progress: &Progress,
    ) -> Vec<Result<RelevanceScore, ScoringFailure>> {
        map_bounded(signatures, self.concurrency, |signature| async move {
            let result = self.score_one(control, signature).await;
            progress.tick();
            result
        })
        .await
    }

    async fn score_one(
        &self,
        control: &ControlDefinition,
        signature: &KeywordSignature,
    ) -> Result<RelevanceScore, ScoringFailure> {
        let request = ScoringRequest::new(control, signature);
        debug!(
            control = %control.id,
            document = %signature.document,
            prompt_bytes = request.prompt.len(),
            "Scoring document"
        );

        match self.oracle.score(&request).await {
            Ok(judgment) => Ok(RelevanceScore::scored(
                signature.document.clone(),
                judgment.value.clamp(0.0, MAX_SCORE),
                judgment.justification,
            )),
            Err(source) => {
                warn!(
                    control = %control.id,
                    document = %signature.document,
                    error = %source,
                    "Document could not be scored"
                );
                Err(ScoringFailure {
                    document: signature.document.clone(),
                    source,
                })
            }
        }
    }
}
