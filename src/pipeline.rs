//! One control run: control → signatures → scores → selection → report.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::batch::Progress;
use crate::cache::{ExtractionFailure, KeywordStore, SignatureBacking};
use crate::config::RunConfig;
use crate::control::{ControlDefinition, ControlError, ControlSource};
use crate::document::{CorpusError, Document, DocumentCorpus};
use crate::oracle::{Oracle, OracleClient};
use crate::report::{ReportEmitter, ReportError};
use crate::scoring::{RelevanceScorer, ScoringFailure};
use crate::selection::SelectionPolicy;
use crate::types::evidence::{FailedEvaluation, ScoredDocument, Selection, SelectionError};
use crate::types::identifiers::{ControlId, DocumentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Extraction,
    Scoring,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Extraction => f.write_str("keyword extraction"),
            RunPhase::Scoring => f.write_str("scoring"),
        }
    }
}

/// Failures that abort a run. Document-level failures never appear here.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    ControlNotFound(ControlError),
    #[error(transparent)]
    Control(ControlError),
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error("Oracle unavailable: all {failures} {phase} calls failed")]
    OracleUnavailable { phase: RunPhase, failures: usize },
    #[error("Run timed out during {phase} after {completed} of {total} documents")]
    TimedOut {
        phase: RunPhase,
        completed: usize,
        total: usize,
    },
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl From<ControlError> for RunError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::NotFound { .. } => RunError::ControlNotFound(err),
            other => RunError::Control(other),
        }
    }
}

impl RunError {
    /// Process exit status for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::ControlNotFound(_) => 2,
            RunError::OracleUnavailable { .. } => 3,
            RunError::TimedOut { .. } => 4,
            _ => 1,
        }
    }
}

/// Everything a run produced, including the documents it could not evaluate.
#[derive(Debug)]
pub struct RunOutcome {
    pub control: ControlDefinition,
    pub selection: Selection,
    pub extraction_failures: Vec<ExtractionFailure>,
    pub report_path: PathBuf,
}

pub struct ControlRun<C, D, B> {
    controls: C,
    corpus: D,
    store: KeywordStore<B>,
    scorer: RelevanceScorer,
    policy: SelectionPolicy,
    emitter: ReportEmitter,
    config: RunConfig,
}

impl<C, D, B> ControlRun<C, D, B>
where
    C: ControlSource,
    D: DocumentCorpus,
    B: SignatureBacking,
{
    pub fn new(
        controls: C,
        corpus: D,
        backing: B,
        oracle: Arc<dyn Oracle>,
        emitter: ReportEmitter,
        config: RunConfig,
    ) -> Self {
        let client = OracleClient::new(oracle, config.retry.clone());
        let store = KeywordStore::new(backing, client.clone())
            .with_max_keywords(config.max_keywords)
            .with_concurrency(config.concurrency);
        let scorer = RelevanceScorer::new(client).with_concurrency(config.concurrency);

        Self {
            controls,
            corpus,
            store,
            scorer,
            policy: SelectionPolicy,
            emitter,
            config,
        }
    }

    pub fn store(&self) -> &KeywordStore<B> {
        &self.store
    }

    pub async fn run(&self, id: &ControlId) -> Result<RunOutcome, RunError> {
        let control = self.controls.load(id)?;
        let documents = self.corpus.documents()?;
        info!(control = %control.display_name(), documents = documents.len(), "Starting control run");

        if documents.is_empty() {
            warn!(control = %control.id, "Empty corpus, no candidates to select");
            return self.finish(control, Vec::new(), Vec::new());
        }

        let deadline = Instant::now() + self.config.run_timeout();

        // 1. Extraction Phase
        let progress = Progress::new(documents.len());
        let extraction = timeout_at(
            deadline,
            self.store.get_signatures_tracked(&documents, &progress),
        )
        .await
        .map_err(|_| RunError::TimedOut {
            phase: RunPhase::Extraction,
            completed: progress.completed(),
            total: progress.total(),
        })?;

        let signatures = extraction.succeeded;
        let extraction_failures = extraction.failed;
        if signatures.is_empty()
            && !extraction_failures.is_empty()
            && extraction_failures.iter().all(|f| f.source.is_unavailable())
        {
            return Err(RunError::OracleUnavailable {
                phase: RunPhase::Extraction,
                failures: extraction_failures.len(),
            });
        }

        // 2. Scoring Phase
        let progress = Progress::new(signatures.len());
        let results = timeout_at(
            deadline,
            self.scorer.score_tracked(&control, &signatures, &progress),
        )
        .await
        .map_err(|_| RunError::TimedOut {
            phase: RunPhase::Scoring,
            completed: progress.completed(),
            total: progress.total(),
        })?;

        let all_unavailable = results
            .iter()
            .all(|r| matches!(r, Err(f) if f.source.is_unavailable()));
        if !results.is_empty() && all_unavailable {
            return Err(RunError::OracleUnavailable {
                phase: RunPhase::Scoring,
                failures: results.len(),
            });
        }

        // 3. Selection Phase
        let by_id: BTreeMap<&DocumentId, &Document> =
            documents.iter().map(|doc| (&doc.id, doc)).collect();

        let scored: Vec<ScoredDocument> = results
            .into_iter()
            .map(|result| result.unwrap_or_else(ScoringFailure::into_score))
            .filter_map(|score| {
                by_id.get(&score.document).map(|document| ScoredDocument {
                    document: *document,
                    score,
                })
            })
            .collect();

        self.finish(control, scored, extraction_failures)
    }

    fn finish(
        &self,
        control: ControlDefinition,
        scored: Vec<ScoredDocument<'_>>,
        extraction_failures: Vec<ExtractionFailure>,
    ) -> Result<RunOutcome, RunError> {
        let mut selection = self.policy.select(scored, &self.config.selection)?;
        let scoring_failures = selection.selection.failed.len();

        // Documents that never reached scoring count as failed evaluations
        let failed = &mut selection.selection.failed;
        failed.extend(extraction_failures.iter().map(|f| FailedEvaluation {
            document: f.document.clone(),
            reason: f.source.to_string(),
        }));
        failed.sort_by(|a, b| a.document.cmp(&b.document));

        let report_path = self.emitter.write(&control, &selection)?;

        let meta = &selection.selection;
        info!(
            control = %control.id,
            selected = meta.documents_selected,
            below_cutoff = meta.below_cutoff.len(),
            scoring_failures,
            extraction_failures = extraction_failures.len(),
            cutoff = ?meta.cutoff,
            "Control run complete"
        );
        for failed in &meta.failed {
            warn!(document = %failed.document, reason = %failed.reason, "Failed to evaluate");
        }

        Ok(RunOutcome {
            control,
            selection,
            extraction_failures,
            report_path,
        })
    }
}
