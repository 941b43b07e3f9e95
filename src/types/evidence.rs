use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::types::identifiers::DocumentId;

/// Whether the oracle produced a usable judgment for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    Scored,
    /// The justification carries the failure reason; the value is 0.0.
    Failed,
}

/// Relevance of one document to one control, as judged by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    pub document: DocumentId,
    pub value: f32,
    pub justification: String,
    pub status: ScoreStatus,
}

impl RelevanceScore {
    pub fn scored(document: DocumentId, value: f32, justification: impl Into<String>) -> Self {
        Self {
            document,
            value,
            justification: justification.into(),
            status: ScoreStatus::Scored,
        }
    }

    pub fn failed(document: DocumentId, reason: impl Into<String>) -> Self {
        Self {
            document,
            value: 0.0,
            justification: reason.into(),
            status: ScoreStatus::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ScoreStatus::Failed
    }
}

/// Internal: a document paired with its score, not yet selected.
/// Holds a reference to the original document to avoid cloning content prematurely.
#[derive(Debug, Clone)]
pub struct ScoredDocument<'a> {
    pub document: &'a Document,
    pub score: RelevanceScore,
}

/// A selected document as it appears in the report.
/// Fully self-contained and serializable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedDocument {
    pub id: DocumentId,
    pub title: String,
    pub url: String,
    pub score: f32,
    pub justification: String,
}

/// A document the oracle could not evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedEvaluation {
    pub document: DocumentId,
    pub reason: String,
}

/// Metadata describing the outcome of the selection process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionMetadata {
    /// Explicit threshold requested for this run, if any.
    pub threshold: Option<f32>,
    /// Lowest score admitted into the selection. `None` when nothing was selected.
    pub cutoff: Option<f32>,

    pub documents_considered: usize,
    pub documents_selected: usize,
    /// Members admitted below the threshold to reach `min_count`.
    pub documents_extended: usize,

    pub below_cutoff: Vec<DocumentId>,
    pub failed: Vec<FailedEvaluation>,
}

/// The bounded, ranked evidence list for one control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub documents: Vec<SelectedDocument>,
    pub selection: SelectionMetadata,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("Invalid selection constraints: {0}")]
    InvalidConstraints(String),
}
