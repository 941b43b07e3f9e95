pub mod evidence;
pub mod identifiers;
pub mod keyword;

pub use evidence::{
    FailedEvaluation, RelevanceScore, ScoreStatus, ScoredDocument, SelectedDocument, Selection,
    SelectionError, SelectionMetadata,
};
pub use identifiers::{ContentHash, ControlId, ControlIdError, DocumentId, DocumentIdError};
pub use keyword::{normalize_keywords, Keyword};
