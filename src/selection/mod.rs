pub mod bounds;
pub mod constraints;
pub mod ranking;

use tracing::debug;

use crate::types::evidence::{ScoredDocument, Selection, SelectionError};
pub use bounds::{apply_bounds, BoundsResult};
pub use constraints::SelectionConstraints;
pub use ranking::{compare, rank};

/// Turns scored documents into a bounded, ranked, deduplicated selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionPolicy;

impl SelectionPolicy {
	pub fn select(
		&self,
		scored: Vec<ScoredDocument<'_>>,
		constraints: &SelectionConstraints,
	) -> Result<Selection, SelectionError> {
		constraints.validate()?;

		// 1. Ordering Phase
		// Sort globally by (evaluated first, score desc, id asc), one entry per id
		let ranked = rank(scored);

		// 2. Bounding Phase
		let BoundsResult { selected, metadata } = apply_bounds(ranked, constraints);

		debug_assert!(selected.windows(2).all(|w| {
			let a = &w[0];
			let b = &w[1];
			a.score > b.score || (a.score == b.score && a.id < b.id)
		}));

		debug!(
			considered = metadata.documents_considered,
			selected = metadata.documents_selected,
			extended = metadata.documents_extended,
			failed = metadata.failed.len(),
			"Selection complete"
		);

		Ok(Selection {
			documents: selected,
			selection: metadata,
		})
	}
}
