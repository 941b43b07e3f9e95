use crate::types::evidence::{
    FailedEvaluation, ScoredDocument, SelectedDocument, SelectionMetadata,
};

use super::constraints::SelectionConstraints;

pub struct BoundsResult {
    pub selected: Vec<SelectedDocument>,
    pub metadata: SelectionMetadata,
}

/// Cut a ranked, deduplicated list down to the selection.
///
/// Documents at or above the cutoff are taken up to `max_count`. When that
/// leaves fewer than `min_count`, the next-best evaluated documents are added
/// regardless of cutoff. Failed evaluations are never selected.
pub fn apply_bounds(ranked: Vec<ScoredDocument>, constraints: &SelectionConstraints) -> BoundsResult {
    let documents_considered = ranked.len();
    let (eligible, failed): (Vec<ScoredDocument>, Vec<ScoredDocument>) =
        ranked.into_iter().partition(|sdoc| !sdoc.score.is_failed());

    let above_cutoff = match eligible.first() {
        Some(top) => eligible
            .iter()
            .take_while(|sdoc| constraints.admits(sdoc.score.value, top.score.value))
            .count(),
        None => 0,
    };

    let within_max = above_cutoff.min(constraints.max_count);
    let take = within_max.max(constraints.min_count.min(eligible.len()));
    let documents_extended = take - within_max;

    let mut selected = Vec::with_capacity(take);
    let mut below_cutoff = Vec::new();
    for (rank, sdoc) in eligible.into_iter().enumerate() {
        if rank < take {
            selected.push(SelectedDocument {
                id: sdoc.document.id.clone(),
                title: sdoc.document.title.clone(),
                url: sdoc.document.url.clone(),
                score: sdoc.score.value,
                justification: sdoc.score.justification,
            });
        } else {
            below_cutoff.push(sdoc.document.id.clone());
        }
    }

    let failed = failed
        .into_iter()
        .map(|sdoc| FailedEvaluation {
            document: sdoc.document.id.clone(),
            reason: sdoc.score.justification,
        })
        .collect();

    let metadata = SelectionMetadata {
        threshold: constraints.threshold,
        cutoff: selected.last().map(|last| last.score),
        documents_considered,
        documents_selected: selected.len(),
        documents_extended,
        below_cutoff,
        failed,
    };

    BoundsResult { selected, metadata }
}
