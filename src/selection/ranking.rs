use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::types::evidence::ScoredDocument;

/// Global order: evaluated before failed, score descending, identity ascending.
pub fn compare(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    a.score
        .is_failed()
        .cmp(&b.score.is_failed())
        .then_with(|| b.score.value.total_cmp(&a.score.value))
        .then_with(|| a.document.id.cmp(&b.document.id))
}

/// Sort by [`compare`] and keep only the best-ranked entry per identity.
pub fn rank(mut scored: Vec<ScoredDocument<'_>>) -> Vec<ScoredDocument<'_>> {
    scored.sort_by(compare);

    let mut seen = BTreeSet::new();
    scored.retain(|sdoc| seen.insert(sdoc.document.id.clone()));

    debug_assert!(scored.windows(2).all(|w| compare(&w[0], &w[1]) == Ordering::Less));
    scored
}
