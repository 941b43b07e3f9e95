use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One extracted topic word and the oracle's confidence that it describes the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub weight: f32,
}

impl Keyword {
    pub fn new(word: impl Into<String>, weight: f32) -> Self {
        Self {
            word: word.into(),
            weight,
        }
    }
}

/// Canonical keyword order: trimmed, lowercased, deduplicated (highest weight
/// wins), weights clamped to `[0, 1]`, sorted by weight desc then word asc,
/// truncated to `limit`.
pub fn normalize_keywords(raw: Vec<Keyword>, limit: usize) -> Vec<Keyword> {
    let mut best: BTreeMap<String, f32> = BTreeMap::new();
    for keyword in raw {
        let word = keyword.word.trim().to_lowercase();
        if word.is_empty() {
            continue;
        }
        let weight = if keyword.weight.is_finite() {
            keyword.weight.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let slot = best.entry(word).or_insert(weight);
        if weight > *slot {
            *slot = weight;
        }
    }

    let mut keywords: Vec<Keyword> = best
        .into_iter()
        .map(|(word, weight)| Keyword { word, weight })
        .collect();

    // BTreeMap iteration already orders words ascending; stable sort keeps that for ties
    keywords.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    keywords.truncate(limit);
    keywords
}
