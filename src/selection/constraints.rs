use serde::{Deserialize, Serialize};

use crate::types::evidence::SelectionError;

// Key point:
// Serializable
// Comparable
// Explicit defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConstraints {
    pub min_count: usize,
    pub max_count: usize,
    /// Fixed minimum score. When unset the cutoff adapts to the top score.
    pub threshold: Option<f32>,
    /// Adaptive cutoff as a fraction of the best score, used without a threshold.
    pub relative_cutoff: f32,
}

impl Default for SelectionConstraints {
    fn default() -> Self {
        Self {
            min_count: 3,
            max_count: 8,
            threshold: None,
            relative_cutoff: 0.5,
        }
    }
}

impl SelectionConstraints {
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.max_count == 0 {
            return Err(SelectionError::InvalidConstraints(
                "max_count must be at least 1".to_string(),
            ));
        }
        if self.min_count > self.max_count {
            return Err(SelectionError::InvalidConstraints(format!(
                "min_count {} exceeds max_count {}",
                self.min_count, self.max_count
            )));
        }
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() {
                return Err(SelectionError::InvalidConstraints(
                    "threshold must be a finite number".to_string(),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.relative_cutoff) {
            return Err(SelectionError::InvalidConstraints(format!(
                "relative_cutoff {} must be within [0, 1]",
                self.relative_cutoff
            )));
        }
        Ok(())
    }

    /// Score a document must reach to be selected without extension.
    pub fn cutoff(&self, top_score: f32) -> f32 {
        match self.threshold {
            Some(threshold) => threshold,
            None => top_score * self.relative_cutoff,
        }
    }

    /// Whether `score` clears the cutoff derived from `top_score`.
    ///
    /// The adaptive cutoff never admits a zero score, so an all-zero run
    /// yields only the `min_count` extension.
    pub fn admits(&self, score: f32, top_score: f32) -> bool {
        let cutoff = self.cutoff(top_score);
        match self.threshold {
            Some(_) => score >= cutoff,
            None => score > 0.0 && score >= cutoff,
        }
    }
}
