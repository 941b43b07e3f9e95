//! Parsing of model output into typed oracle results.

use serde::Deserialize;

use super::{OracleError, OracleScore};
use crate::types::keyword::Keyword;

#[derive(Debug, Deserialize)]
struct RawKeyword {
    word: String,
    #[serde(alias = "weight", default = "full_confidence")]
    matching: f32,
}

fn full_confidence() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct RawScore {
    #[serde(alias = "relevance")]
    score: f32,
    #[serde(default, alias = "reason")]
    justification: String,
}

/// Models often wrap JSON in Markdown code fences.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string (`json`, `md`, ...) up to the first newline
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_keywords(text: &str) -> Result<Vec<Keyword>, OracleError> {
    let body = strip_code_fences(text);
    let raw: Vec<RawKeyword> = serde_json::from_str(body)
        .map_err(|e| OracleError::Malformed(format!("keyword list: {e}")))?;

    Ok(raw
        .into_iter()
        .map(|k| Keyword::new(k.word, k.matching))
        .collect())
}

pub fn parse_score(text: &str) -> Result<OracleScore, OracleError> {
    let body = strip_code_fences(text);
    let raw: RawScore = serde_json::from_str(body)
        .map_err(|e| OracleError::Malformed(format!("score: {e}")))?;

    if !raw.score.is_finite() {
        return Err(OracleError::Malformed(format!(
            "score is not a finite number: {}",
            raw.score
        )));
    }

    Ok(OracleScore {
        value: raw.score,
        justification: raw.justification.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
    }

    #[test]
    fn keywords_accept_matching_or_weight() {
        let parsed = parse_keywords(
            "```json\n[{\"word\": \"access\", \"matching\": 0.9}, {\"word\": \"backup\", \"weight\": 0.4}, {\"word\": \"audit\"}]\n```",
        )
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                Keyword::new("access", 0.9),
                Keyword::new("backup", 0.4),
                Keyword::new("audit", 1.0),
            ]
        );
    }

    #[test]
    fn prose_is_malformed() {
        let err = parse_keywords("Sure! Here are the keywords: access, backup").unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn score_parses_with_justification() {
        let score = parse_score("{\"score\": 8, \"justification\": \" Defines access reviews. \"}").unwrap();
        assert_eq!(score.value, 8.0);
        assert_eq!(score.justification, "Defines access reviews.");
    }

    #[test]
    fn score_without_number_is_malformed() {
        assert!(matches!(
            parse_score("{\"justification\": \"x\"}"),
            Err(OracleError::Malformed(_))
        ));
    }
}
