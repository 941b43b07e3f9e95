use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use evidence_core::cache::KeywordSignature;
use evidence_core::control::{ControlDefinition, ControlId};
use evidence_core::document::{ContentHash, DocumentId};
use evidence_core::oracle::{OracleClient, OracleError, RetryPolicy, StubOracle};
use evidence_core::scoring::RelevanceScorer;
use evidence_core::types::{Keyword, ScoreStatus};

fn control() -> ControlDefinition {
    ControlDefinition::new(
        ControlId::parse("5.18").unwrap(),
        "Access rights",
        "Access rights to information shall be provisioned, reviewed and removed.",
    )
}

fn signature(name: &str) -> KeywordSignature {
    KeywordSignature {
        document: DocumentId::new(name).unwrap(),
        content_hash: ContentHash::from_content(name.as_bytes()),
        keywords: vec![Keyword::new("access", 0.9), Keyword::new("review", 0.6)],
        extracted_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn scorer(oracle: Arc<StubOracle>, retry: RetryPolicy) -> RelevanceScorer {
    RelevanceScorer::new(OracleClient::new(oracle, retry))
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_until_success() {
    let sig = signature("a.md");
    let oracle = Arc::new(
        StubOracle::new()
            .with_score(&sig.document, 8.0, "Access review procedure.")
            .fail_scoring(
                &sig.document,
                vec![
                    OracleError::Transport("connection reset".into()),
                    OracleError::RateLimited {
                        retry_after: Some(Duration::from_secs(2)),
                    },
                ],
            ),
    );

    let scores = scorer(oracle.clone(), RetryPolicy::default())
        .score(&control(), &[sig])
        .await;

    assert_eq!(oracle.scoring_calls(), 3);
    assert_eq!(scores[0].status, ScoreStatus::Scored);
    assert_eq!(scores[0].value, 8.0);
}

#[tokio::test(start_paused = true)]
async fn retries_stop_at_max_attempts() {
    let sig = signature("a.md");
    let oracle = Arc::new(
        StubOracle::new().fail_scoring(&sig.document, vec![OracleError::Timeout; 10]),
    );
    let retry = RetryPolicy {
        max_attempts: 4,
        ..RetryPolicy::default()
    };

    let started = tokio::time::Instant::now();
    let scores = scorer(oracle.clone(), retry).score(&control(), &[sig]).await;

    assert_eq!(oracle.scoring_calls(), 4);
    assert!(scores[0].is_failed());
    assert_eq!(scores[0].value, 0.0);
    assert!(scores[0].justification.contains("after 4 attempts"));
    // 500 + 1000 + 2000 ms of backoff between the four attempts
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(3_500) && elapsed < Duration::from_secs(4));
}

#[tokio::test]
async fn non_transient_failures_are_not_retried() {
    let sig = signature("a.md");
    let oracle = Arc::new(StubOracle::new().fail_scoring(
        &sig.document,
        vec![OracleError::Malformed("expected JSON object".into())],
    ));

    let scores = scorer(oracle.clone(), RetryPolicy::default())
        .score(&control(), &[sig])
        .await;

    assert_eq!(oracle.scoring_calls(), 1);
    assert!(scores[0].is_failed());
    assert!(scores[0].justification.contains("expected JSON object"));
}

#[tokio::test]
async fn one_failed_score_leaves_the_rest_intact() {
    let sigs: Vec<KeywordSignature> = ["a.md", "b.md", "c.md"].iter().map(|s| signature(s)).collect();
    let oracle = Arc::new(
        StubOracle::new()
            .with_score(&sigs[0].document, 9.0, "Directly relevant.")
            .fail_scoring(&sigs[1].document, vec![OracleError::Rejected("content_filter".into())])
            .with_score(&sigs[2].document, 3.0, "Tangential."),
    );

    let scores = scorer(oracle, RetryPolicy::default())
        .score(&control(), &sigs)
        .await;

    let statuses: Vec<ScoreStatus> = scores.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![ScoreStatus::Scored, ScoreStatus::Failed, ScoreStatus::Scored]
    );
    assert_eq!(scores[2].justification, "Tangential.");
}

#[tokio::test]
async fn out_of_scale_scores_are_clamped() {
    let sigs = vec![signature("high.md"), signature("low.md")];
    let oracle = Arc::new(
        StubOracle::new()
            .with_score(&sigs[0].document, 42.0, "Very sure.")
            .with_score(&sigs[1].document, -3.0, "Unrelated."),
    );

    let scores = scorer(oracle, RetryPolicy::default())
        .score(&control(), &sigs)
        .await;

    assert_eq!(scores[0].value, 10.0);
    assert_eq!(scores[1].value, 0.0);
    assert!(!scores[1].is_failed());
}

#[tokio::test(start_paused = true)]
async fn results_follow_input_order_not_completion_order() {
    let sigs: Vec<KeywordSignature> = (0..6).map(|i| signature(&format!("doc{i}.md"))).collect();
    let mut stub = StubOracle::new();
    for (i, sig) in sigs.iter().enumerate() {
        // Earlier documents answer last
        stub = stub
            .with_delay(&sig.document, Duration::from_millis(600 - i as u64 * 100))
            .with_score(&sig.document, i as f32, &format!("judged {i}"));
    }

    let scores = scorer(Arc::new(stub), RetryPolicy::default())
        .with_concurrency(6)
        .score(&control(), &sigs)
        .await;

    let documents: Vec<&DocumentId> = scores.iter().map(|s| &s.document).collect();
    let expected: Vec<&DocumentId> = sigs.iter().map(|s| &s.document).collect();
    assert_eq!(documents, expected);
}

#[test]
fn unavailable_errors_are_classified() {
    let exhausted = OracleError::Exhausted {
        attempts: 3,
        last: Box::new(OracleError::Timeout),
    };
    assert!(exhausted.is_unavailable());
    assert!(!exhausted.is_transient());
    assert!(OracleError::Unauthorized("401".into()).is_unavailable());
    assert!(OracleError::Timeout.is_transient());
    assert!(!OracleError::Malformed("x".into()).is_unavailable());
}
