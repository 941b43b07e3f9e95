//! Boundary to the language model.
//!
//! The model is reached only through [`Oracle`], a two-operation trait. Callers
//! inside the crate go through [`OracleClient`], which owns the retry policy so
//! no call site carries its own backoff loop.

pub mod http;
pub mod prompts;
pub mod response;
pub mod retry;
pub mod stub;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::keyword::Keyword;

pub use http::{HttpOracle, OracleConfig, TokenCost, TokenPricing, UsageSnapshot};
pub use prompts::{ExtractionRequest, ScoringRequest};
pub use retry::RetryPolicy;
pub use stub::StubOracle;

#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("Oracle request timed out")]
    Timeout,
    #[error("Oracle rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Oracle transport error: {0}")]
    Transport(String),
    #[error("Malformed oracle response: {0}")]
    Malformed(String),
    #[error("Oracle rejected the request: {0}")]
    Rejected(String),
    #[error("Oracle refused credentials: {0}")]
    Unauthorized(String),
    #[error("Oracle unavailable after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<OracleError>,
    },
}

impl OracleError {
    /// Failures worth another attempt. Malformed output and policy
    /// rejections are answered the same way on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OracleError::Timeout | OracleError::RateLimited { .. } | OracleError::Transport(_)
        )
    }

    /// The oracle cannot be reached at all: the retry budget ran out, or
    /// every request would be refused.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            OracleError::Exhausted { .. } | OracleError::Unauthorized(_)
        )
    }
}

/// Relevance judgment returned by the oracle, before clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleScore {
    pub value: f32,
    pub justification: String,
}

/// The external, non-deterministic extraction and scoring capability.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn extract_keywords(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Vec<Keyword>, OracleError>;

    async fn score(&self, request: &ScoringRequest) -> Result<OracleScore, OracleError>;
}

/// Shared handle to an oracle with the run's retry policy applied.
#[derive(Clone)]
pub struct OracleClient {
    oracle: Arc<dyn Oracle>,
    retry: RetryPolicy,
}

impl OracleClient {
    pub fn new(oracle: Arc<dyn Oracle>, retry: RetryPolicy) -> Self {
        Self { oracle, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn extract_keywords(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Vec<Keyword>, OracleError> {
        self.retry
            .run("extract_keywords", &request.document, || {
                self.oracle.extract_keywords(request)
            })
            .await
    }

    pub async fn score(&self, request: &ScoringRequest) -> Result<OracleScore, OracleError> {
        self.retry
            .run("score", &request.document, || self.oracle.score(request))
            .await
    }
}

impl std::fmt::Debug for OracleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
