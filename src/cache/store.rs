use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::backing::SignatureBacking;
use super::signature::KeywordSignature;
use crate::batch::{map_bounded, BatchOutcome, Progress};
use crate::document::Document;
use crate::oracle::{ExtractionRequest, OracleClient, OracleError};
use crate::types::identifiers::{ContentHash, DocumentId};
use crate::types::keyword::normalize_keywords;

pub const DEFAULT_MAX_KEYWORDS: usize = 50;
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Keyword extraction failed for one document. Never fatal to a batch.
#[derive(Debug, Clone, Error)]
#[error("Keyword extraction failed for {document}: {source}")]
pub struct ExtractionFailure {
    pub document: DocumentId,
    #[source]
    pub source: OracleError,
}

/// Derives keyword signatures through the oracle and caches them by content hash.
pub struct KeywordStore<B> {
    backing: B,
    oracle: OracleClient,
    max_keywords: usize,
    concurrency: usize,
}

impl<B> KeywordStore<B>
where
    B: SignatureBacking,
{
    pub fn new(backing: B, oracle: OracleClient) -> Self {
        Self {
            backing,
            oracle,
            max_keywords: DEFAULT_MAX_KEYWORDS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_max_keywords(mut self, max_keywords: usize) -> Self {
        self.max_keywords = max_keywords;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// Cached signature when the content hash still matches; otherwise one
    /// oracle extraction, persisted before returning.
    pub async fn get_signature(
        &self,
        document: &Document,
    ) -> Result<KeywordSignature, ExtractionFailure> {
        let hash = ContentHash::from_content(document.content.as_bytes());

        match self.backing.load(&document.id) {
            Ok(Some(cached)) if cached.is_current_for(&document.id, &hash) => {
                debug!(document = %document.id, "Signature cache hit");
                return Ok(cached);
            }
            Ok(Some(_)) => {
                debug!(document = %document.id, "Signature stale, content changed");
            }
            Ok(None) => {
                debug!(document = %document.id, "Signature cache miss");
            }
            Err(e) => {
                warn!(document = %document.id, error = %e, "Signature cache unreadable, re-extracting");
            }
        }

        let request = ExtractionRequest::new(document, self.max_keywords);
        let raw = self
            .oracle
            .extract_keywords(&request)
            .await
            .map_err(|source| ExtractionFailure {
                document: document.id.clone(),
                source,
            })?;

        let signature = KeywordSignature {
            document: document.id.clone(),
            content_hash: hash,
            keywords: normalize_keywords(raw, self.max_keywords),
            extracted_at: Utc::now(),
        };

        // The signature is still valid for this run even if it cannot be kept
        if let Err(e) = self.backing.store(&signature) {
            warn!(document = %document.id, error = %e, "Failed to persist signature");
        } else {
            info!(
                document = %document.id,
                keywords = signature.keywords.len(),
                "Extracted keyword signature"
            );
        }

        Ok(signature)
    }

    /// Signatures for every document; per-document failures are collected, not raised.
    pub async fn get_signatures(
        &self,
        documents: &[Document],
    ) -> BatchOutcome<KeywordSignature, ExtractionFailure> {
        let progress = Progress::new(documents.len());
        self.get_signatures_tracked(documents, &progress).await
    }

    /// Like [`get_signatures`](Self::get_signatures), ticking `progress` as each document finishes.
    pub async fn get_signatures_tracked(
        &self,
        documents: &[Document],
        progress: &Progress,
    ) -> BatchOutcome<KeywordSignature, ExtractionFailure> {
        let results = map_bounded(documents, self.concurrency, |document| async move {
            let result = self.get_signature(document).await;
            progress.tick();
            result
        })
        .await;

        let outcome = BatchOutcome::from_results(results);
        for failure in &outcome.failed {
            warn!(document = %failure.document, error = %failure.source, "Document excluded from scoring");
        }
        outcome
    }
}
