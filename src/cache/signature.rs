use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::types::identifiers::{ContentHash, DocumentId};
use crate::types::keyword::Keyword;

/// Compact topic representation of one document, persisted across runs.
///
/// Record layout on disk is `{document, content_hash, keywords, extracted_at}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSignature {
    pub document: DocumentId,
    pub content_hash: ContentHash,
    pub keywords: Vec<Keyword>,
    pub extracted_at: DateTime<Utc>, // informational only
}

impl KeywordSignature {
    /// A signature stays valid exactly as long as the text it was derived from.
    pub fn is_current_for(&self, document: &DocumentId, hash: &ContentHash) -> bool {
        &self.document == document && &self.content_hash == hash
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.is_current_for(
            &document.id,
            &ContentHash::from_content(document.content.as_bytes()),
        )
    }
}
