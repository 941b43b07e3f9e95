use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::metadata::DocumentMetadata;
use crate::types::identifiers::{ContentHash, DocumentId};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Content must be valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// A policy or process document from the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub version: ContentHash,
    pub source: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Document {
    /// Ingest raw bytes into a Document.
    ///
    /// This is the ONLY way to construct a Document.
    /// It enforces all invariants: validation, hashing, and immutability.
    pub fn ingest(
        id: DocumentId,
        source: String,
        raw_content: Vec<u8>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Result<Self, DocumentError> {
        let content = String::from_utf8(raw_content)?;

        // Hash is computed on verified content, byte for byte (no newline normalization)
        let version = ContentHash::from_content(content.as_bytes());
        let DocumentMetadata { title, url } = DocumentMetadata::extract(&content, id.as_str());

        Ok(Document {
            id,
            version,
            source,
            title,
            url,
            content,
            last_modified,
        })
    }
}
