use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

#[derive(Debug, Error)]
pub enum DocumentIdError {
    #[error("Source path is outside the corpus root")]
    OutsideRoot,
    #[error("Path involves invalid UTF-8")]
    InvalidUtf8,
    #[error("Document identity must not be empty")]
    Empty,
}

impl DocumentId {
    /// Create a DocumentId from a source path and the corpus root.
    pub fn from_path(root: &Path, source: &Path) -> Result<Self, DocumentIdError> {
        let rel = source
            .strip_prefix(root)
            .map_err(|_| DocumentIdError::OutsideRoot)?;

        let s = rel.to_str().ok_or(DocumentIdError::InvalidUtf8)?;
        Self::new(s)
    }

    /// Create a DocumentId from an already relative name, e.g. `"149520415.md"`.
    pub fn new(name: &str) -> Result<Self, DocumentIdError> {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return Err(DocumentIdError::Empty);
        }
        Ok(DocumentId(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short stable fragment used to name per-document files on disk.
    pub fn storage_key(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..8])
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .replace('\\', "/")
        .trim_start_matches("./")
        .to_lowercase()
}

/// Content hash of a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);

        let hash = hasher.finalize();
        let hex = hex::encode(hash);

        ContentHash(format!("sha256:{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ISO 27001 control number, e.g. `5.18`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid control identifier {0:?}: expected dot-separated numbers such as 5.18")]
pub struct ControlIdError(pub String);

impl ControlId {
    pub fn parse(raw: &str) -> Result<Self, ControlIdError> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));

        if valid {
            Ok(ControlId(trimmed.to_string()))
        } else {
            Err(ControlIdError(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ControlId {
    type Err = ControlIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControlId::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_id_accepts_dotted_numbers() {
        assert_eq!(ControlId::parse(" 5.18 ").unwrap().as_str(), "5.18");
        assert!(ControlId::parse("8").is_ok());
        assert!(ControlId::parse("5.").is_err());
        assert!(ControlId::parse("5.a").is_err());
        assert!(ControlId::parse("../5.1").is_err());
        assert!(ControlId::parse("").is_err());
    }

    #[test]
    fn document_id_normalizes_separators_and_case() {
        let id = DocumentId::new(".\\Policies\\Access.MD").unwrap();
        assert_eq!(id.as_str(), "policies/access.md");
    }

    #[test]
    fn storage_key_is_stable_hex() {
        let id = DocumentId::new("a.md").unwrap();
        assert_eq!(id.storage_key(), id.clone().storage_key());
        assert_eq!(id.storage_key().len(), 16);
    }
}
