use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

use super::signature::KeywordSignature;
use crate::types::identifiers::DocumentId;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Signature cache lock poisoned")]
    Poisoned,
}

/// Keyed persistence for keyword signatures.
///
/// Writers for distinct documents never conflict. Writers for the same
/// document race last-writer-wins, and a reader never observes a partial record.
pub trait SignatureBacking: Send + Sync {
    fn load(&self, document: &DocumentId) -> Result<Option<KeywordSignature>, CacheError>;

    fn store(&self, signature: &KeywordSignature) -> Result<(), CacheError>;
}

impl<B: SignatureBacking + ?Sized> SignatureBacking for Arc<B> {
    fn load(&self, document: &DocumentId) -> Result<Option<KeywordSignature>, CacheError> {
        (**self).load(document)
    }

    fn store(&self, signature: &KeywordSignature) -> Result<(), CacheError> {
        (**self).store(signature)
    }
}

/// Process-local backing for tests.
#[derive(Debug, Default)]
pub struct MemoryBacking {
    entries: RwLock<BTreeMap<DocumentId, KeywordSignature>>,
}

impl MemoryBacking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SignatureBacking for MemoryBacking {
    fn load(&self, document: &DocumentId) -> Result<Option<KeywordSignature>, CacheError> {
        let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(document).cloned())
    }

    fn store(&self, signature: &KeywordSignature) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.insert(signature.document.clone(), signature.clone());
        Ok(())
    }
}

/// One JSON record per document under a cache directory.
///
/// Records are written to a temp file in the same directory, synced, then
/// renamed over the target, so replacement is atomic.
#[derive(Debug, Clone)]
pub struct FileBacking {
    root: PathBuf,
}

impl FileBacking {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, document: &DocumentId) -> PathBuf {
        self.root.join(format!("{}.json", document.storage_key()))
    }
}

impl SignatureBacking for FileBacking {
    fn load(&self, document: &DocumentId) -> Result<Option<KeywordSignature>, CacheError> {
        let path = self.record_path(document);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let signature: KeywordSignature = match serde_json::from_slice(&bytes) {
            Ok(signature) => signature,
            Err(e) => {
                warn!(document = %document, path = %path.display(), error = %e, "Ignoring corrupt signature record");
                return Ok(None);
            }
        };

        // Storage keys are hash fragments; a collision must read as a miss
        if &signature.document != document {
            warn!(
                document = %document,
                found = %signature.document,
                path = %path.display(),
                "Signature record belongs to another document"
            );
            return Ok(None);
        }

        Ok(Some(signature))
    }

    fn store(&self, signature: &KeywordSignature) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), signature)?;
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;

        tmp.persist(self.record_path(&signature.document))
            .map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }
}
