use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use super::document::Document;
use crate::types::identifiers::DocumentId;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Documents directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of the documents considered for every control.
pub trait DocumentCorpus: Send + Sync {
    /// All documents, ordered by identity.
    fn documents(&self) -> Result<Vec<Document>, CorpusError>;

    fn fetch(&self, id: &DocumentId) -> Result<Option<Document>, CorpusError> {
        Ok(self.documents()?.into_iter().find(|doc| &doc.id == id))
    }
}

/// Markdown exports in a single flat directory.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    root: PathBuf,
}

impl DirectoryCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn markdown_files(&self) -> Result<Vec<PathBuf>, CorpusError> {
        if !self.root.exists() {
            return Err(CorpusError::MissingRoot(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(CorpusError::NotADirectory(self.root.clone()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_markdown = path.extension().and_then(|e| e.to_str()) == Some("md");
            if is_markdown && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn load(&self, path: &Path) -> Result<Document, String> {
        let id = DocumentId::from_path(&self.root, path).map_err(|e| e.to_string())?;
        let raw = fs::read(path).map_err(|e| e.to_string())?;
        let last_modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Document::ingest(id, path.display().to_string(), raw, last_modified)
            .map_err(|e| e.to_string())
    }
}

impl DocumentCorpus for DirectoryCorpus {
    fn documents(&self) -> Result<Vec<Document>, CorpusError> {
        let files = self.markdown_files()?;
        if files.is_empty() {
            warn!(root = %self.root.display(), "No markdown files found");
        }

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            match self.load(&path) {
                Ok(doc) => documents.push(doc),
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "Skipping unreadable document");
                }
            }
        }

        // Identity is lowercased, so file order and identity order can differ
        documents.sort_by(|a, b| a.id.cmp(&b.id));

        // Stable sort keeps path order within one identity; the first file wins
        documents.dedup_by(|later, kept| {
            let collides = later.id == kept.id;
            if collides {
                warn!(
                    document = %kept.id,
                    kept = %kept.source,
                    skipped = %later.source,
                    "Files collide on document identity, skipping"
                );
            }
            collides
        });
        debug!(count = documents.len(), root = %self.root.display(), "Loaded corpus");
        Ok(documents)
    }
}

/// Fixed in-memory corpus.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    documents: Vec<Document>,
}

impl MemoryCorpus {
    pub fn new(mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Self { documents }
    }
}

impl DocumentCorpus for MemoryCorpus {
    fn documents(&self) -> Result<Vec<Document>, CorpusError> {
        Ok(self.documents.clone())
    }
}
