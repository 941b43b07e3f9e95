use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::definition::ControlDefinition;
use crate::types::identifiers::{ControlId, ControlIdError};

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("No control file found matching ID '{id}' in {dir}")]
    NotFound { id: String, dir: String },
    #[error("Multiple control files found matching ID '{id}': {matches:?}")]
    Ambiguous { id: String, matches: Vec<String> },
    #[error(transparent)]
    InvalidId(#[from] ControlIdError),
    #[error("Control file is not valid UTF-8: {0}")]
    InvalidUtf8(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lookup of control definitions by identifier. No caching: controls may be
/// edited by hand between runs.
pub trait ControlSource: Send + Sync {
    fn load(&self, id: &ControlId) -> Result<ControlDefinition, ControlError>;
}

/// Control files named `"<id> <title>.md"` or `"<id>.md"` in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryControls {
    root: PathBuf,
}

impl DirectoryControls {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the single file for `id`. `5.2` matches `"5.2 Information..."` but
    /// never `"5.20 Addressing..."`.
    pub fn find(&self, id: &ControlId) -> Result<PathBuf, ControlError> {
        let not_found = || ControlError::NotFound {
            id: id.to_string(),
            dir: self.root.display().to_string(),
        };

        if !self.root.is_dir() {
            return Err(not_found());
        }

        let mut matches = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let Some(stem) = markdown_stem(&path) else {
                continue;
            };
            if control_title(stem, id).is_some() {
                matches.push(path);
            }
        }
        matches.sort();

        match matches.len() {
            0 => Err(not_found()),
            1 => Ok(matches.remove(0)),
            _ => Err(ControlError::Ambiguous {
                id: id.to_string(),
                matches: matches.iter().map(|p| p.display().to_string()).collect(),
            }),
        }
    }
}

impl ControlSource for DirectoryControls {
    fn load(&self, id: &ControlId) -> Result<ControlDefinition, ControlError> {
        let path = self.find(id)?;
        let raw = fs::read(&path)?;
        let text = String::from_utf8(raw).map_err(|_| ControlError::InvalidUtf8(path.clone()))?;

        let title = markdown_stem(&path)
            .and_then(|stem| control_title(stem, id))
            .unwrap_or_default();

        info!(control = %id, path = %path.display(), "Loaded control file");
        Ok(ControlDefinition::new(id.clone(), title, &text))
    }
}

fn markdown_stem(path: &Path) -> Option<&str> {
    if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
        return None;
    }
    path.file_stem().and_then(|s| s.to_str())
}

/// `Some(title)` when `stem` names control `id`.
fn control_title<'a>(stem: &'a str, id: &ControlId) -> Option<&'a str> {
    let rest = stem.strip_prefix(id.as_str())?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix(' ').map(str::trim)
    }
}

/// Fixed in-memory controls.
#[derive(Debug, Clone, Default)]
pub struct MemoryControls {
    controls: BTreeMap<ControlId, ControlDefinition>,
}

impl MemoryControls {
    pub fn new(controls: impl IntoIterator<Item = ControlDefinition>) -> Self {
        Self {
            controls: controls.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

impl ControlSource for MemoryControls {
    fn load(&self, id: &ControlId) -> Result<ControlDefinition, ControlError> {
        self.controls
            .get(id)
            .cloned()
            .ok_or_else(|| ControlError::NotFound {
                id: id.to_string(),
                dir: "<memory>".to_string(),
            })
    }
}
