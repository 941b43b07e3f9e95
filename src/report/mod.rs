//! Markdown evidence report, one file per control.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::control::ControlDefinition;
use crate::types::evidence::Selection;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error writing report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ReportEmitter {
    output_dir: PathBuf,
}

impl ReportEmitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// `<output_dir>/<control_id>.md`.
    pub fn report_path(&self, control: &ControlDefinition) -> PathBuf {
        self.output_dir.join(format!("{}.md", control.id))
    }

    /// Pure and byte-stable for identical inputs.
    pub fn render(&self, control: &ControlDefinition, selection: &Selection) -> String {
        render(control, selection)
    }

    /// Render and atomically replace the control's report.
    pub fn write(
        &self,
        control: &ControlDefinition,
        selection: &Selection,
    ) -> Result<PathBuf, ReportError> {
        let path = self.report_path(control);
        let rendered = self.render(control, selection);

        write_atomic(&self.output_dir, &path, rendered.as_bytes()).map_err(|source| {
            ReportError::Io {
                path: path.clone(),
                source,
            }
        })?;

        info!(control = %control.id, path = %path.display(), documents = selection.len(), "Report written");
        Ok(path)
    }
}

pub fn render(control: &ControlDefinition, selection: &Selection) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "# Selected Documents for ISO 27001 Control {}",
        control.display_name()
    );

    let failed = selection.selection.failed.len();
    if selection.is_empty() {
        if failed == 0 {
            out.push_str("\nNo candidate documents were found for this control.\n");
        } else {
            let _ = writeln!(
                out,
                "\nNo documents could be evaluated ({failed} failed); see logs."
            );
        }
        return out;
    }

    for (rank, doc) in selection.documents.iter().enumerate() {
        let url = if doc.url.is_empty() {
            "(not available)"
        } else {
            doc.url.as_str()
        };
        let justification = doc.justification.trim();
        let justification = if justification.is_empty() {
            "(no justification provided)"
        } else {
            justification
        };

        let _ = write!(
            out,
            "\n## {}. {}\n**Confluence URL:** {}\n\n{}\n",
            rank + 1,
            doc.title,
            url,
            justification
        );
    }

    out
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
