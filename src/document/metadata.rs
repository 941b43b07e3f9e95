use std::path::Path;

const SOURCE_URL_MARKER: &str = "**Source URL:**";

/// Title and link extracted from an exported Confluence page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentMetadata {
    pub title: String,
    pub url: String,
}

impl DocumentMetadata {
    /// Title is the first Markdown heading line, falling back to the file stem.
    /// URL is the first `**Source URL:** http(s)://...` value, empty when absent.
    pub fn extract(content: &str, fallback_name: &str) -> Self {
        let title = first_heading(content).unwrap_or_else(|| file_stem(fallback_name));
        let url = source_url(content).unwrap_or_default();

        DocumentMetadata { title, url }
    }
}

fn first_heading(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|title| !title.is_empty())
}

fn source_url(content: &str) -> Option<String> {
    let (_, rest) = content.split_once(SOURCE_URL_MARKER)?;
    let candidate = rest.split_whitespace().next()?;

    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        Some(candidate.to_string())
    } else {
        None
    }
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string()
}
