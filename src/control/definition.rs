use serde::{Deserialize, Serialize};

use crate::types::identifiers::ControlId;

/// A single ISO 27001 control to gather evidence for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlDefinition {
    pub id: ControlId,
    pub title: String,
    pub requirement: String,
}

impl ControlDefinition {
    /// Build a definition, normalizing the requirement text.
    pub fn new(id: ControlId, title: impl Into<String>, requirement: &str) -> Self {
        Self {
            id,
            title: title.into().trim().to_string(),
            requirement: normalize_requirement(requirement),
        }
    }

    /// `"5.18 Access rights"`, or just the id when the title is empty.
    pub fn display_name(&self) -> String {
        if self.title.is_empty() {
            self.id.to_string()
        } else {
            format!("{} {}", self.id, self.title)
        }
    }
}

/// CRLF to LF, trailing whitespace stripped, blank runs collapsed, outer whitespace trimmed.
///
/// The requirement text is embedded verbatim in oracle prompts, so incidental
/// editor whitespace must not change the prompt bytes.
pub fn normalize_requirement(raw: &str) -> String {
    let unix = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut out: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in unix.lines().map(str::trim_end) {
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        out.push(line);
        previous_blank = blank;
    }

    out.join("\n").trim().to_string()
}
