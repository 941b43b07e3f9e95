//! Prompt rendering. Every prompt is a pure function of its inputs: no
//! timestamps, no map iteration order, no floating point beyond fixed-width
//! formatting. Identical inputs give byte-identical prompts.

use std::fmt::Write as _;

use crate::cache::signature::KeywordSignature;
use crate::control::ControlDefinition;
use crate::document::Document;
use crate::types::identifiers::DocumentId;

/// Upper bound on the scale the oracle is asked to score on.
pub const MAX_SCORE: f32 = 10.0;

const KEYWORD_JSON_FORMAT: &str = r#"[
    {"word": "keyword1", "matching": 0.95},
    {"word": "keyword2", "matching": 0.90}
]"#;

const SCORE_JSON_FORMAT: &str = r#"{"score": 7, "justification": "Two or three sentences."}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub document: DocumentId,
    pub prompt: String,
}

impl ExtractionRequest {
    pub fn new(document: &Document, max_keywords: usize) -> Self {
        let prompt = format!(
            "You are an assistant that extracts keywords from documents. Your expertise is \
security and ISO 27001 compliance.\n\
The keywords will be used to match the document against ISO 27001 controls.\n\
Return up to {max_keywords} single-word keywords relevant to security and ISO 27001 \
compliance. Omit general words. Do not repeat keywords.\n\
\"matching\" is a number between 0 and 1: your certainty that the keyword describes the document.\n\
Return only JSON in this format, no other text:\n\
{KEYWORD_JSON_FORMAT}\n\n\
Document:\n\
{content}",
            content = document.content,
        );

        Self {
            document: document.id.clone(),
            prompt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringRequest {
    pub document: DocumentId,
    pub prompt: String,
}

impl ScoringRequest {
    /// Built from the control text and the keyword signature only, never the
    /// raw document, so prompt size does not grow with document length.
    pub fn new(control: &ControlDefinition, signature: &KeywordSignature) -> Self {
        let mut keywords = String::new();
        for keyword in &signature.keywords {
            // Writing to a String cannot fail
            let _ = writeln!(keywords, "- {} ({:.2})", keyword.word, keyword.weight);
        }
        if keywords.is_empty() {
            keywords.push_str("(no keywords)\n");
        }

        let prompt = format!(
            "You are an assistant specialized in ISO 27001 compliance and information security.\n\
Rate how relevant a document is as evidence for the ISO 27001 control below. The document \
is described only by its keywords, each with the extractor's certainty.\n\
Score from 0 (unrelated) to {max} (directly addresses the control requirements). \
Policies, procedures and standards on the control topic score highest.\n\
Return only JSON in this format, no other text:\n\
{SCORE_JSON_FORMAT}\n\n\
ISO Control {name}:\n\
{requirement}\n\n\
Document keywords:\n\
{keywords}",
            max = MAX_SCORE as u32,
            name = control.display_name(),
            requirement = control.requirement,
        );

        Self {
            document: signature.document.clone(),
            prompt,
        }
    }
}
