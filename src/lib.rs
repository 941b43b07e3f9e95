//! Deterministic evidence selection for ISO 27001 controls.
//!
//! `evidence-core` reduces each policy document to a cached keyword
//! signature, asks a language-model oracle how relevant each signature is to
//! a control, and selects a bounded, ranked, deduplicated reading list with a
//! justification per document. The oracle is non-deterministic; everything
//! around it is not. Identical control text and cached signatures always
//! produce byte-identical oracle requests, and identical scores always produce
//! the same selection and a byte-identical report.

pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod control;
pub mod document;
pub mod oracle;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod selection;
pub mod telemetry;
pub mod types;

pub use pipeline::{ControlRun, RunError, RunOutcome, RunPhase};
