pub mod corpus;
pub mod document;
pub mod metadata;

pub use crate::types::identifiers::{ContentHash, DocumentId};
pub use corpus::{CorpusError, DirectoryCorpus, DocumentCorpus, MemoryCorpus};
pub use document::{Document, DocumentError};
pub use metadata::DocumentMetadata;
