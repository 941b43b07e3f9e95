pub mod backing;
pub mod signature;
pub mod store;

pub use backing::{CacheError, FileBacking, MemoryBacking, SignatureBacking};
pub use signature::KeywordSignature;
pub use store::{ExtractionFailure, KeywordStore, DEFAULT_CONCURRENCY, DEFAULT_MAX_KEYWORDS};
