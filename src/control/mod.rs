pub mod definition;
pub mod source;

pub use crate::types::identifiers::ControlId;
pub use definition::{normalize_requirement, ControlDefinition};
pub use source::{ControlError, ControlSource, DirectoryControls, MemoryControls};
