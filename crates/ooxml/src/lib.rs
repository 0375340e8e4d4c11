//! OOXML container backend for embedded object extraction.
//!
//! Opens a presentation container, classifies each embedded part by content,
//! recovers authored names from relationships and slide markup, and writes the
//! parts out under collision-free names.

pub mod extractor;
pub mod markup;
pub mod package;
pub mod rels;
pub mod signature;
pub mod slide_names;

pub use extractor::Extractor;
pub use package::Package;
pub use rels::RelationshipGraph;
pub use signature::classify;
