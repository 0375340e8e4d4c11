//! OLE compound file helpers for embedded objects.
//!
//! Recovers the root entry name of an embedded compound file and identifies
//! the legacy Office application that produced it. Both are best effort:
//! "no answer" is `None`, never an error.

pub mod application;
pub mod reader;

pub use application::{detect_application, LegacyApplication};
pub use reader::{is_compound_file, read_root_entry, read_root_name, COMPOUND_FILE_SIGNATURE};
