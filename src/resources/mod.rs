//! Copying profile resource trees into the freeze directory.
//!
//! Filtering (which files are templates) and copying are kept in separate submodules so
//! pattern matching can be tested without touching the filesystem.

mod copy;
mod filter;

pub use copy::{CopyReport, copy_profile_resources, copy_tree};
pub use filter::FilterSet;
