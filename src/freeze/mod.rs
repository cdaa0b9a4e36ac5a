//! Running the external freezing tool and relocating its output.
//!
//! - [`args`] builds the tool's argument vector from settings
//! - [`hook`] generates the runtime hook carrying the public settings
//! - [`relocate`] moves the tool output to the canonical freeze directory
//! - [`orchestrator`] ties them together in [`Freezer`]

pub mod args;
pub mod hook;
mod orchestrator;
pub mod relocate;

pub use args::{build_freeze_args, log_level, platform_args};
pub use hook::{RuntimeHook, decode_build_settings, encode_build_settings};
pub use orchestrator::{FreezeOutcome, Freezer, Relocation};
pub use relocate::{normalize_path, relocate_bundle, same_location};
