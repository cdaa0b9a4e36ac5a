#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod freeze;
pub mod placeholders;
pub mod platform;
pub mod project;
pub mod resources;
pub mod settings;

pub use config::ProjectConfig;
pub use error::{Error, Result};
pub use freeze::{FreezeOutcome, Freezer, Relocation};
pub use placeholders::resolve;
pub use platform::{Platform, resources_dest_dir};
pub use project::{PathResolver, ProjectLayout, ProjectRoot};
pub use resources::{CopyReport, FilterSet, copy_profile_resources};
pub use settings::{Settings, SettingsMap, filter_public_settings};
