//! Project configuration loader describing the freezing tool and search roots.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::project::{ProjectLayout, ProjectRoot};

const DEFAULT_CONFIG_FILE: &str = "freeze.config.json";

/// Settings directory searched under every root unless configured otherwise.
pub const DEFAULT_SETTINGS_DIR: &str = "src/build/settings";

/// Python module that receives `BUILD_SETTINGS` when the frozen app starts.
pub const DEFAULT_RUNTIME_MODULE: &str = "fbs_runtime._frozen";

/// Discoverable project configuration describing the freeze toolchain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Program invoked to freeze the application.
    pub tool: String,
    /// Module the runtime hook stores the public settings on.
    pub runtime_module: String,
    /// Optional directory with built-in default resources and settings, relative to the
    /// project directory unless absolute.
    pub defaults_dir: Option<PathBuf>,
    /// Directory holding `<profile>.json` settings files under each root.
    pub settings_dir: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            tool: "pyinstaller".into(),
            runtime_module: DEFAULT_RUNTIME_MODULE.into(),
            defaults_dir: None,
            settings_dir: DEFAULT_SETTINGS_DIR.into(),
        }
    }
}

impl ProjectConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// When the configuration file does not exist or fails to parse we fall back to default
    /// values so a bare project still freezes with the standard layout.
    pub fn discover(project_dir: &Path) -> Self {
        let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
        match Self::from_path(&candidate) {
            Some(config) => config,
            None => {
                if candidate.exists() {
                    log::warn!("ignoring unreadable {}, using defaults", candidate.display());
                }
                Self::default()
            }
        }
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Build the project layout rooted at `project_dir`.
    pub fn layout(&self, project_dir: &Path) -> ProjectLayout {
        ProjectLayout {
            project: ProjectRoot::new(project_dir),
            defaults: self
                .defaults_dir
                .as_ref()
                .map(|dir| ProjectRoot::new(project_dir.join(dir))),
            settings_dir: self.settings_dir.clone(),
        }
    }
}
