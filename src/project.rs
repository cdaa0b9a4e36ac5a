//! Filesystem layout of the project being frozen.

use std::path::{Path, PathBuf};

/// Directory the freezing tool writes into, relative to the project root.
pub const TARGET_DIR: &str = "target";

/// Spec and work directory handed to the freezing tool, relative to the project root.
pub const TOOL_WORK_DIR: &str = "target/PyInstaller";

/// Strategy for turning a project-relative path into an absolute one.
///
/// Resources and settings are looked up under two roots (built-in defaults and the
/// project itself), each represented by one resolver.
pub trait PathResolver {
  /// Absolute path for `relative`, which always uses `/` separators.
  fn resolve(&self, relative: &str) -> PathBuf;
}

/// Resolver that joins relative paths onto a fixed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
  root: PathBuf,
}

impl ProjectRoot {
  /// Resolver rooted at `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Directory every path is resolved against.
  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl PathResolver for ProjectRoot {
  fn resolve(&self, relative: &str) -> PathBuf {
    relative
      .split('/')
      .filter(|segment| !segment.is_empty())
      .fold(self.root.clone(), |path, segment| path.join(segment))
  }
}

/// Owned description of where the project, its defaults and its outputs live.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
  /// The project being frozen.
  pub project: ProjectRoot,
  /// Built-in defaults searched before the project, when configured.
  pub defaults: Option<ProjectRoot>,
  /// Directory holding `<profile>.json` settings files, relative to each root.
  pub settings_dir: String,
}

impl ProjectLayout {
  /// Layout for `project_dir` without a defaults root.
  pub fn new(project_dir: impl Into<PathBuf>) -> Self {
    Self {
      project: ProjectRoot::new(project_dir),
      defaults: None,
      settings_dir: crate::config::DEFAULT_SETTINGS_DIR.into(),
    }
  }

  /// Project-relative path.
  pub fn path(&self, relative: &str) -> PathBuf {
    self.project.resolve(relative)
  }

  /// Search roots in override order: defaults first, project last.
  pub fn source_roots(&self) -> Vec<&dyn PathResolver> {
    let mut roots: Vec<&dyn PathResolver> = Vec::new();
    if let Some(defaults) = &self.defaults {
      roots.push(defaults);
    }
    roots.push(&self.project);
    roots
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn joins_forward_slash_segments() {
    let root = ProjectRoot::new("/work/app");
    assert_eq!(
      root.resolve("src/main/resources/base"),
      PathBuf::from("/work/app").join("src").join("main").join("resources").join("base")
    );
    assert_eq!(root.resolve("target/"), PathBuf::from("/work/app").join("target"));
  }

  #[test]
  fn source_roots_put_defaults_before_project() {
    let mut layout = ProjectLayout::new("/work/app");
    assert_eq!(layout.source_roots().len(), 1);

    layout.defaults = Some(ProjectRoot::new("/opt/defaults"));
    let roots = layout.source_roots();
    assert_eq!(roots[0].resolve("x"), PathBuf::from("/opt/defaults").join("x"));
    assert_eq!(roots[1].resolve("x"), PathBuf::from("/work/app").join("x"));
  }
}
