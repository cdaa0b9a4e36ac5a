//! Freeze orchestration: run the tool, relocate its output, lay out resources.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{DEFAULT_RUNTIME_MODULE, ProjectConfig};
use crate::error::{Error, Result};
use crate::platform::{Platform, resources_dest_dir};
use crate::project::{ProjectLayout, TARGET_DIR};
use crate::resources::{CopyReport, FilterSet, copy_profile_resources};
use crate::settings::{Settings, filter_public_settings};

use super::args::{build_freeze_args, platform_args};
use super::hook::RuntimeHook;
use super::relocate::{normalize_path, relocate_bundle};

/// Where the frozen bundle ended up after a tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
  /// Canonical freeze directory.
  pub freeze_dir: PathBuf,
  /// Whether the tool output had to be moved there.
  pub moved: bool,
}

/// Result of a complete freeze.
#[derive(Debug, Clone)]
pub struct FreezeOutcome {
  /// Location of the bundle.
  pub relocation: Relocation,
  /// Resource files written into the bundle.
  pub resources: CopyReport,
}

/// Drives the freezing tool for one project on one platform.
///
/// All inputs are explicit: the freezer holds the project layout and toolchain choice,
/// settings and profiles are passed to each call.
#[derive(Debug, Clone)]
pub struct Freezer {
  layout: ProjectLayout,
  platform: Platform,
  tool: OsString,
  runtime_module: String,
}

impl Freezer {
  /// Freezer using the default tool and runtime module.
  pub fn new(layout: ProjectLayout, platform: Platform) -> Self {
    let defaults = ProjectConfig::default();
    Self {
      layout,
      platform,
      tool: defaults.tool.into(),
      runtime_module: DEFAULT_RUNTIME_MODULE.into(),
    }
  }

  /// Freezer configured from a discovered [`ProjectConfig`].
  pub fn from_config(config: &ProjectConfig, project_dir: &Path, platform: Platform) -> Self {
    Self {
      layout: config.layout(project_dir),
      platform,
      tool: config.tool.clone().into(),
      runtime_module: config.runtime_module.clone(),
    }
  }

  /// Replace the program used to freeze.
  pub fn with_tool(mut self, tool: impl Into<OsString>) -> Self {
    self.tool = tool.into();
    self
  }

  /// Replace the module that receives `BUILD_SETTINGS`.
  pub fn with_runtime_module(mut self, module: impl Into<String>) -> Self {
    self.runtime_module = module.into();
    self
  }

  /// Project layout in use.
  pub fn layout(&self) -> &ProjectLayout {
    &self.layout
  }

  /// Target platform.
  pub fn platform(&self) -> Platform {
    self.platform
  }

  /// Directory the tool writes the bundle to: `target/<app_name>`, with `.app` on Mac.
  pub fn output_dir(&self, settings: &Settings) -> Result<PathBuf> {
    let app_name = settings.resolved_string("app_name")?;
    let suffix = if self.platform.is_app_bundle() { ".app" } else { "" };
    Ok(self.layout.path(TARGET_DIR).join(format!("{app_name}{suffix}")))
  }

  /// Canonical bundle location, the expanded `${freeze_dir}` setting.
  ///
  /// An empty value, the project root and its ancestors are refused.
  pub fn freeze_dir(&self, settings: &Settings) -> Result<PathBuf> {
    let freeze_dir = settings.resolved_string("freeze_dir")?;
    let path = if Path::new(&freeze_dir).is_absolute() {
      PathBuf::from(&freeze_dir)
    } else {
      self.layout.path(&freeze_dir)
    };

    let project = normalize_path(self.layout.project.root());
    if freeze_dir.trim().is_empty() || project.starts_with(normalize_path(&path)) {
      return Err(Error::InvalidSetting {
        key: "freeze_dir".into(),
        expected: "a directory below the project root or outside the project",
      });
    }
    Ok(path)
  }

  /// Arguments for the tool, without the runtime hook pair.
  pub fn tool_args(
    &self,
    settings: &Settings,
    extra_args: &[OsString],
    debug: bool,
  ) -> Result<Vec<OsString>> {
    build_freeze_args(settings, &self.layout, extra_args, debug)
  }

  /// Run the freezing tool and move its output to the freeze directory.
  ///
  /// The runtime hook exists only while the tool runs; its temporary directory is
  /// removed whether or not the tool succeeds.
  pub fn run_freeze(
    &self,
    settings: &Settings,
    extra_args: &[OsString],
    debug: bool,
  ) -> Result<Relocation> {
    let mut args = self.tool_args(settings, extra_args, debug)?;
    let output_dir = self.output_dir(settings)?;
    let freeze_dir = self.freeze_dir(settings)?;

    let public = filter_public_settings(settings)?;
    let hook = RuntimeHook::create(&self.runtime_module, &public)?;
    args.push("--runtime-hook".into());
    args.push(hook.path().as_os_str().to_owned());

    let run = self.run_tool(&args);
    let cleanup = hook.close();
    run?;
    cleanup?;

    let moved = relocate_bundle(&output_dir, &freeze_dir)?;
    Ok(Relocation { freeze_dir, moved })
  }

  /// Copy every profile's resources into the freeze directory.
  pub fn generate_resources(&self, settings: &Settings, profiles: &[String]) -> Result<CopyReport> {
    let freeze_dir = self.freeze_dir(settings)?;
    let resources_dir = resources_dest_dir(&freeze_dir, self.platform);
    let filter = FilterSet::from_settings(settings)?;

    let report = copy_profile_resources(
      &self.layout.source_roots(),
      profiles,
      &resources_dir,
      &freeze_dir,
      &filter,
      settings,
    )?;
    log::info!(
      "wrote {} resource files ({} filtered) into {}",
      report.written.len(),
      report.filtered,
      freeze_dir.display()
    );
    Ok(report)
  }

  /// Full platform freeze: tool run with platform arguments, then resources.
  pub fn freeze(
    &self,
    settings: &Settings,
    profiles: &[String],
    extra_args: &[OsString],
    debug: bool,
  ) -> Result<FreezeOutcome> {
    let mut args = platform_args(settings, &self.layout, self.platform, debug)?;
    args.extend(extra_args.iter().cloned());

    let relocation = self.run_freeze(settings, &args, debug)?;
    let resources = self.generate_resources(settings, profiles)?;
    Ok(FreezeOutcome {
      relocation,
      resources,
    })
  }

  fn run_tool(&self, args: &[OsString]) -> Result<()> {
    let tool = self.tool.to_string_lossy().into_owned();
    log::info!("running {tool} for {}", self.platform);
    log::debug!("{tool} arguments: {args:?}");

    let output = Command::new(&self.tool)
      .args(args)
      .current_dir(self.layout.project.root())
      .output()
      .map_err(|source| Error::ToolSpawn {
        tool: tool.clone(),
        source,
      })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
      return Err(Error::FreezeToolFailed {
        tool,
        code: output.status.code(),
        stdout,
        stderr,
      });
    }

    if !stderr.trim().is_empty() {
      log::debug!("{tool} stderr:\n{stderr}");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::settings::SettingsMap;
  use serde_json::{Value, json};
  use std::fs;
  use tempfile::tempdir;

  fn settings(value: Value) -> Settings {
    serde_json::from_value::<SettingsMap>(value).unwrap().into()
  }

  #[test]
  fn output_dir_gets_app_suffix_only_on_mac() {
    let settings = settings(json!({"app_name": "Demo"}));
    let mac = Freezer::new(ProjectLayout::new("/work"), Platform::Mac);
    let linux = Freezer::new(ProjectLayout::new("/work"), Platform::Linux);

    assert_eq!(mac.output_dir(&settings).unwrap(), Path::new("/work/target/Demo.app"));
    assert_eq!(linux.output_dir(&settings).unwrap(), Path::new("/work/target/Demo"));
  }

  #[test]
  fn freeze_dir_expands_placeholders() {
    let settings = settings(json!({"app_name": "Demo", "freeze_dir": "target/${app_name}"}));
    let freezer = Freezer::new(ProjectLayout::new("/work"), Platform::Linux);
    assert_eq!(freezer.freeze_dir(&settings).unwrap(), Path::new("/work/target/Demo"));
  }

  #[test]
  fn freeze_dir_may_not_be_the_project_or_above_it() {
    let freezer = Freezer::new(ProjectLayout::new("/work/demo"), Platform::Linux);
    for value in ["", " ", ".", "./", "..", "target/../..", "/work"] {
      let settings = settings(json!({"freeze_dir": value}));
      assert!(
        matches!(freezer.freeze_dir(&settings), Err(Error::InvalidSetting { .. })),
        "{value:?} should be refused"
      );
    }

    let outside = settings(json!({"freeze_dir": "/srv/bundles/Demo"}));
    assert_eq!(freezer.freeze_dir(&outside).unwrap(), Path::new("/srv/bundles/Demo"));
  }

  #[test]
  fn bad_freeze_dir_fails_before_the_tool_runs() {
    let project = tempdir().unwrap();
    let settings = settings(json!({
      "app_name": "Demo",
      "main_module": "main.py",
      "freeze_dir": "",
    }));
    let freezer = Freezer::new(ProjectLayout::new(project.path()), Platform::Linux)
      .with_tool("definitely-not-a-freezing-tool-7f3a");

    let err = freezer.run_freeze(&settings, &[], false).unwrap_err();
    assert!(matches!(err, Error::InvalidSetting { key, .. } if key == "freeze_dir"));
    assert!(project.path().exists());
  }

  #[test]
  fn generate_resources_uses_bundle_layout() {
    let project = tempdir().unwrap();
    let resources = project.path().join("src/main/resources/base");
    fs::create_dir_all(&resources).unwrap();
    fs::write(resources.join("app.ini"), "name=${app_name}").unwrap();

    let settings = settings(json!({
      "app_name": "Demo",
      "freeze_dir": "target/${app_name}.app",
      "files_to_filter": ["app.ini"],
    }));
    let freezer = Freezer::new(ProjectLayout::new(project.path()), Platform::Mac);
    freezer
      .generate_resources(&settings, &["base".to_string()])
      .unwrap();

    let written = project.path().join("target/Demo.app/Contents/Resources/app.ini");
    assert_eq!(fs::read_to_string(written).unwrap(), "name=Demo");
  }

  #[test]
  fn missing_tool_is_a_spawn_error() {
    let project = tempdir().unwrap();
    let settings = settings(json!({
      "app_name": "Demo",
      "main_module": "main.py",
      "freeze_dir": "target/${app_name}",
    }));
    let freezer = Freezer::new(ProjectLayout::new(project.path()), Platform::Linux)
      .with_tool("definitely-not-a-freezing-tool-7f3a");

    let err = freezer.run_freeze(&settings, &[], false).unwrap_err();
    assert!(matches!(err, Error::ToolSpawn { .. }));
  }
}
