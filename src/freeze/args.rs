//! Argument vectors for the freezing tool.

use std::ffi::OsString;

use crate::error::Result;
use crate::platform::Platform;
use crate::project::{ProjectLayout, TARGET_DIR, TOOL_WORK_DIR};
use crate::settings::Settings;

/// Log level passed to the tool for a given debug mode.
///
/// Non-debug builds use `ERROR` rather than `WARN`: some tool versions report every
/// unresolved hidden import as a warning, which buries real problems.
pub fn log_level(debug: bool) -> &'static str {
  if debug { "DEBUG" } else { "ERROR" }
}

/// Build the full argument list, excluding the runtime hook.
///
/// Order: name and fixed flags, one `--hidden-import` pair per configured import,
/// caller-supplied `extra_args`, output/spec/work directories, the main module, then
/// `--debug` when requested.
pub fn build_freeze_args(
  settings: &Settings,
  layout: &ProjectLayout,
  extra_args: &[OsString],
  debug: bool,
) -> Result<Vec<OsString>> {
  let app_name = settings.resolved_string("app_name")?;
  let main_module = settings.resolved_string("main_module")?;

  let mut args: Vec<OsString> = vec![
    "--name".into(),
    app_name.into(),
    "--noupx".into(),
    "--log-level".into(),
    log_level(debug).into(),
    "--noconfirm".into(),
  ];
  for hidden_import in settings.string_list("hidden_imports")? {
    args.push("--hidden-import".into());
    args.push(hidden_import.into());
  }
  args.extend(extra_args.iter().cloned());
  args.extend([
    "--distpath".into(),
    layout.path(TARGET_DIR).into_os_string(),
    "--specpath".into(),
    layout.path(TOOL_WORK_DIR).into_os_string(),
    "--workpath".into(),
    layout.path(TOOL_WORK_DIR).into_os_string(),
    layout.path(&main_module).into_os_string(),
  ]);
  if debug {
    args.push("--debug".into());
  }
  Ok(args)
}

/// Platform-specific extra arguments derived from settings.
///
/// Mac and Windows builds hide the console window unless debugging or
/// `show_console_window` is set, and pick up the `icon` setting when the file exists.
/// Mac builds also pass `mac_bundle_identifier` when it is non-empty.
pub fn platform_args(
  settings: &Settings,
  layout: &ProjectLayout,
  platform: Platform,
  debug: bool,
) -> Result<Vec<OsString>> {
  let mut args: Vec<OsString> = Vec::new();
  if !matches!(platform, Platform::Mac | Platform::Windows) {
    return Ok(args);
  }

  if !(debug || settings.flag("show_console_window")?) {
    args.push("--windowed".into());
  }

  if settings.contains("icon") {
    let icon = layout.path(&settings.resolved_string("icon")?);
    if icon.is_file() {
      args.push("--icon".into());
      args.push(icon.into_os_string());
    } else {
      log::warn!("icon {} does not exist, freezing without one", icon.display());
    }
  }

  if platform == Platform::Mac && settings.contains("mac_bundle_identifier") {
    let identifier = settings.resolved_string("mac_bundle_identifier")?;
    if !identifier.is_empty() {
      args.push("--osx-bundle-identifier".into());
      args.push(identifier.into());
    }
  }

  Ok(args)
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

  fn strings(args: &[OsString]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string_lossy().into_owned()).collect()
  }

  #[test]
  fn builds_arguments_in_documented_order() {
    let layout = ProjectLayout::new("/work/demo");
    let settings = settings(json!({
      "app_name": "Demo",
      "hidden_imports": ["a", "b"],
      "main_module": "src/main/python/main.py",
    }));

    let args = strings(&build_freeze_args(&settings, &layout, &[], false).unwrap());
    let project = layout.project.root().to_path_buf();
    let expected = vec![
      "--name".to_string(),
      "Demo".into(),
      "--noupx".into(),
      "--log-level".into(),
      "ERROR".into(),
      "--noconfirm".into(),
      "--hidden-import".into(),
      "a".into(),
      "--hidden-import".into(),
      "b".into(),
      "--distpath".into(),
      project.join("target").display().to_string(),
      "--specpath".into(),
      project.join("target").join("PyInstaller").display().to_string(),
      "--workpath".into(),
      project.join("target").join("PyInstaller").display().to_string(),
      project
        .join("src")
        .join("main")
        .join("python")
        .join("main.py")
        .display()
        .to_string(),
    ];
    assert_eq!(args, expected);
    assert!(!args.contains(&"--debug".to_string()));
  }

  #[test]
  fn debug_mode_changes_level_and_appends_flag() {
    let layout = ProjectLayout::new("/work/demo");
    let settings = settings(json!({"app_name": "Demo", "main_module": "main.py"}));
    let extra = vec![OsString::from("--windowed")];

    let args = strings(&build_freeze_args(&settings, &layout, &extra, true).unwrap());
    let level = args.iter().position(|arg| arg == "--log-level").unwrap();
    assert_eq!(args[level + 1], "DEBUG");
    assert_eq!(args.last().unwrap(), "--debug");

    let windowed = args.iter().position(|arg| arg == "--windowed").unwrap();
    let distpath = args.iter().position(|arg| arg == "--distpath").unwrap();
    assert!(windowed < distpath);
  }

  #[test]
  fn missing_required_settings_fail() {
    let layout = ProjectLayout::new("/work/demo");
    let settings = settings(json!({"app_name": "Demo"}));
    assert!(build_freeze_args(&settings, &layout, &[], false).is_err());
  }

  #[test]
  fn mac_arguments_include_window_icon_and_identifier() {
    let project = tempdir().unwrap();
    fs::write(project.path().join("Icon.icns"), b"icns").unwrap();
    let layout = ProjectLayout::new(project.path());
    let settings = settings(json!({
      "icon": "Icon.icns",
      "mac_bundle_identifier": "com.example.${app_name}",
      "app_name": "demo",
    }));

    let args = strings(&platform_args(&settings, &layout, Platform::Mac, false).unwrap());
    assert_eq!(args[0], "--windowed");
    assert_eq!(args[1], "--icon");
    assert_eq!(args[3..], ["--osx-bundle-identifier", "com.example.demo"]);
  }

  #[test]
  fn console_window_and_debug_keep_console() {
    let layout = ProjectLayout::new("/work/demo");
    let shown = settings(json!({"show_console_window": true}));
    assert!(platform_args(&shown, &layout, Platform::Windows, false).unwrap().is_empty());

    let hidden = settings(json!({}));
    assert!(platform_args(&hidden, &layout, Platform::Windows, true).unwrap().is_empty());
    assert!(platform_args(&hidden, &layout, Platform::Linux, false).unwrap().is_empty());
  }
}
