use std::fs;
use std::path::{Path, PathBuf};

use same_file::is_same_file;
use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::placeholders::resolve;
use crate::project::PathResolver;
use crate::resources::FilterSet;
use crate::settings::Settings;

/// Profile subtree copied into the resources destination.
const RESOURCES_SUBTREE: &str = "src/main/resources";
/// Profile subtree copied into the freeze directory itself.
const FREEZE_SUBTREE: &str = "src/freeze";

/// Files written while copying resources, in write order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopyReport {
  /// Destination of every file written. A path appears again when a later profile
  /// overrides it.
  pub written: Vec<PathBuf>,
  /// Number of writes that went through placeholder expansion.
  pub filtered: usize,
}

impl CopyReport {
  fn merge(&mut self, other: CopyReport) {
    self.written.extend(other.written);
    self.filtered += other.filtered;
  }
}

/// Copy every profile's resources from each source root into the bundle.
///
/// Roots and profiles are visited in order, so a file from a later profile (or from
/// the project root after the defaults root) replaces the same file written earlier.
/// For each pair, `src/main/resources/<profile>` lands in `resources_dest` and
/// `src/freeze/<profile>` lands in `freeze_dir`. Missing directories are skipped.
pub fn copy_profile_resources(
  source_roots: &[&dyn PathResolver],
  profiles: &[String],
  resources_dest: &Path,
  freeze_dir: &Path,
  filter: &FilterSet,
  settings: &Settings,
) -> Result<CopyReport> {
  let mut report = CopyReport::default();
  for root in source_roots {
    for profile in profiles {
      for (subtree, dest) in [(RESOURCES_SUBTREE, resources_dest), (FREEZE_SUBTREE, freeze_dir)] {
        let label = format!("{subtree}/{profile}");
        let src = root.resolve(&label);
        if !src.is_dir() {
          log::debug!("no {} for profile {profile}, skipping", src.display());
          continue;
        }
        log::info!("copying {} to {}", src.display(), dest.display());
        report.merge(copy_tree(&src, dest, &label, filter, settings)?);
      }
    }
  }
  Ok(report)
}

/// Recursively copy `src` into `dest`, expanding placeholders in filtered files.
///
/// `label` is the project-relative location of `src`; filter patterns are matched
/// against both `<relative path>` and `<label>/<relative path>`.
pub fn copy_tree(
  src: &Path,
  dest: &Path,
  label: &str,
  filter: &FilterSet,
  settings: &Settings,
) -> Result<CopyReport> {
  let mut report = CopyReport::default();
  let walker = WalkDir::new(src)
    .follow_links(true)
    .sort_by_file_name()
    .min_depth(1);

  for entry in walker {
    let entry = entry.map_err(|err| {
      let path = err.path().unwrap_or(src).to_path_buf();
      Error::Io {
        path,
        source: err.into(),
      }
    })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let relative = entry
      .path()
      .strip_prefix(src)
      .expect("walkdir yields paths below its root");
    let target = dest.join(relative);
    let relative_text = relative.to_string_lossy().replace('\\', "/");
    let labelled = format!("{}/{}", label.trim_end_matches('/'), relative_text);

    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent).at_path(parent)?;
    }

    if filter.matches_any(&[relative_text.as_str(), labelled.as_str()]) {
      log::debug!("filtering {labelled}");
      write_filtered(entry.path(), &target, settings)?;
      report.filtered += 1;
    } else {
      install_file(entry.path(), &target)?;
    }
    report.written.push(target);
  }

  Ok(report)
}

fn write_filtered(source: &Path, destination: &Path, settings: &Settings) -> Result<()> {
  let bytes = fs::read(source).at_path(source)?;
  let text = String::from_utf8(bytes).map_err(|err| Error::TemplateEncoding {
    path: source.to_path_buf(),
    source: err,
  })?;
  let resolved = resolve(&text, settings)?;
  fs::write(destination, resolved).at_path(destination)
}

fn install_file(source: &Path, destination: &Path) -> Result<()> {
  if destination.exists() && is_same_file(source, destination).at_path(destination)? {
    return Ok(());
  }
  fs::copy(source, destination).at_path(destination)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::project::ProjectRoot;
  use crate::settings::SettingsMap;
  use serde_json::json;
  use tempfile::tempdir;

  fn settings() -> Settings {
    serde_json::from_value::<SettingsMap>(json!({"app_name": "Demo", "version": "1.0"}))
      .unwrap()
      .into()
  }

  fn profiles(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
  }

  fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn later_profiles_override_earlier_ones() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    let root = ProjectRoot::new(project.path());
    write(&root.resolve("src/main/resources/base/config.txt"), b"base ${app_name}");
    write(&root.resolve("src/main/resources/prod/config.txt"), b"prod ${app_name}");
    write(&root.resolve("src/main/resources/base/only-base.txt"), b"kept");

    let filter = FilterSet::new(["config.txt"]).unwrap();
    copy_profile_resources(
      &[&root],
      &profiles(&["base", "prod"]),
      out.path(),
      out.path(),
      &filter,
      &settings(),
    )
    .unwrap();

    assert_eq!(fs::read_to_string(out.path().join("config.txt")).unwrap(), "prod Demo");
    assert_eq!(fs::read_to_string(out.path().join("only-base.txt")).unwrap(), "kept");
  }

  #[test]
  fn project_root_overrides_defaults_root() {
    let defaults = tempdir().unwrap();
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    let default_root = ProjectRoot::new(defaults.path());
    let project_root = ProjectRoot::new(project.path());
    write(&default_root.resolve("src/main/resources/base/icon.txt"), b"default");
    write(&project_root.resolve("src/main/resources/base/icon.txt"), b"custom");

    copy_profile_resources(
      &[&default_root, &project_root],
      &profiles(&["base"]),
      out.path(),
      out.path(),
      &FilterSet::default(),
      &settings(),
    )
    .unwrap();

    assert_eq!(fs::read_to_string(out.path().join("icon.txt")).unwrap(), "custom");
  }

  #[test]
  fn filters_placeholders_and_copies_other_files_verbatim() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    let root = ProjectRoot::new(project.path());
    write(&root.resolve("src/main/resources/base/app.ini"), b"name=${app_name}");
    write(&root.resolve("src/main/resources/base/raw/readme.txt"), b"raw ${app_name}");
    write(&root.resolve("src/main/resources/base/logo.bin"), &[0xff, 0x00, 0xfe]);

    let filter = FilterSet::new(["src/main/resources/base/app.ini"]).unwrap();
    let report = copy_profile_resources(
      &[&root],
      &profiles(&["base"]),
      out.path(),
      out.path(),
      &filter,
      &settings(),
    )
    .unwrap();

    assert_eq!(fs::read_to_string(out.path().join("app.ini")).unwrap(), "name=Demo");
    assert_eq!(
      fs::read_to_string(out.path().join("raw/readme.txt")).unwrap(),
      "raw ${app_name}"
    );
    assert_eq!(fs::read(out.path().join("logo.bin")).unwrap(), vec![0xff, 0x00, 0xfe]);
    assert_eq!(report.filtered, 1);
    assert_eq!(report.written.len(), 3);
  }

  #[test]
  fn freeze_subtree_lands_in_freeze_dir() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    let root = ProjectRoot::new(project.path());
    write(&root.resolve("src/main/resources/mac/data.txt"), b"data");
    write(&root.resolve("src/freeze/mac/Contents/Info.plist"), b"<string>${version}</string>");

    let freeze_dir = out.path().join("Demo.app");
    let resources = freeze_dir.join("Contents/Resources");
    let filter = FilterSet::new(["**/Info.plist"]).unwrap();
    copy_profile_resources(
      &[&root],
      &profiles(&["base", "mac"]),
      &resources,
      &freeze_dir,
      &filter,
      &settings(),
    )
    .unwrap();

    assert!(resources.join("data.txt").is_file());
    assert_eq!(
      fs::read_to_string(freeze_dir.join("Contents/Info.plist")).unwrap(),
      "<string>1.0</string>"
    );
  }

  #[test]
  fn missing_profiles_are_not_errors() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    let root = ProjectRoot::new(project.path());

    let report = copy_profile_resources(
      &[&root],
      &profiles(&["base", "linux"]),
      out.path(),
      out.path(),
      &FilterSet::default(),
      &settings(),
    )
    .unwrap();

    assert!(report.written.is_empty());
  }

  #[test]
  fn binary_template_is_an_encoding_error() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    let root = ProjectRoot::new(project.path());
    write(&root.resolve("src/main/resources/base/app.ini"), &[0xc3, 0x28]);

    let err = copy_profile_resources(
      &[&root],
      &profiles(&["base"]),
      out.path(),
      out.path(),
      &FilterSet::new(["app.ini"]).unwrap(),
      &settings(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::TemplateEncoding { .. }));
  }

  #[test]
  fn unknown_placeholder_in_template_propagates() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    let root = ProjectRoot::new(project.path());
    write(&root.resolve("src/main/resources/base/app.ini"), b"${nope}");

    let err = copy_tree(
      &root.resolve("src/main/resources/base"),
      out.path(),
      "src/main/resources/base",
      &FilterSet::new(["app.ini"]).unwrap(),
      &settings(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::UnknownPlaceholder { .. }));
  }
}
