//! Moving the freezing tool's output into the canonical freeze directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use same_file::is_same_file;

use crate::error::{Error, Result};

/// Lexically normalise `path` into an absolute path.
///
/// `.` segments and trailing separators disappear and `..` removes the preceding
/// segment. Symlinks are not followed, so paths that need not exist yet can be compared.
pub fn normalize_path(path: &Path) -> PathBuf {
  let absolute = if path.is_absolute() {
    path.to_path_buf()
  } else {
    match std::env::current_dir() {
      Ok(cwd) => cwd.join(path),
      Err(_) => path.to_path_buf(),
    }
  };

  let mut normalized = PathBuf::new();
  for component in absolute.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push(component);
        }
      }
      other => normalized.push(other),
    }
  }
  normalized
}

/// Whether two paths denote the same location.
pub fn same_location(a: &Path, b: &Path) -> bool {
  if normalize_path(a) == normalize_path(b) {
    return true;
  }
  a.exists() && b.exists() && is_same_file(a, b).unwrap_or(false)
}

/// Move `output_dir` to `freeze_dir` unless they already coincide.
///
/// Renaming a directory onto itself fails on some Windows drives, so identical paths are
/// detected up front and left alone. Nested locations are rejected before anything is
/// removed. A `freeze_dir` left over from an earlier run is replaced. Returns `true` when
/// a move happened.
pub fn relocate_bundle(output_dir: &Path, freeze_dir: &Path) -> Result<bool> {
  if same_location(output_dir, freeze_dir) {
    log::debug!("{} is already the freeze directory", output_dir.display());
    return Ok(false);
  }

  let relocation_error = |source| Error::BundleRelocation {
    from: output_dir.to_path_buf(),
    to: freeze_dir.to_path_buf(),
    source,
  };

  let (from, to) = (normalize_path(output_dir), normalize_path(freeze_dir));
  if to.starts_with(&from) || from.starts_with(&to) {
    return Err(relocation_error(std::io::Error::new(
      ErrorKind::InvalidInput,
      "the freeze directory and the tool output must not contain each other",
    )));
  }

  if !output_dir.is_dir() {
    return Err(relocation_error(std::io::Error::new(
      ErrorKind::NotFound,
      "the freezing tool produced no output directory",
    )));
  }

  match fs::remove_dir_all(freeze_dir) {
    Ok(()) => log::info!("replaced stale {}", freeze_dir.display()),
    Err(err) if err.kind() == ErrorKind::NotFound => {}
    Err(err) => return Err(relocation_error(err)),
  }
  if let Some(parent) = freeze_dir.parent() {
    fs::create_dir_all(parent).map_err(relocation_error)?;
  }
  fs::rename(output_dir, freeze_dir).map_err(relocation_error)?;

  log::info!("moved {} to {}", output_dir.display(), freeze_dir.display());
  Ok(true)
}
