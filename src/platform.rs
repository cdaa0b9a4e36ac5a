//! Target platforms and the bundle layout each one expects.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Platform a bundle is assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
  /// macOS; output is an `.app` bundle.
  Mac,
  /// Windows; flat directory.
  Windows,
  /// Linux; flat directory.
  Linux,
  /// Anything else; treated like a flat directory platform.
  Other,
}

impl Platform {
  /// Platform this binary was compiled for.
  pub fn current() -> Self {
    if cfg!(target_os = "macos") {
      Self::Mac
    } else if cfg!(target_os = "windows") {
      Self::Windows
    } else if cfg!(target_os = "linux") {
      Self::Linux
    } else {
      Self::Other
    }
  }

  /// Whether the freezing tool produces an `.app` bundle here.
  pub fn is_app_bundle(self) -> bool {
    self == Self::Mac
  }

  /// Settings/resources profile implied by the platform, if any.
  pub fn profile(self) -> Option<&'static str> {
    match self {
      Self::Mac => Some("mac"),
      Self::Windows => Some("windows"),
      Self::Linux => Some("linux"),
      Self::Other => None,
    }
  }

  /// Profiles active by default: `base` followed by the platform profile.
  pub fn default_profiles(self) -> Vec<String> {
    std::iter::once("base")
      .chain(self.profile())
      .map(String::from)
      .collect()
  }
}

impl FromStr for Platform {
  type Err = std::convert::Infallible;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    Ok(match value.trim().to_ascii_lowercase().as_str() {
      "mac" | "macos" | "darwin" | "osx" => Self::Mac,
      "windows" | "win" | "win32" => Self::Windows,
      "linux" => Self::Linux,
      _ => Self::Other,
    })
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.profile().unwrap_or("other"))
  }
}

/// Directory that receives `src/main/resources` content inside the freeze directory.
pub fn resources_dest_dir(freeze_dir: &Path, platform: Platform) -> PathBuf {
  if platform.is_app_bundle() {
    freeze_dir.join("Contents").join("Resources")
  } else {
    freeze_dir.to_path_buf()
  }
}
