//! Error types shared by every stage of the freeze pipeline.
//!
//! Nothing in the pipeline retries or recovers locally: build tooling should stop loudly,
//! so each variant carries enough context (paths, keys, captured tool output) for an
//! operator to diagnose the failure from the message alone.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for freeze and bundle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the freeze pipeline.
#[derive(Error, Debug)]
pub enum Error {
  /// A `${name}` token referenced a key that is not present in the settings.
  #[error("unknown placeholder ${{{name}}}: no setting named `{name}`")]
  UnknownPlaceholder {
    /// Identifier inside the token.
    name: String,
  },

  /// Placeholder expansion did not reach a fixpoint.
  #[error("placeholder ${{{name}}} does not resolve: {}", chain.join(" -> "))]
  CyclicPlaceholder {
    /// Key at which the cycle or depth limit was detected.
    name: String,
    /// Keys visited while expanding, outermost first.
    chain: Vec<String>,
  },

  /// A file selected for filtering is not valid UTF-8 text.
  #[error("cannot filter {}: file is not valid UTF-8", path.display())]
  TemplateEncoding {
    /// Source file that failed to decode.
    path: PathBuf,
    /// Decoding error.
    #[source]
    source: std::string::FromUtf8Error,
  },

  /// The freezing tool exited with a non-zero status.
  #[error(
    "{tool} failed with {}\n--- stderr ---\n{stderr}\n--- stdout ---\n{stdout}",
    code.map(|code| format!("exit code {code}")).unwrap_or_else(|| "no exit code (terminated by signal)".into())
  )]
  FreezeToolFailed {
    /// Program that was run.
    tool: String,
    /// Exit code, absent when the process was killed by a signal.
    code: Option<i32>,
    /// Captured standard output.
    stdout: String,
    /// Captured standard error.
    stderr: String,
  },

  /// The freezing tool could not be started at all.
  #[error("failed to run {tool}: {source}")]
  ToolSpawn {
    /// Program that was run.
    tool: String,
    /// Spawn error.
    #[source]
    source: std::io::Error,
  },

  /// Moving the tool output into the freeze directory failed.
  #[error("failed to move {} to {}: {source}", from.display(), to.display())]
  BundleRelocation {
    /// Directory produced by the freezing tool.
    from: PathBuf,
    /// Canonical freeze directory.
    to: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },

  /// A required setting is absent.
  #[error("missing required setting `{key}`")]
  MissingSetting {
    /// Setting name.
    key: String,
  },

  /// A setting exists but has the wrong shape.
  #[error("setting `{key}` must be {expected}")]
  InvalidSetting {
    /// Setting name.
    key: String,
    /// Human readable description of the expected shape.
    expected: &'static str,
  },

  /// A settings file could not be parsed.
  #[error("failed to parse settings file {}: {source}", path.display())]
  SettingsParse {
    /// Offending file.
    path: PathBuf,
    /// Parse error.
    #[source]
    source: serde_json::Error,
  },

  /// An entry of `files_to_filter` is not a valid glob pattern.
  #[error("invalid filter pattern `{pattern}`: {source}")]
  InvalidPattern {
    /// Pattern text as configured.
    pattern: String,
    /// Glob parse error.
    #[source]
    source: glob::PatternError,
  },

  /// A runtime hook script could not be decoded back into settings.
  #[error("malformed runtime hook: {reason}")]
  HookDecode {
    /// What was wrong with the script.
    reason: String,
  },

  /// Filesystem failure with the path that caused it.
  #[error("I/O error at {}: {source}", path.display())]
  Io {
    /// Path being accessed.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },

  /// Settings could not be serialized into, or parsed back out of, a runtime hook.
  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Attach a path to I/O results, mirroring `anyhow::Context` for the typed error.
pub(crate) trait IoResultExt<T> {
  fn at_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
  fn at_path(self, path: impl Into<PathBuf>) -> Result<T> {
    self.map_err(|source| Error::Io {
      path: path.into(),
      source,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tool_failure_message_surfaces_captured_output() {
    let err = Error::FreezeToolFailed {
      tool: "pyinstaller".into(),
      code: Some(1),
      stdout: "building".into(),
      stderr: "hidden import missing".into(),
    };

    let message = err.to_string();
    assert!(message.contains("exit code 1"));
    assert!(message.contains("hidden import missing"));
    assert!(message.contains("building"));
  }

  #[test]
  fn cyclic_message_lists_the_chain() {
    let err = Error::CyclicPlaceholder {
      name: "a".into(),
      chain: vec!["a".into(), "b".into(), "a".into()],
    };
    assert_eq!(err.to_string(), "placeholder ${a} does not resolve: a -> b -> a");
  }
}
