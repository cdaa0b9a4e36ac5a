//! Runtime hook injecting the public build settings into the frozen application.
//!
//! The hook is a tiny Python script the freezing tool runs before any application code.
//! It stores the public settings as `BUILD_SETTINGS` on a runtime module. The settings
//! travel as compact JSON inside a single-quoted Python string literal, and
//! [`decode_build_settings`] is the exact inverse of [`encode_build_settings`].

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{Error, IoResultExt, Result};
use crate::settings::SettingsMap;

/// File name of the generated hook inside its temporary directory.
pub const HOOK_FILE_NAME: &str = "build_settings_hook.py";

const IMPORT_LINES: &str = "import importlib\nimport json\n";
const MODULE_PREFIX: &str = "module = importlib.import_module(";
const SETTINGS_PREFIX: &str = "module.BUILD_SETTINGS = json.loads(";

/// Render the hook source for `module` and the given public settings.
pub fn encode_build_settings(module: &str, public: &SettingsMap) -> Result<String> {
  let json = serde_json::to_string(public)?;
  Ok(format!(
    "{IMPORT_LINES}{MODULE_PREFIX}{})\n{SETTINGS_PREFIX}{})\n",
    python_string_literal(module),
    python_string_literal(&json),
  ))
}

/// Recover the module name and settings from hook source produced by
/// [`encode_build_settings`].
pub fn decode_build_settings(source: &str) -> Result<(String, SettingsMap)> {
  let body = source
    .strip_prefix(IMPORT_LINES)
    .ok_or_else(|| malformed("missing import preamble"))?;
  let mut lines = body.lines();

  let module_literal = lines
    .next()
    .and_then(|line| line.strip_prefix(MODULE_PREFIX))
    .and_then(|rest| rest.strip_suffix(')'))
    .ok_or_else(|| malformed("missing module import"))?;
  let settings_literal = lines
    .next()
    .and_then(|line| line.strip_prefix(SETTINGS_PREFIX))
    .and_then(|rest| rest.strip_suffix(')'))
    .ok_or_else(|| malformed("missing BUILD_SETTINGS assignment"))?;
  if lines.next().is_some() {
    return Err(malformed("unexpected trailing lines"));
  }

  let module = parse_python_string_literal(module_literal)?;
  let json = parse_python_string_literal(settings_literal)?;
  let settings = serde_json::from_str(&json)?;
  Ok((module, settings))
}

fn malformed(reason: impl Into<String>) -> Error {
  Error::HookDecode {
    reason: reason.into(),
  }
}

/// Single-quoted, ASCII-only Python string literal for `value`.
fn python_string_literal(value: &str) -> String {
  let mut out = String::with_capacity(value.len() + 2);
  out.push('\'');
  for ch in value.chars() {
    match ch {
      '\\' => out.push_str("\\\\"),
      '\'' => out.push_str("\\'"),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\t' => out.push_str("\\t"),
      ' '..='~' => out.push(ch),
      _ => {
        let code = ch as u32;
        // Writing to a String cannot fail.
        let _ = match code {
          0..=0xff => write!(out, "\\x{code:02x}"),
          0x100..=0xffff => write!(out, "\\u{code:04x}"),
          _ => write!(out, "\\U{code:08x}"),
        };
      }
    }
  }
  out.push('\'');
  out
}

fn parse_python_string_literal(literal: &str) -> Result<String> {
  let inner = literal
    .strip_prefix('\'')
    .and_then(|rest| rest.strip_suffix('\''))
    .ok_or_else(|| malformed(format!("not a single-quoted literal: {literal}")))?;

  let mut out = String::with_capacity(inner.len());
  let mut chars = inner.chars();
  while let Some(ch) = chars.next() {
    if ch != '\\' {
      out.push(ch);
      continue;
    }
    let escaped = match chars.next() {
      Some('\\') => '\\',
      Some('\'') => '\'',
      Some('n') => '\n',
      Some('r') => '\r',
      Some('t') => '\t',
      Some('x') => hex_char(&mut chars, 2)?,
      Some('u') => hex_char(&mut chars, 4)?,
      Some('U') => hex_char(&mut chars, 8)?,
      other => return Err(malformed(format!("unsupported escape \\{}", other.unwrap_or(' ')))),
    };
    out.push(escaped);
  }
  Ok(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char> {
  let hex: String = chars.by_ref().take(digits).collect();
  if hex.len() != digits {
    return Err(malformed("truncated escape sequence"));
  }
  u32::from_str_radix(&hex, 16)
    .ok()
    .and_then(char::from_u32)
    .ok_or_else(|| malformed(format!("invalid escape value {hex}")))
}

/// Hook script living in its own temporary directory for one freeze run.
///
/// The directory is removed by [`RuntimeHook::close`] or, on any early return, when the
/// value is dropped.
#[derive(Debug)]
pub struct RuntimeHook {
  dir: TempDir,
  path: PathBuf,
}

impl RuntimeHook {
  /// Write the hook into a freshly created temporary directory.
  pub fn create(module: &str, public: &SettingsMap) -> Result<Self> {
    let dir = tempfile::Builder::new()
      .prefix("freeze-hook-")
      .tempdir()
      .at_path(std::env::temp_dir())?;
    let path = dir.path().join(HOOK_FILE_NAME);
    fs::write(&path, encode_build_settings(module, public)?).at_path(&path)?;
    log::debug!("wrote runtime hook {}", path.display());
    Ok(Self { dir, path })
  }

  /// Path of the generated script.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Directory holding the script.
  pub fn dir(&self) -> &Path {
    self.dir.path()
  }

  /// Remove the temporary directory, reporting failures instead of ignoring them.
  pub fn close(self) -> Result<()> {
    let dir = self.dir.path().to_path_buf();
    self.dir.close().at_path(dir)
  }
}
