//! Resolved build settings and the profile-merging loader that produces them.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::placeholders::resolve;
use crate::project::PathResolver;

/// Key/value map of settings as consumed by the pipeline.
pub type SettingsMap = BTreeMap<String, Value>;

/// Immutable view over the merged settings of every loaded profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
  values: SettingsMap,
}

impl Settings {
  /// Wrap an already-merged map.
  pub fn new(values: SettingsMap) -> Self {
    Self { values }
  }

  /// Merge `<settings_dir>/<profile>.json` for every root and profile, in order.
  ///
  /// Later files override keys set by earlier ones, so the project root wins over the
  /// built-in defaults and the most specific profile wins over `base`. Profiles without
  /// a settings file are skipped.
  pub fn load(roots: &[&dyn PathResolver], settings_dir: &str, profiles: &[String]) -> Result<Self> {
    let mut values = SettingsMap::new();
    for root in roots {
      for profile in profiles {
        let path = root.resolve(&format!("{settings_dir}/{profile}.json"));
        let content = match fs::read_to_string(&path) {
          Ok(content) => content,
          Err(err) if err.kind() == ErrorKind::NotFound => continue,
          Err(source) => return Err(Error::Io { path, source }),
        };
        let layer = parse_layer(&path, &content)?;
        log::debug!("merging {} settings from {}", layer.len(), path.display());
        values.extend(layer);
      }
    }
    Ok(Self { values })
  }

  /// Raw value for `key`, if any.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  /// Whether a setting named `key` exists.
  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  /// Required string setting, returned without placeholder expansion.
  pub fn string(&self, key: &str) -> Result<&str> {
    match self.values.get(key) {
      Some(Value::String(value)) => Ok(value),
      Some(_) => Err(Error::InvalidSetting {
        key: key.into(),
        expected: "a string",
      }),
      None => Err(Error::MissingSetting { key: key.into() }),
    }
  }

  /// Required string setting with placeholders expanded.
  pub fn resolved_string(&self, key: &str) -> Result<String> {
    resolve(self.string(key)?, self)
  }

  /// Optional list of strings; an absent key yields an empty list.
  pub fn string_list(&self, key: &str) -> Result<Vec<&str>> {
    let Some(value) = self.values.get(key) else {
      return Ok(Vec::new());
    };
    let invalid = || Error::InvalidSetting {
      key: key.into(),
      expected: "a list of strings",
    };
    value
      .as_array()
      .ok_or_else(invalid)?
      .iter()
      .map(|item| item.as_str().ok_or_else(invalid))
      .collect()
  }

  /// Optional boolean; absent means `false`.
  pub fn flag(&self, key: &str) -> Result<bool> {
    match self.values.get(key) {
      None | Some(Value::Null) => Ok(false),
      Some(Value::Bool(value)) => Ok(*value),
      Some(_) => Err(Error::InvalidSetting {
        key: key.into(),
        expected: "a boolean",
      }),
    }
  }

  /// Text substituted for `${key}`: strings verbatim, anything else as compact JSON.
  pub fn placeholder_text(&self, key: &str) -> Option<String> {
    self.values.get(key).map(|value| match value {
      Value::String(text) => text.clone(),
      other => other.to_string(),
    })
  }

  /// Borrow the underlying map.
  pub fn as_map(&self) -> &SettingsMap {
    &self.values
  }
}

impl From<SettingsMap> for Settings {
  fn from(values: SettingsMap) -> Self {
    Self::new(values)
  }
}

fn parse_layer(path: &Path, content: &str) -> Result<SettingsMap> {
  let value: Value = serde_json::from_str(content).map_err(|source| Error::SettingsParse {
    path: path.to_path_buf(),
    source,
  })?;
  match value {
    Value::Object(map) => Ok(map.into_iter().collect()),
    _ => Err(Error::InvalidSetting {
      key: path.display().to_string(),
      expected: "a JSON object at the top level",
    }),
  }
}

/// Subset of settings exposed to the frozen application at run time.
///
/// Only the keys listed in `public_settings` are kept. String values are expanded so
/// the application never sees raw `${...}` tokens.
pub fn filter_public_settings(settings: &Settings) -> Result<SettingsMap> {
  let mut public = SettingsMap::new();
  for key in settings.string_list("public_settings")? {
    let value = match settings.get(key) {
      Some(Value::String(text)) => Value::String(resolve(text, settings)?),
      Some(other) => other.clone(),
      None => return Err(Error::MissingSetting { key: key.into() }),
    };
    public.insert(key.to_string(), value);
  }
  Ok(public)
}
