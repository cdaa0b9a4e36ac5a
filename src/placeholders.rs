//! `${name}` placeholder expansion against resolved settings.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::{Error, Result};
use crate::settings::Settings;

/// Longest reference chain (and number of rescans) before expansion is declared cyclic.
pub const MAX_RESOLUTION_DEPTH: usize = 32;

fn placeholder_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").expect("invalid placeholder regex")
  })
}

/// Whether `text` still contains at least one `${name}` token.
pub fn has_placeholders(text: &str) -> bool {
  placeholder_pattern().is_match(text)
}

/// Replace every `${name}` token in `text` with the value of the `name` setting.
///
/// Setting values may contain placeholders themselves; they are expanded recursively.
/// Text produced by a substitution is rescanned until no tokens remain, so the result is
/// a fixpoint: resolving it again returns it unchanged.
pub fn resolve(text: &str, settings: &Settings) -> Result<String> {
  let mut resolver = Resolver::new(settings);
  let mut current = text.to_string();

  for _ in 0..MAX_RESOLUTION_DEPTH {
    if !has_placeholders(&current) {
      return Ok(current);
    }
    current = resolver.substitute(&current, &mut Vec::new())?;
  }

  if has_placeholders(&current) {
    let name = placeholder_pattern()
      .captures(&current)
      .and_then(|caps| caps.get(1))
      .map(|m| m.as_str().to_string())
      .unwrap_or_default();
    return Err(Error::CyclicPlaceholder {
      chain: vec![name.clone()],
      name,
    });
  }
  Ok(current)
}

struct Resolver<'a> {
  settings: &'a Settings,
  cache: BTreeMap<String, String>,
}

impl<'a> Resolver<'a> {
  fn new(settings: &'a Settings) -> Self {
    Self {
      settings,
      cache: BTreeMap::new(),
    }
  }

  fn substitute(&mut self, text: &str, chain: &mut Vec<String>) -> Result<String> {
    let mut failure = None;
    let replaced = placeholder_pattern().replace_all(text, |caps: &Captures| {
      if failure.is_some() {
        return String::new();
      }
      match self.value(&caps[1], chain) {
        Ok(value) => value,
        Err(err) => {
          failure = Some(err);
          String::new()
        }
      }
    });
    match failure {
      Some(err) => Err(err),
      None => Ok(replaced.into_owned()),
    }
  }

  fn value(&mut self, name: &str, chain: &mut Vec<String>) -> Result<String> {
    if let Some(cached) = self.cache.get(name) {
      return Ok(cached.clone());
    }

    if chain.iter().any(|seen| seen == name) || chain.len() >= MAX_RESOLUTION_DEPTH {
      let mut cycle = chain.clone();
      cycle.push(name.to_string());
      return Err(Error::CyclicPlaceholder {
        name: name.to_string(),
        chain: cycle,
      });
    }

    let raw = self
      .settings
      .placeholder_text(name)
      .ok_or_else(|| Error::UnknownPlaceholder { name: name.into() })?;

    chain.push(name.to_string());
    let expanded = if has_placeholders(&raw) {
      self.substitute(&raw, chain)
    } else {
      Ok(raw)
    };
    chain.pop();

    let expanded = expanded?;
    self.cache.insert(name.to_string(), expanded.clone());
    Ok(expanded)
  }
}
