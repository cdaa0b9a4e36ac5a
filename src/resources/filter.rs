use glob::{MatchOptions, Pattern};

use crate::error::{Error, Result};
use crate::settings::Settings;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Set of glob patterns naming the resource files that receive placeholder expansion.
///
/// A pattern may be written relative to the profile directory being copied (`app.ini`,
/// `**/*.plist`) or relative to the project (`src/main/resources/base/app.ini`).
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    patterns: Vec<Pattern>,
}

impl FilterSet {
    /// Compile the given patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref().replace('\\', "/");
                let trimmed = pattern.trim_start_matches("./").trim_start_matches('/');
                Pattern::new(trimmed).map_err(|source| Error::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Patterns configured by the `files_to_filter` setting.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.string_list("files_to_filter")?)
    }

    /// Whether no file will ever be filtered.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether any of the candidate relative paths matches a pattern.
    pub fn matches_any(&self, candidates: &[&str]) -> bool {
        candidates.iter().any(|candidate| {
            self.patterns
                .iter()
                .any(|pattern| pattern.matches_with(candidate, MATCH_OPTIONS))
        })
    }
}
