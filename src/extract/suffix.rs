//! The set of file-format suffixes a run is filtering for.

use std::fmt;

/// Formats preselected when the user names none.
pub const DEFAULT_FORMATS: [&str; 2] = [".mp3", ".jpg"];

/// Ordered, duplicate-free set of lower-cased suffixes, each starting with `.`.
///
/// Insertion order is kept because extraction tests suffixes in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixSet {
    suffixes: Vec<String>,
}

impl SuffixSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the set of [`DEFAULT_FORMATS`].
    #[must_use]
    pub fn default_formats() -> Self {
        DEFAULT_FORMATS.iter().collect()
    }

    /// Normalizes `raw` and adds it to the set.
    ///
    /// `"MP3"`, `" .Mp3 "` and `".mp3"` all become `".mp3"`. Blank input is
    /// ignored. Returns `true` only if the set changed.
    pub fn insert(&mut self, raw: &str) -> bool {
        let Some(suffix) = normalize(raw) else {
            return false;
        };
        if self.suffixes.contains(&suffix) {
            return false;
        }
        self.suffixes.push(suffix);
        true
    }

    /// Removes a suffix (normalized the same way as [`insert`](Self::insert)).
    pub fn remove(&mut self, raw: &str) -> bool {
        let Some(suffix) = normalize(raw) else {
            return false;
        };
        let before = self.suffixes.len();
        self.suffixes.retain(|existing| existing != &suffix);
        self.suffixes.len() != before
    }

    /// Returns `true` when `value`, lower-cased, ends with any member.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        let lowered = value.to_lowercase();
        self.suffixes.iter().any(|suffix| lowered.ends_with(suffix))
    }

    /// Iterates the suffixes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.suffixes.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.suffixes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }
}

fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('.') {
        Some(trimmed)
    } else {
        Some(format!(".{trimmed}"))
    }
}

impl<S: AsRef<str>> FromIterator<S> for SuffixSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for raw in iter {
            set.insert(raw.as_ref());
        }
        set
    }
}

impl fmt::Display for SuffixSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffixes.join(", "))
    }
}
