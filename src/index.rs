//! The codepoint index: which keys a batch should cover.

use crate::codepoint::CodepointKey;
use crate::error::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Ordered list of distinct keys, plus the raw tokens that failed to normalize
///
/// Tokens that normalize to a key already in the index (`"1F600"` after
/// `"1f600"`) are dropped, so each key is fetched and counted once.
#[derive(Clone, Debug, Default)]
pub struct CodepointIndex {
    keys: Vec<CodepointKey>,
    rejected: Vec<String>,
    duplicates: usize,
}

impl CodepointIndex {
    /// Normalize every token, keeping first-seen order and setting malformed ones aside
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        let mut seen = HashSet::new();
        for token in tokens {
            let token = token.as_ref();
            match CodepointKey::parse(token) {
                Ok(key) => index.push_unique(key, &mut seen),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed index entry");
                    index.rejected.push(token.to_string());
                }
            }
        }
        if index.duplicates > 0 {
            debug!(duplicates = index.duplicates, "Dropped repeated index entries");
        }
        index
    }

    fn push_unique(&mut self, key: CodepointKey, seen: &mut HashSet<CodepointKey>) {
        if seen.insert(key.clone()) {
            self.keys.push(key);
        } else {
            self.duplicates += 1;
        }
    }

    /// Load a JSON array of key strings
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let tokens: Vec<String> = serde_json::from_str(&text)?;
        Ok(Self::from_tokens(tokens))
    }

    /// Load a failure record (one key per line) for a retry-only run
    pub fn from_failure_record(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_tokens(
            text.lines().map(str::trim).filter(|l| !l.is_empty()),
        ))
    }

    /// Normalized keys in index order
    pub fn keys(&self) -> &[CodepointKey] {
        &self.keys
    }

    /// Tokens that were not valid codepoint keys
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Entries dropped because their key was already present
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of distinct valid keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether there are no valid keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl From<Vec<CodepointKey>> for CodepointIndex {
    fn from(keys: Vec<CodepointKey>) -> Self {
        let mut index = Self::default();
        let mut seen = HashSet::new();
        for key in keys {
            index.push_unique(key, &mut seen);
        }
        index
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> CodepointKey {
        CodepointKey::parse(s).unwrap()
    }

    #[test]
    fn test_from_tokens_sets_malformed_aside() {
        let index = CodepointIndex::from_tokens(["1F600", "nope", "1f1fa-1f1f8"]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.keys()[0], "1f600");
        assert_eq!(index.keys()[1], "1f1fa-1f1f8");
        assert_eq!(index.rejected(), &["nope".to_string()]);
    }

    #[test]
    fn test_keys_normalizing_alike_are_kept_once() {
        let index = CodepointIndex::from_tokens(["1f600", "1F600", "00a9", "00A9"]);

        assert_eq!(index.keys(), &[key("1f600"), key("00a9")]);
        assert_eq!(index.duplicates(), 2);

        let from_keys = CodepointIndex::from(vec![key("1f601"), key("1f601")]);
        assert_eq!(from_keys.len(), 1);
        assert_eq!(from_keys.duplicates(), 1);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, r#"["1f600", "00A9"]"#).unwrap();

        let index = CodepointIndex::from_json_file(&path).unwrap();
        assert_eq!(index.keys()[1], "00a9");
    }

    #[test]
    fn test_from_failure_record_ignores_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.txt");
        std::fs::write(&path, "1f600\n\n  1f601  \n").unwrap();

        let index = CodepointIndex::from_failure_record(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.rejected().is_empty());
    }
}
