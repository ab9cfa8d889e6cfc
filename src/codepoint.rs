//! Codepoint keys: the canonical identifier for an emoji sequence.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Emoji presentation selector (VS16)
pub const VS16: &str = "fe0f";
/// Text presentation selector (VS15)
pub const VS15: &str = "fe0e";

/// Canonical key for a Unicode codepoint sequence
///
/// Lowercase hexadecimal groups joined by hyphens (`"1f1fa-1f1f8"`). Leading
/// zeros are kept exactly as emitted by the source, so `"00a9"` and `"a9"` are
/// different keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodepointKey(String);

impl CodepointKey {
    /// Normalize a raw codepoint token into a key
    ///
    /// Accepts hyphen-delimited groups (index files) or whitespace-delimited
    /// groups (registry lines). Every group is lowercased; nothing is
    /// reordered, deduplicated or zero-stripped.
    ///
    /// # Examples
    ///
    /// ```
    /// use emoji_dl::codepoint::CodepointKey;
    ///
    /// let key = CodepointKey::parse("1F1FA 1F1F8").unwrap();
    /// assert_eq!(key.as_str(), "1f1fa-1f1f8");
    /// assert!(CodepointKey::parse("0x1f600").is_err());
    /// ```
    pub fn parse(token: &str) -> Result<Self> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(malformed(token, "empty token"));
        }

        let mut groups = Vec::new();
        for group in trimmed.split(|c: char| c == '-' || c.is_whitespace()) {
            if group.is_empty() {
                // consecutive whitespace in registry lines
                if trimmed.contains('-') {
                    return Err(malformed(token, "empty codepoint group"));
                }
                continue;
            }
            if !group.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(malformed(
                    token,
                    &format!("group {group:?} is not hexadecimal"),
                ));
            }
            groups.push(group.to_ascii_lowercase());
        }

        Ok(Self(groups.join("-")))
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the hex groups of this key
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.0.split('-')
    }

    /// Whether any group is a variation selector
    pub fn has_variation_selector(&self) -> bool {
        self.groups().any(|g| g == VS16 || g == VS15)
    }

    /// The same key with every variation selector group removed
    ///
    /// Returns `None` when stripping would leave nothing or changes nothing.
    pub fn without_variation_selectors(&self) -> Option<Self> {
        if !self.has_variation_selector() {
            return None;
        }
        let stripped: Vec<&str> = self
            .groups()
            .filter(|g| *g != VS16 && *g != VS15)
            .collect();
        if stripped.is_empty() {
            return None;
        }
        Some(Self(stripped.join("-")))
    }

    /// The key with a trailing `-fe0f` appended unless it already ends with one
    pub fn with_trailing_vs16(&self) -> String {
        if self.0.ends_with(VS16) {
            self.0.clone()
        } else {
            format!("{}-{}", self.0, VS16)
        }
    }

    /// Render the literal glyph string for this sequence
    ///
    /// Returns `None` if any group is not a Unicode scalar value.
    pub fn to_glyph(&self) -> Option<String> {
        self.groups()
            .map(|g| u32::from_str_radix(g, 16).ok().and_then(char::from_u32))
            .collect()
    }
}

fn malformed(token: &str, reason: &str) -> Error {
    Error::MalformedCodepoint {
        token: token.to_string(),
        reason: reason.to_string(),
    }
}

impl std::fmt::Display for CodepointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CodepointKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CodepointKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CodepointKey> for String {
    fn from(key: CodepointKey) -> Self {
        key.0
    }
}

impl AsRef<str> for CodepointKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CodepointKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CodepointKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
