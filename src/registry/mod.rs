//! Emoji name table built from the Unicode registry (`emoji-test.txt`).
//!
//! Data lines have the shape
//!
//! ```text
//! 1F600                                      ; fully-qualified     # 😀 E1.0 grinning face
//! ```
//!
//! Comment lines, group headers and anything else that does not fit this
//! grammar are skipped without error. The resulting [`NameTable`] maps each
//! [`CodepointKey`] to a [`slugify`]d display name.

pub mod source;

pub use source::RegistrySource;

use crate::codepoint::CodepointKey;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Qualification status of a registry entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Qualification {
    /// Sequence includes every required presentation selector
    FullyQualified,
    /// Sequence is missing some non-initial selectors
    MinimallyQualified,
    /// Sequence is missing the selectors entirely
    Unqualified,
    /// Modifier or flag letter that only appears inside other sequences
    Component,
}

impl Qualification {
    /// The status as written in the registry
    pub fn as_str(&self) -> &'static str {
        match self {
            Qualification::FullyQualified => "fully-qualified",
            Qualification::MinimallyQualified => "minimally-qualified",
            Qualification::Unqualified => "unqualified",
            Qualification::Component => "component",
        }
    }
}

impl std::str::FromStr for Qualification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fully-qualified" => Ok(Qualification::FullyQualified),
            "minimally-qualified" => Ok(Qualification::MinimallyQualified),
            "unqualified" => Ok(Qualification::Unqualified),
            "component" => Ok(Qualification::Component),
            other => Err(format!("unknown qualification status: {other}")),
        }
    }
}

/// One parsed data line of the registry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmojiNameEntry {
    /// Normalized codepoint key
    pub key: CodepointKey,
    /// Qualification status column
    pub qualification: Qualification,
    /// Human-readable name, e.g. "grinning face"
    pub display_name: String,
}

impl EmojiNameEntry {
    /// Parse a single registry line
    ///
    /// Returns `None` for comments, blank lines and anything that does not
    /// match the data-line grammar.
    pub fn parse_line(line: &str) -> Option<Self> {
        let caps = DATA_LINE.captures(line.trim())?;

        let key = CodepointKey::parse(&caps["codepoints"]).ok()?;
        let qualification = caps["status"].parse().ok()?;

        Some(Self {
            key,
            qualification,
            display_name: caps["name"].to_string(),
        })
    }
}

/// `<hex> [<hex>...] ; <status> # <glyph> E<major>.<minor> <name>`
#[allow(clippy::expect_used)]
static DATA_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<codepoints>[0-9A-Fa-f]+(?:[ \t]+[0-9A-Fa-f]+)*)\s*;\s*(?P<status>[a-z-]+)\s*#\s*\S+\s+E\d+\.\d+\s+(?P<name>\S.*?)\s*$",
    )
    .expect("registry line pattern is valid")
});

/// Apostrophe-like characters dropped before slug derivation
const QUOTE_CHARS: &[char] = &['\'', '\u{2019}', '\u{2018}', '\u{02bc}', '`'];

/// Derive a CDN slug from a display name
///
/// Lowercases, drops apostrophe-like quotes, turns whitespace, colons and any
/// other non `[a-z0-9]` character into hyphens, collapses hyphen runs and
/// trims hyphens at both ends.
///
/// # Examples
///
/// ```
/// use emoji_dl::registry::slugify;
///
/// assert_eq!(slugify("grinning face"), "grinning-face");
/// assert_eq!(slugify("flag: United States"), "flag-united-states");
/// assert_eq!(slugify("man’s shoe"), "mans-shoe");
/// ```
pub fn slugify(display_name: &str) -> String {
    let mut slug = String::with_capacity(display_name.len());
    for c in display_name.chars().flat_map(char::to_lowercase) {
        if QUOTE_CHARS.contains(&c) {
            continue;
        }
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Parse statistics for a registry text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Total lines read
    pub lines: usize,
    /// Lines that matched the data-line grammar
    pub entries: usize,
    /// Distinct keys in the resulting table
    pub keys: usize,
}

/// Mapping from codepoint key to derived slug
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    slugs: HashMap<CodepointKey, String>,
    stats: ParseStats,
}

impl NameTable {
    /// Build the table from registry text
    ///
    /// A line's slug is stored when its status is `fully-qualified` or when
    /// the key has no slug yet, so fully-qualified names win regardless of
    /// line order and any status can seed the first value.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for line in text.lines() {
            table.stats.lines += 1;
            if let Some(entry) = EmojiNameEntry::parse_line(line) {
                table.stats.entries += 1;
                table.insert(entry);
            }
        }
        table.stats.keys = table.slugs.len();

        debug!(
            lines = table.stats.lines,
            entries = table.stats.entries,
            keys = table.stats.keys,
            "Parsed emoji registry"
        );
        table
    }

    /// Apply the insertion policy for one entry
    pub fn insert(&mut self, entry: EmojiNameEntry) {
        let slug = slugify(&entry.display_name);
        if entry.qualification == Qualification::FullyQualified {
            self.slugs.insert(entry.key, slug);
        } else {
            self.slugs.entry(entry.key).or_insert(slug);
        }
    }

    /// Slug for an exact key
    pub fn get(&self, key: &CodepointKey) -> Option<&str> {
        self.slugs.get(key).map(String::as_str)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    /// Whether the table has no keys
    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }

    /// Statistics from the last [`NameTable::parse`]
    pub fn stats(&self) -> ParseStats {
        self.stats
    }
}

impl FromIterator<(CodepointKey, String)> for NameTable {
    fn from_iter<I: IntoIterator<Item = (CodepointKey, String)>>(iter: I) -> Self {
        let slugs: HashMap<_, _> = iter.into_iter().collect();
        let keys = slugs.len();
        Self {
            slugs,
            stats: ParseStats {
                keys,
                ..Default::default()
            },
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
