//! Manually curated slug overrides.
//!
//! The CDN's asset names sometimes differ from the mechanical slug (a "large-"
//! qualifier, a synonym, a codepoint suffix). Overrides are grouped into
//! versioned tables; tables are merged in order and the later table wins.
//! Every disagreement between tables is kept as an [`OverrideConflict`].

use crate::codepoint::CodepointKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// One versioned table of `key -> slug` overrides
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideTable {
    /// Label identifying this table (e.g. a date or release)
    pub version: String,

    /// Override slugs by key
    #[serde(default)]
    pub entries: BTreeMap<CodepointKey, String>,
}

/// Built-in overrides for names the CDN spells differently
const BUILTIN_OVERRIDES: &[(&str, &str)] = &[
    ("00a9", "copyright"),
    ("00ae", "registered"),
    ("2122", "trade-mark"),
    ("1f534", "large-red-circle"),
    ("1f535", "large-blue-circle"),
    ("2b1b", "black-large-square"),
    ("2b1c", "white-large-square"),
    ("1f1e6-1f1e8", "flag-ascension-island"),
    ("1f1e8-1f1ee", "flag-cote-divoire"),
    ("1f1f7-1f1ea", "flag-reunion"),
    ("1f1e7-1f1f1", "flag-st-barthelemy"),
    ("1f1e8-1f1fc", "flag-curacao"),
    ("1f1f8-1f1f9", "flag-sao-tome-principe"),
];

impl OverrideTable {
    /// Create an empty table
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add an entry, builder style
    pub fn with(mut self, key: CodepointKey, slug: impl Into<String>) -> Self {
        self.entries.insert(key, slug.into());
        self
    }

    /// The table shipped with the crate
    pub fn builtin() -> Self {
        let entries = BUILTIN_OVERRIDES
            .iter()
            .filter_map(|(key, slug)| {
                CodepointKey::parse(key)
                    .ok()
                    .map(|key| (key, (*slug).to_string()))
            })
            .collect();
        Self {
            version: "builtin".to_string(),
            entries,
        }
    }
}

/// Two tables disagreed on the slug for a key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverrideConflict {
    /// The contested key
    pub key: CodepointKey,
    /// Slug from the earlier table
    pub previous: String,
    /// Slug from the later table, which is kept
    pub replacement: String,
    /// Version label of the later table
    pub version: String,
}

/// Merged view over every configured override table
#[derive(Clone, Debug, Default)]
pub struct OverrideSet {
    slugs: HashMap<CodepointKey, String>,
    conflicts: Vec<OverrideConflict>,
}

impl OverrideSet {
    /// Merge tables in order, lowest precedence first
    pub fn merge<'a>(tables: impl IntoIterator<Item = &'a OverrideTable>) -> Self {
        let mut set = Self::default();
        for table in tables {
            for (key, slug) in &table.entries {
                if let Some(previous) = set.slugs.insert(key.clone(), slug.clone())
                    && previous != *slug
                {
                    warn!(
                        key = %key,
                        previous = %previous,
                        replacement = %slug,
                        version = %table.version,
                        "Override tables disagree, later table wins"
                    );
                    set.conflicts.push(OverrideConflict {
                        key: key.clone(),
                        previous,
                        replacement: slug.clone(),
                        version: table.version.clone(),
                    });
                }
            }
        }
        set
    }

    /// Override slug for a key, if any
    pub fn get(&self, key: &CodepointKey) -> Option<&str> {
        self.slugs.get(key).map(String::as_str)
    }

    /// Disagreements found while merging
    pub fn conflicts(&self) -> &[OverrideConflict] {
        &self.conflicts
    }

    /// Number of overridden keys
    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    /// Whether no key is overridden
    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}
