//! Codepoints that never have a standalone rendered asset.

use crate::codepoint::CodepointKey;
use std::collections::HashSet;

/// Regional indicator symbols A..Z
const REGIONAL_INDICATORS: std::ops::RangeInclusive<u32> = 0x1f1e6..=0x1f1ff;
/// Fitzpatrick skin-tone modifiers
const SKIN_TONE_MODIFIERS: std::ops::RangeInclusive<u32> = 0x1f3fb..=0x1f3ff;

/// Static set of component-only keys
#[derive(Clone, Debug)]
pub struct SkipSet {
    keys: HashSet<CodepointKey>,
}

impl SkipSet {
    /// Regional indicator letters and skin-tone modifiers
    pub fn components() -> Self {
        let keys = REGIONAL_INDICATORS
            .chain(SKIN_TONE_MODIFIERS)
            .filter_map(|cp| CodepointKey::parse(&format!("{cp:x}")).ok())
            .collect();
        Self { keys }
    }

    /// Component keys plus `extra`
    pub fn with_extra(extra: impl IntoIterator<Item = CodepointKey>) -> Self {
        let mut set = Self::components();
        set.keys.extend(extra);
        set
    }

    /// Whether `key` is a component-only codepoint
    pub fn contains(&self, key: &CodepointKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of keys in the set
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for SkipSet {
    fn default() -> Self {
        Self::components()
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
    fn test_components_cover_flags_letters_and_skin_tones() {
        let set = SkipSet::components();

        assert_eq!(set.len(), 26 + 5);
        assert!(set.contains(&key("1f1e6")));
        assert!(set.contains(&key("1f1ff")));
        assert!(set.contains(&key("1f3fb")));
        assert!(set.contains(&key("1f3ff")));
    }

    #[test]
    fn test_sequences_are_not_skipped() {
        let set = SkipSet::components();

        assert!(!set.contains(&key("1f1fa-1f1f8")), "flags are real assets");
        assert!(!set.contains(&key("1f44b-1f3fb")), "toned hands are real assets");
        assert!(!set.contains(&key("1f600")));
    }

    #[test]
    fn test_extra_keys() {
        let set = SkipSet::with_extra([key("1f9b0")]);
        assert!(set.contains(&key("1f9b0")));
        assert!(set.contains(&key("1f1e6")));
    }
}
