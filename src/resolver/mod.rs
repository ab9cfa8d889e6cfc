//! Slug resolution: codepoint key to ordered slug candidates.

pub mod overrides;

pub use overrides::{OverrideConflict, OverrideSet, OverrideTable};

use crate::codepoint::CodepointKey;
use crate::registry::NameTable;

/// Where a candidate slug came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlugSource {
    /// Manual override table
    Override,
    /// Registry name for the exact key
    Registry,
    /// Registry name for the key with variation selectors removed
    RegistryVariant,
}

/// One slug to try, with its provenance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlugCandidate {
    /// CDN slug
    pub slug: String,
    /// Provenance
    pub source: SlugSource,
}

/// Produces candidate slugs for a key, highest confidence first
#[derive(Clone, Debug)]
pub struct SlugResolver {
    names: NameTable,
    overrides: OverrideSet,
}

impl SlugResolver {
    /// Create a resolver over a name table and merged overrides
    pub fn new(names: NameTable, overrides: OverrideSet) -> Self {
        Self { names, overrides }
    }

    /// Candidate slugs for `key`
    ///
    /// An override is authoritative and returned alone. Otherwise the exact
    /// registry name is used, falling back to the name of the key without
    /// variation selectors. An empty list means only the scrape fallback can
    /// still find the asset.
    pub fn candidates(&self, key: &CodepointKey) -> Vec<SlugCandidate> {
        if let Some(slug) = self.overrides.get(key) {
            return vec![SlugCandidate {
                slug: slug.to_string(),
                source: SlugSource::Override,
            }];
        }

        if let Some(slug) = self.names.get(key).filter(|s| !s.is_empty()) {
            return vec![SlugCandidate {
                slug: slug.to_string(),
                source: SlugSource::Registry,
            }];
        }

        key.without_variation_selectors()
            .and_then(|variant| self.names.get(&variant).map(str::to_string))
            .filter(|slug| !slug.is_empty())
            .map(|slug| {
                vec![SlugCandidate {
                    slug,
                    source: SlugSource::RegistryVariant,
                }]
            })
            .unwrap_or_default()
    }

    /// The underlying name table
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// The merged override set
    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }
}
