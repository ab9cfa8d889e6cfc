//! Lookup-page fallback: find the asset URL on the human-facing emoji page.

use crate::codepoint::CodepointKey;
use crate::error::{Error, Result};
use regex::Regex;

/// Builds lookup page URLs and extracts asset URLs from their HTML
#[derive(Clone, Debug)]
pub struct Scraper {
    page_base: String,
    release_tag: String,
    asset_pattern: Regex,
}

impl Scraper {
    /// Scraper for pages under `page_base/release_tag` whose assets live under `cdn_base`
    pub fn new(page_base: &str, release_tag: &str, cdn_base: &str) -> Result<Self> {
        let pattern = format!(r#"{}/[^\s"'<>()\\]+?\.png"#, regex::escape(cdn_base));
        let asset_pattern = Regex::new(&pattern)
            .map_err(|e| Error::config("source.cdn_base_template", e.to_string()))?;
        Ok(Self {
            page_base: page_base.trim_end_matches('/').to_string(),
            release_tag: release_tag.trim_matches('/').to_string(),
            asset_pattern,
        })
    }

    /// Lookup page for `key`, or `None` if the key is not renderable
    pub fn page_url(&self, key: &CodepointKey) -> Option<String> {
        let glyph = key.to_glyph()?;
        Some(format!(
            "{}/{}/{}",
            self.page_base,
            self.release_tag,
            urlencoding::encode(&glyph)
        ))
    }

    /// First asset URL for the current release found in `html`
    pub fn find_asset_url(&self, html: &str) -> Option<String> {
        self.asset_pattern
            .find(html)
            .map(|m| m.as_str().to_string())
    }
}
