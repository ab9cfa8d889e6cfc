//! Direct asset URL templates.

use crate::codepoint::CodepointKey;

/// URL templates bound to a CDN base
///
/// Placeholders: `{base}`, `{slug}`, `{key}`, `{key_vs}`.
#[derive(Clone, Debug)]
pub struct UrlTemplates {
    base: String,
    templates: Vec<String>,
}

impl UrlTemplates {
    /// Bind `templates` to `base` (no trailing slash)
    pub fn new(base: impl Into<String>, templates: Vec<String>) -> Self {
        Self {
            base: base.into(),
            templates,
        }
    }

    /// CDN base these templates render against
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Every distinct URL for `slug` and `key`, in template order
    pub fn render(&self, slug: &str, key: &CodepointKey) -> Vec<String> {
        let key_vs = key.with_trailing_vs16();
        let mut urls: Vec<String> = Vec::with_capacity(self.templates.len());
        for template in &self.templates {
            let url = template
                .replace("{base}", &self.base)
                .replace("{slug}", slug)
                .replace("{key_vs}", &key_vs)
                .replace("{key}", key.as_str());
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}
