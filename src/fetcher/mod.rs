//! Fetch pipeline -- materialize the asset for one codepoint key.
//!
//! Split into focused submodules:
//! - [`transport`] - HTTP seam and the reqwest implementation
//! - [`templates`] - Direct CDN URL rendering
//! - [`scrape`] - Lookup-page fallback
//!
//! The only observable results are [`FetchOutcome`] values. Network problems
//! inside a key's processing are logged and turned into "try the next source".

pub mod scrape;
pub mod templates;
pub mod transport;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use scrape::Scraper;
pub use templates::UrlTemplates;
pub use transport::{AssetTransport, HttpTransport};

use crate::cache::DownloadCache;
use crate::codepoint::CodepointKey;
use crate::config::Config;
use crate::error::Result;
use crate::resolver::SlugResolver;
use crate::skip_set::SkipSet;
use crate::store::AssetStore;
use crate::types::{FailureReason, FetchOutcome, FetchVia, SkipReason};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Resolves, downloads and stores assets for single keys
#[derive(Clone)]
pub struct FetchPipeline {
    resolver: Arc<SlugResolver>,
    skip: Arc<SkipSet>,
    templates: UrlTemplates,
    scraper: Option<Scraper>,
    store: AssetStore,
    transport: Arc<dyn AssetTransport>,
}

impl std::fmt::Debug for FetchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchPipeline")
            .field("templates", &self.templates)
            .field("scraper", &self.scraper)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl FetchPipeline {
    /// Build a pipeline that talks to the network through `transport`
    pub fn new(
        config: &Config,
        resolver: SlugResolver,
        transport: Arc<dyn AssetTransport>,
    ) -> Result<Self> {
        let cdn_base = config.source.cdn_base();
        let scraper = if config.fetch.scrape_fallback {
            Some(Scraper::new(
                &config.source.page_base,
                &config.source.release_tag,
                &cdn_base,
            )?)
        } else {
            None
        };

        Ok(Self {
            resolver: Arc::new(resolver),
            skip: Arc::new(SkipSet::with_extra(config.extra_skip.iter().cloned())),
            templates: UrlTemplates::new(cdn_base, config.source.url_templates.clone()),
            scraper,
            store: AssetStore::new(
                config.storage.asset_dir.clone(),
                config.fetch.min_asset_bytes,
            ),
            transport,
        })
    }

    /// Build a pipeline with the default HTTP transport
    pub fn from_config(config: &Config, resolver: SlugResolver) -> Result<Self> {
        let transport = HttpTransport::new(&config.fetch)?;
        Self::new(config, resolver, Arc::new(transport))
    }

    /// Skip set consulted before any work
    pub fn skip_set(&self) -> &SkipSet {
        &self.skip
    }

    /// Where assets are written
    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Whether `key` needs no network work at all
    ///
    /// Returns the skip reason for component keys and for keys the cache
    /// marks present whose stored file is still plausible. A cached key whose
    /// file went missing is dropped from the cache.
    pub async fn precheck(
        &self,
        key: &CodepointKey,
        cache: &Mutex<DownloadCache>,
    ) -> Option<SkipReason> {
        if self.skip.contains(key) {
            return Some(SkipReason::Component);
        }

        let cached = cache.lock().await.is_present(key);
        if cached {
            if self.store.has_plausible(key).await {
                return Some(SkipReason::AlreadyCached);
            }
            debug!(key = %key, "Cached asset missing or truncated, refetching");
            cache.lock().await.forget(key);
        }
        None
    }

    /// Run the full pipeline for `key`
    pub async fn fetch(&self, key: &CodepointKey, cache: &Mutex<DownloadCache>) -> FetchOutcome {
        if let Some(reason) = self.precheck(key, cache).await {
            debug!(key = %key, reason = ?reason, "Skipping");
            return FetchOutcome::Skipped { reason };
        }

        let mut attempts = 0;
        let found = match self.fetch_direct(key, &mut attempts).await {
            Some(bytes) => Some((bytes, FetchVia::Direct)),
            None => self
                .fetch_scraped(key, &mut attempts)
                .await
                .map(|bytes| (bytes, FetchVia::Scraped)),
        };

        let Some((bytes, via)) = found else {
            debug!(key = %key, attempts, "All sources exhausted");
            return FetchOutcome::Failed {
                reason: FailureReason::ResolutionExhausted { attempts },
            };
        };

        if let Err(e) = self.store.save(key, &bytes).await {
            warn!(key = %key, error = %e, "Failed to store asset");
            return FetchOutcome::Failed {
                reason: FailureReason::StoreFailed {
                    message: e.to_string(),
                },
            };
        }
        cache.lock().await.mark_present(key);

        info!(key = %key, via = ?via, bytes = bytes.len(), "Fetched asset");
        FetchOutcome::Fetched { via }
    }

    async fn fetch_direct(&self, key: &CodepointKey, attempts: &mut usize) -> Option<Vec<u8>> {
        for candidate in self.resolver.candidates(key) {
            for url in self.templates.render(&candidate.slug, key) {
                *attempts += 1;
                if let Some(bytes) = self.try_asset(key, &url).await {
                    return Some(bytes);
                }
            }
        }
        None
    }

    async fn fetch_scraped(&self, key: &CodepointKey, attempts: &mut usize) -> Option<Vec<u8>> {
        let scraper = self.scraper.as_ref()?;
        let page_url = scraper.page_url(key)?;

        *attempts += 1;
        let html = match self.transport.get_page(&page_url).await {
            Ok(html) => html,
            Err(e) => {
                debug!(key = %key, url = %page_url, error = %e, "Lookup page failed");
                return None;
            }
        };

        let Some(asset_url) = scraper.find_asset_url(&html) else {
            debug!(key = %key, url = %page_url, "No asset URL on lookup page");
            return None;
        };

        *attempts += 1;
        self.try_asset(key, &asset_url).await
    }

    /// One request; accepted only for a success status and a plausible size
    async fn try_asset(&self, key: &CodepointKey, url: &str) -> Option<Vec<u8>> {
        match self.transport.get_asset(url).await {
            Ok(bytes) if self.store.is_plausible_size(bytes.len() as u64) => Some(bytes),
            Ok(bytes) => {
                debug!(key = %key, url = %url, bytes = bytes.len(), "Rejected placeholder body");
                None
            }
            Err(e) => {
                debug!(key = %key, url = %url, error = %e, "Candidate failed");
                None
            }
        }
    }
}
