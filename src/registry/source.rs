//! Fetch-once source for the registry text.
//!
//! The registry is immutable for a given emoji release, so once a local copy
//! exists it is used forever and the remote URL is never contacted again.

use super::NameTable;
use crate::config::{RegistryConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::utils::write_atomic;
use std::path::PathBuf;
use tracing::{debug, info};

/// Remote registry URL paired with its permanent local copy
#[derive(Clone, Debug)]
pub struct RegistrySource {
    url: String,
    cache_path: PathBuf,
    retry: RetryConfig,
}

impl RegistrySource {
    /// Create a source from configuration
    pub fn new(config: &RegistryConfig, retry: RetryConfig) -> Self {
        Self {
            url: config.url.clone(),
            cache_path: config.cache_path.clone(),
            retry,
        }
    }

    /// Path of the local copy
    pub fn cache_path(&self) -> &std::path::Path {
        &self.cache_path
    }

    /// Registry text, from the local copy if present, otherwise downloaded once
    pub async fn load_text(&self, client: &reqwest::Client) -> Result<String> {
        if tokio::fs::try_exists(&self.cache_path).await? {
            debug!(path = %self.cache_path.display(), "Using local registry copy");
            return Ok(tokio::fs::read_to_string(&self.cache_path).await?);
        }

        info!(url = %self.url, "Downloading emoji registry");
        let url = self.url.as_str();
        let text = with_retry(&self.retry, "registry download", || async move {
            let response = client.get(url).send().await?.error_for_status()?;
            Ok::<_, Error>(response.text().await?)
        })
        .await?;

        if text.trim().is_empty() {
            return Err(Error::Registry(format!("{} returned an empty body", self.url)));
        }

        write_atomic(&self.cache_path, text.as_bytes()).await?;
        info!(
            path = %self.cache_path.display(),
            bytes = text.len(),
            "Saved emoji registry"
        );
        Ok(text)
    }

    /// Load the text and build the name table
    pub async fn load_table(&self, client: &reqwest::Client) -> Result<NameTable> {
        let text = self.load_text(client).await?;
        let table = NameTable::parse(&text);
        if table.is_empty() {
            return Err(Error::Registry(format!(
                "{} contains no emoji entries",
                self.cache_path.display()
            )));
        }
        info!(keys = table.len(), "Built emoji name table");
        Ok(table)
    }
}
