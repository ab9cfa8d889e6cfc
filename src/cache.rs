//! Download cache: which keys already have a verified asset on disk.
//!
//! The file is a plain JSON object (`{"1f600": true}`) that is safe to edit by
//! hand or delete. A missing or unparsable file never fails a run; it just
//! means every key is re-verified.

use crate::codepoint::CodepointKey;
use crate::error::{Error, Result};
use crate::utils::write_atomic;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// In-memory cache bound to its backing file
#[derive(Clone, Debug)]
pub struct DownloadCache {
    path: PathBuf,
    entries: BTreeMap<String, bool>,
    dirty: bool,
}

impl DownloadCache {
    /// An empty cache that will be flushed to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Load the cache, treating a missing file as empty
    ///
    /// Returns [`Error::CacheCorrupt`] when the file exists but is not a JSON
    /// object of booleans.
    pub async fn try_load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No download cache yet");
                return Ok(Self::empty(path));
            }
            Err(e) => {
                return Err(Error::CacheCorrupt {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        let entries: BTreeMap<String, bool> =
            serde_json::from_str(&text).map_err(|e| Error::CacheCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = %path.display(), entries = entries.len(), "Loaded download cache");
        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    /// Load the cache; any problem yields an empty cache
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_load(path.clone()).await {
            Ok(cache) => cache,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable download cache");
                Self::empty(path)
            }
        }
    }

    /// Whether the cache marks `key` as fetched
    pub fn is_present(&self, key: &CodepointKey) -> bool {
        self.entries.get(key.as_str()).copied().unwrap_or(false)
    }

    /// Record that `key` has a verified asset
    pub fn mark_present(&mut self, key: &CodepointKey) {
        if self.entries.insert(key.to_string(), true) != Some(true) {
            self.dirty = true;
        }
    }

    /// Drop `key` from the cache (its asset went missing)
    pub fn forget(&mut self, key: &CodepointKey) {
        if self.entries.remove(key.as_str()).is_some() {
            self.dirty = true;
        }
    }

    /// Whether there are changes not yet flushed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole cache to disk, replacing the previous file
    pub async fn flush(&mut self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.entries)?;
        write_atomic(&self.path, &json).await?;
        self.dirty = false;
        debug!(path = %self.path.display(), entries = self.entries.len(), "Flushed download cache");
        Ok(())
    }
}
