//! Asset store and failure record on disk.

use crate::codepoint::CodepointKey;
use crate::error::Result;
use crate::utils::write_atomic;
use std::path::{Path, PathBuf};

/// Directory of `<key>.png` files
#[derive(Clone, Debug)]
pub struct AssetStore {
    dir: PathBuf,
    min_bytes: u64,
}

impl AssetStore {
    /// Store rooted at `dir`; files of `min_bytes` or fewer count as absent
    pub fn new(dir: impl Into<PathBuf>, min_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            min_bytes,
        }
    }

    /// Path of the asset for `key`
    pub fn path_for(&self, key: &CodepointKey) -> PathBuf {
        self.dir.join(format!("{key}.png"))
    }

    /// Whether `len` bytes is large enough to be a real image
    pub fn is_plausible_size(&self, len: u64) -> bool {
        len > self.min_bytes
    }

    /// Whether a plausible asset for `key` exists on disk
    pub async fn has_plausible(&self, key: &CodepointKey) -> bool {
        match tokio::fs::metadata(self.path_for(key)).await {
            Ok(meta) => meta.is_file() && self.is_plausible_size(meta.len()),
            Err(_) => false,
        }
    }

    /// Persist asset bytes for `key`
    pub async fn save(&self, key: &CodepointKey, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(key);
        write_atomic(&path, bytes).await?;
        Ok(path)
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Write the failure record: one key per line, in the given order
pub async fn write_failure_record(path: &Path, failures: &[CodepointKey]) -> Result<()> {
    let mut text = String::new();
    for key in failures {
        text.push_str(key.as_str());
        text.push('\n');
    }
    write_atomic(path, text.as_bytes()).await?;
    tracing::debug!(path = %path.display(), count = failures.len(), "Wrote failure record");
    Ok(())
}
