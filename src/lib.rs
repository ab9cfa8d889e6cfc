//! # emoji-dl
//!
//! Resumable downloader for emoji glyph images.
//!
//! For every codepoint sequence in an index, emoji-dl derives a CDN slug from
//! the Unicode emoji name, tries the templated asset URLs, falls back to
//! scraping the emoji's lookup page, and stores the image as `<key>.png`.
//! A local download cache makes repeated runs idempotent.
//!
//! ## Pipeline
//!
//! - [`codepoint`] normalizes raw tokens into [`CodepointKey`]s
//! - [`registry`] parses `emoji-test.txt` into a key → slug [`NameTable`]
//! - [`resolver`] orders slug candidates (overrides first)
//! - [`fetcher`] downloads one key with templated URLs and a scrape fallback
//! - [`cache`] remembers which keys are done
//! - [`batch`] runs a whole index on a fixed worker pool
//!
//! ## Quick Start
//!
//! ```no_run
//! use emoji_dl::{BatchOrchestrator, CodepointIndex, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let orchestrator = BatchOrchestrator::from_config(&config).await?;
//!
//!     let index = CodepointIndex::from_json_file("emoji_index.json")?;
//!     let report = orchestrator.run(&index).await?;
//!     println!("{} fetched, {} failed", report.stats.success, report.stats.failed);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Batch orchestration over a worker pool
pub mod batch;
/// Download cache
pub mod cache;
/// Codepoint keys
pub mod codepoint;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Fetch pipeline
pub mod fetcher;
/// Codepoint index loading
pub mod index;
/// Emoji registry parsing
pub mod registry;
/// Slug resolution and overrides
pub mod resolver;
/// Retry logic with exponential backoff
pub mod retry;
/// Component-only codepoints
pub mod skip_set;
/// Asset store and failure record
pub mod store;
/// Outcomes, statistics and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use batch::BatchOrchestrator;
pub use cache::DownloadCache;
pub use codepoint::CodepointKey;
pub use config::Config;
pub use error::{Error, Result, TransportError};
pub use fetcher::{AssetTransport, FetchPipeline, HttpTransport};
pub use index::CodepointIndex;
pub use registry::{NameTable, RegistrySource, slugify};
pub use resolver::{OverrideSet, OverrideTable, SlugResolver};
pub use skip_set::SkipSet;
pub use types::{BatchReport, BatchStats, Event, FailureReason, FetchOutcome, FetchVia, SkipReason};

/// Run a batch, stopping cleanly on a termination signal
///
/// If SIGTERM/SIGINT (Ctrl+C elsewhere) arrives first, the download cache and
/// failure record are written for the progress made so far and
/// [`Error::Interrupted`] is returned.
///
/// # Example
///
/// ```no_run
/// use emoji_dl::{BatchOrchestrator, CodepointIndex, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator = BatchOrchestrator::from_config(&Config::default()).await?;
///     let index = CodepointIndex::from_json_file("emoji_index.json")?;
///     let report = run_with_shutdown(&orchestrator, &index).await?;
///     println!("{:?}", report.stats);
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(
    orchestrator: &BatchOrchestrator,
    index: &CodepointIndex,
) -> Result<BatchReport> {
    orchestrator.run_until(index, wait_for_signal()).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
            _ = sigint.recv() => tracing::info!("Received SIGINT"),
        },
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, falling back to ctrl_c");
            wait_for_ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C; shutdown only on batch completion");
            std::future::pending::<()>().await;
        }
    }
}
