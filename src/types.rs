//! Core types: per-key outcomes, batch statistics and events

use crate::codepoint::CodepointKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a key was not fetched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Component-only codepoint with no standalone asset
    Component,
    /// Cache says present and the stored file is plausible
    AlreadyCached,
}

/// How an asset was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchVia {
    /// A templated CDN URL built from a slug
    Direct,
    /// An asset URL found on the lookup page
    Scraped,
}

/// Why a key could not be fetched
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Every slug candidate and the scrape fallback failed
    ResolutionExhausted {
        /// Number of URLs requested for this key
        attempts: usize,
    },
    /// The asset was downloaded but could not be written
    StoreFailed {
        /// I/O error message
        message: String,
    },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::ResolutionExhausted { attempts } => {
                write!(f, "no source succeeded after {attempts} requests")
            }
            FailureReason::StoreFailed { message } => write!(f, "could not store asset: {message}"),
        }
    }
}

/// Result of running the fetch pipeline on one key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum FetchOutcome {
    /// Nothing to do
    Skipped {
        /// Why
        reason: SkipReason,
    },
    /// Asset stored
    Fetched {
        /// Which strategy found it
        via: FetchVia,
    },
    /// No strategy produced an asset
    Failed {
        /// Why
        reason: FailureReason,
    },
}

impl FetchOutcome {
    /// Whether the asset was stored during this call
    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }
}

/// Aggregate counts for a batch
///
/// Every key in the index lands in exactly one of `success`, `skipped` and
/// `failed`. `scraped` is the subset of `success` found via the lookup page;
/// `already_cached` is the subset of `skipped` satisfied by the cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Assets fetched in this run
    pub success: usize,
    /// Keys that needed no work
    pub skipped: usize,
    /// Keys that exhausted every strategy
    pub failed: usize,
    /// Successes that came from the scrape fallback
    pub scraped: usize,
    /// Skips satisfied by the download cache
    pub already_cached: usize,
}

impl BatchStats {
    /// Count one outcome
    pub fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Skipped { reason } => {
                self.skipped += 1;
                if *reason == SkipReason::AlreadyCached {
                    self.already_cached += 1;
                }
            }
            FetchOutcome::Fetched { via } => {
                self.success += 1;
                if *via == FetchVia::Scraped {
                    self.scraped += 1;
                }
            }
            FetchOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Keys accounted for so far
    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

/// Summary of one batch run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchReport {
    /// Aggregate counts
    pub stats: BatchStats,
    /// Keys that failed, in completion order
    pub failures: Vec<CodepointKey>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

/// Events emitted while a batch runs
///
/// Subscribe with [`BatchOrchestrator::subscribe`](crate::batch::BatchOrchestrator::subscribe).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Run started
    BatchStarted {
        /// Keys in the index
        total: usize,
        /// Keys handed to workers after pre-filtering
        queued: usize,
    },
    /// One key finished
    KeyCompleted {
        /// The key
        key: CodepointKey,
        /// Its outcome
        outcome: FetchOutcome,
    },
    /// Periodic progress
    Progress {
        /// Keys accounted for so far
        completed: usize,
        /// Keys in the index
        total: usize,
        /// Counts so far
        stats: BatchStats,
    },
    /// Download cache written to disk
    CacheFlushed {
        /// Entries in the cache
        entries: usize,
    },
    /// Run finished
    BatchFinished {
        /// Final counts
        stats: BatchStats,
    },
}
