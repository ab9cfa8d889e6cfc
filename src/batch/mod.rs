//! Batch orchestration -- drive a whole codepoint index through the fetch pipeline.
//!
//! Every run builds its own mutable state (download cache, counts, failure
//! list), so several batches (e.g. one per CDN release) can run in the same
//! process without sharing anything.

mod worker;


use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::cache::DownloadCache;
use crate::codepoint::CodepointKey;
use crate::config::{BatchConfig, Config};
use crate::error::{Error, Result};
use crate::fetcher::{FetchPipeline, HttpTransport};
use crate::index::CodepointIndex;
use crate::registry::RegistrySource;
use crate::resolver::{OverrideSet, SlugResolver};
use crate::store::write_failure_record;
use crate::types::{BatchReport, BatchStats, Event, FetchOutcome};

use worker::{WorkerContext, run_worker};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Counts and failures shared by all workers
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub(crate) stats: BatchStats,
    pub(crate) failures: Vec<CodepointKey>,
    pub(crate) successes_since_flush: usize,
    /// Highest `completed / progress_every` already reported
    pub(crate) progress_mark: usize,
}

/// Mutable state of a single run
///
/// Built fresh by every call to [`BatchOrchestrator::run`], so concurrent
/// runs on one orchestrator never see each other's counts.
struct RunState {
    cache: Arc<Mutex<DownloadCache>>,
    tally: Arc<Mutex<Tally>>,
}

/// Runs batches of keys through a [`FetchPipeline`] with a fixed worker pool
pub struct BatchOrchestrator {
    pipeline: FetchPipeline,
    settings: BatchConfig,
    cache_path: PathBuf,
    failure_path: PathBuf,
    event_tx: broadcast::Sender<Event>,
}

impl BatchOrchestrator {
    /// Create an orchestrator around an existing pipeline
    pub fn new(config: &Config, pipeline: FetchPipeline) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pipeline,
            settings: config.batch.clone(),
            cache_path: config.storage.cache_path.clone(),
            failure_path: config.storage.failure_path.clone(),
            event_tx,
        }
    }

    /// Wire everything from configuration
    ///
    /// Loads (or downloads once) the emoji registry, builds the name table,
    /// merges override tables and constructs the HTTP pipeline.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let transport = HttpTransport::new(&config.fetch)?;
        let source = RegistrySource::new(&config.registry, config.retry.clone());
        let names = source.load_table(transport.client()).await?;

        let overrides = OverrideSet::merge(&config.overrides);
        if !overrides.conflicts().is_empty() {
            warn!(
                conflicts = overrides.conflicts().len(),
                "Override tables disagree; the most recent table was used"
            );
        }

        let resolver = SlugResolver::new(names, overrides);
        let pipeline = FetchPipeline::new(config, resolver, Arc::new(transport))?;
        Ok(Self::new(config, pipeline))
    }

    /// Subscribe to batch events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The pipeline used for each key
    pub fn pipeline(&self) -> &FetchPipeline {
        &self.pipeline
    }

    /// Process every key in `index`
    ///
    /// Component keys and keys already satisfied by the cache are counted as
    /// skipped without being queued. The rest are drained by a fixed number of
    /// workers. The cache is flushed periodically and once more at the end,
    /// and the failure record is rewritten with this run's failures.
    ///
    /// Dropping the returned future aborts the workers; no request is started
    /// after that.
    pub async fn run(&self, index: &CodepointIndex) -> Result<BatchReport> {
        self.run_until(index, std::future::pending()).await
    }

    /// Like [`run`](Self::run), but stops early once `shutdown` completes
    ///
    /// On shutdown the workers are aborted, the cache and failure record are
    /// written for the progress made so far, and [`Error::Interrupted`] is
    /// returned.
    pub async fn run_until<S>(&self, index: &CodepointIndex, shutdown: S) -> Result<BatchReport>
    where
        S: Future<Output = ()>,
    {
        let started_at = Utc::now();
        let total = index.len();

        let state = RunState {
            cache: Arc::new(Mutex::new(
                DownloadCache::load(self.cache_path.clone()).await,
            )),
            tally: Arc::new(Mutex::new(Tally::default())),
        };

        if !index.rejected().is_empty() {
            warn!(
                count = index.rejected().len(),
                "Index contains malformed entries that will not be processed"
            );
        }

        let mut queue = VecDeque::with_capacity(total);
        for key in index.keys() {
            match self.pipeline.precheck(key, &state.cache).await {
                Some(reason) => {
                    let outcome = FetchOutcome::Skipped { reason };
                    state.tally.lock().await.stats.record(&outcome);
                    let _ = self.event_tx.send(Event::KeyCompleted {
                        key: key.clone(),
                        outcome,
                    });
                }
                None => queue.push_back(key.clone()),
            }
        }

        let queued = queue.len();
        let worker_count = self.settings.workers.min(queued).max(1);
        info!(total, queued, workers = worker_count, "Starting batch");
        let _ = self.event_tx.send(Event::BatchStarted { total, queued });

        // aborted on drop, so a cancelled run leaves nothing behind
        let mut workers = JoinSet::new();
        let queue = Arc::new(Mutex::new(queue));
        for worker_id in 0..worker_count {
            let ctx = WorkerContext {
                queue: Arc::clone(&queue),
                pipeline: self.pipeline.clone(),
                cache: Arc::clone(&state.cache),
                tally: Arc::clone(&state.tally),
                event_tx: self.event_tx.clone(),
                request_delay: self.settings.request_delay,
                flush_every: self.settings.flush_every.max(1),
                progress_every: self.settings.progress_every.max(1),
                total,
            };
            workers.spawn(run_worker(worker_id, ctx));
        }

        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => error!(error = %e, "Worker task panicked"),
                    None => break,
                },
                () = &mut shutdown => {
                    warn!("Interrupted, saving progress");
                    workers.shutdown().await;
                    self.checkpoint(&state).await?;
                    return Err(Error::Interrupted);
                }
            }
        }

        self.checkpoint(&state).await?;

        let (stats, failures) = {
            let tally = state.tally.lock().await;
            (tally.stats, tally.failures.clone())
        };
        self.log_summary(&stats, &failures);
        let _ = self.event_tx.send(Event::BatchFinished { stats });

        Ok(BatchReport {
            stats,
            failures,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Flush the run's cache and write its failure record
    async fn checkpoint(&self, state: &RunState) -> Result<()> {
        {
            let mut cache = state.cache.lock().await;
            cache.flush().await?;
            let _ = self.event_tx.send(Event::CacheFlushed {
                entries: cache.len(),
            });
        }
        let failures = state.tally.lock().await.failures.clone();
        write_failure_record(&self.failure_path, &failures).await
    }

    fn log_summary(&self, stats: &BatchStats, failures: &[CodepointKey]) {
        info!(
            success = stats.success,
            skipped = stats.skipped,
            failed = stats.failed,
            scraped = stats.scraped,
            already_cached = stats.already_cached,
            "Batch finished"
        );
        if failures.is_empty() {
            return;
        }

        let preview: Vec<&str> = failures
            .iter()
            .take(self.settings.failure_preview)
            .map(CodepointKey::as_str)
            .collect();
        warn!(
            failed = failures.len(),
            preview = %preview.join(", "),
            record = %self.failure_path.display(),
            "Some keys could not be fetched"
        );
    }
}
