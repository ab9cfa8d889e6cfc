//! Worker loop -- drains the shared queue one key at a time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};

use crate::cache::DownloadCache;
use crate::codepoint::CodepointKey;
use crate::fetcher::FetchPipeline;
use crate::types::{Event, FetchOutcome};

use super::Tally;

/// Everything a worker shares with the orchestrator and its siblings
pub(super) struct WorkerContext {
    pub(super) queue: Arc<Mutex<VecDeque<CodepointKey>>>,
    pub(super) pipeline: FetchPipeline,
    pub(super) cache: Arc<Mutex<DownloadCache>>,
    pub(super) tally: Arc<Mutex<Tally>>,
    pub(super) event_tx: broadcast::Sender<Event>,
    pub(super) request_delay: Duration,
    pub(super) flush_every: usize,
    pub(super) progress_every: usize,
    pub(super) total: usize,
}

/// Pull keys until the queue is empty
pub(super) async fn run_worker(worker_id: usize, ctx: WorkerContext) {
    let mut processed = 0usize;
    loop {
        let next = ctx.queue.lock().await.pop_front();
        let Some(key) = next else {
            break;
        };

        // politeness delay between consecutive requests on this worker
        if processed > 0 && !ctx.request_delay.is_zero() {
            tokio::time::sleep(ctx.request_delay).await;
        }

        let outcome = ctx.pipeline.fetch(&key, &ctx.cache).await;
        record_outcome(&ctx, key, outcome).await;
        processed += 1;
    }
    tracing::debug!(worker_id, processed, "Worker finished");
}

/// Count an outcome and handle periodic flush and progress reporting
pub(super) async fn record_outcome(ctx: &WorkerContext, key: CodepointKey, outcome: FetchOutcome) {
    let (should_flush, progress) = {
        let mut tally = ctx.tally.lock().await;
        tally.stats.record(&outcome);
        match &outcome {
            FetchOutcome::Fetched { .. } => tally.successes_since_flush += 1,
            FetchOutcome::Failed { reason } => {
                tracing::warn!(key = %key, reason = %reason, "Failed to fetch asset");
                tally.failures.push(key.clone());
            }
            FetchOutcome::Skipped { .. } => {}
        }

        let should_flush = tally.successes_since_flush >= ctx.flush_every;
        if should_flush {
            tally.successes_since_flush = 0;
        }

        // keys skipped before dispatch also count, so boundaries can be jumped
        let mark = tally.stats.total() / ctx.progress_every;
        let progress = if mark > tally.progress_mark {
            tally.progress_mark = mark;
            Some(tally.stats)
        } else {
            None
        };
        (should_flush, progress)
    };

    let _ = ctx.event_tx.send(Event::KeyCompleted { key, outcome });

    if let Some(stats) = progress {
        tracing::info!(
            completed = stats.total(),
            total = ctx.total,
            success = stats.success,
            skipped = stats.skipped,
            failed = stats.failed,
            scraped = stats.scraped,
            "Progress"
        );
        let _ = ctx.event_tx.send(Event::Progress {
            completed: stats.total(),
            total: ctx.total,
            stats,
        });
    }

    if should_flush {
        let mut cache = ctx.cache.lock().await;
        match cache.flush().await {
            Ok(()) => {
                let _ = ctx.event_tx.send(Event::CacheFlushed {
                    entries: cache.len(),
                });
            }
            Err(e) => tracing::warn!(error = %e, "Periodic cache flush failed"),
        }
    }
}
