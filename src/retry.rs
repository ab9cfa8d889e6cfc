//! Exponential backoff for one-shot downloads
//!
//! Only downloads that must eventually succeed go through here, such as the
//! emoji registry. Per-candidate asset requests are never retried: a failed
//! candidate simply moves the pipeline on to the next one.
//!
//! ```no_run
//! use emoji_dl::config::RetryConfig;
//! use emoji_dl::retry::with_retry;
//!
//! # async fn example(client: reqwest::Client) -> emoji_dl::Result<String> {
//! let body = with_retry(&RetryConfig::default(), "registry download", || {
//!     let client = client.clone();
//!     async move {
//!         Ok::<_, emoji_dl::Error>(client.get("https://example.com").send().await?.text().await?)
//!     }
//! })
//! .await?;
//! # Ok(body)
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, TransportError};
use rand::Rng;
use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;

/// Classifies an error as transient (worth another attempt) or permanent
pub trait IsRetryable {
    /// Returns true if repeating the operation could succeed
    fn is_retryable(&self) -> bool;
}

/// 429 and every 5xx
fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

impl IsRetryable for TransportError {
    fn is_retryable(&self) -> bool {
        match self {
            TransportError::Status(status) => is_transient_status(*status),
            TransportError::Timeout | TransportError::Connect(_) | TransportError::Body(_) => true,
            TransportError::Request(_) => false,
        }
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| is_transient_status(s.as_u16()))
            }
            Error::Io(e) => matches!(
                e.kind(),
                ErrorKind::TimedOut
                    | ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

/// Delay schedule: `initial_delay`, then multiplied each step, capped at `max_delay`
#[derive(Debug, Clone)]
struct Backoff {
    next: Duration,
    multiplier: f64,
    cap: Duration,
    jitter: bool,
}

impl Backoff {
    fn new(config: &RetryConfig) -> Self {
        Self {
            next: config.initial_delay.min(config.max_delay),
            multiplier: config.backoff_multiplier,
            cap: config.max_delay,
            jitter: config.jitter,
        }
    }

    /// The delay to sleep now; advances the schedule
    fn step(&mut self) -> Duration {
        let current = self.next;
        // NaN, negative or overflowing products fall back to the cap
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .map_or(self.cap, |next| next.min(self.cap));
        if self.jitter {
            add_jitter(current)
        } else {
            current
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of retries
///
/// `max_attempts` counts retries after the first call, so the operation runs
/// at most `max_attempts + 1` times. `what` names the operation in logs.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    what: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut backoff = Backoff::new(config);
    let mut retries = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::info!(what, retries, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !err.is_retryable() {
            tracing::error!(what, error = %err, "Permanent failure");
            return Err(err);
        }
        if retries >= config.max_attempts {
            tracing::error!(what, error = %err, attempts = retries + 1, "Giving up");
            return Err(err);
        }

        retries += 1;
        let delay = backoff.step();
        tracing::warn!(
            what,
            error = %err,
            retry = retries,
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Stretch `delay` by a random factor in `[1, 2]`
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(1.0..=2.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay)
}
