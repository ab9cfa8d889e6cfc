//! Download every emoji listed in an index file
//!
//! ```text
//! cargo run --example fetch_all -- emoji_index.json [config.json]
//! cargo run --example fetch_all -- --retry-failed [config.json]
//! ```
//!
//! Set `RUST_LOG=emoji_dl=debug` to see every candidate URL.

use emoji_dl::{BatchOrchestrator, CodepointIndex, Config, Event, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("emoji_dl=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let index_arg = args.next().unwrap_or_else(|| "emoji_index.json".to_string());
    let config = match args.next() {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    let orchestrator = BatchOrchestrator::from_config(&config).await?;

    let index = if index_arg == "--retry-failed" {
        CodepointIndex::from_failure_record(&config.storage.failure_path)?
    } else {
        CodepointIndex::from_json_file(&index_arg)?
    };
    if !index.rejected().is_empty() {
        eprintln!("Ignoring malformed entries: {:?}", index.rejected());
    }

    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Event::Progress {
                completed, total, ..
            } = event
            {
                println!("[{completed}/{total}]");
            }
        }
    });

    let report = run_with_shutdown(&orchestrator, &index).await?;
    let elapsed = report.finished_at - report.started_at;

    println!(
        "Done in {}s: {} fetched ({} scraped), {} skipped, {} failed",
        elapsed.num_seconds(),
        report.stats.success,
        report.stats.scraped,
        report.stats.skipped,
        report.stats.failed,
    );
    if !report.failures.is_empty() {
        println!(
            "Failed keys written to {}",
            config.storage.failure_path.display()
        );
    }
    Ok(())
}
