//! Common test utilities for emoji-dl integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use emoji_dl::Config;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Configuration pointing every remote location at `server` and every local
/// path into `dir`
#[allow(dead_code)]
pub fn mock_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.source.cdn_base_template = format!("{}/source/apple/{{release}}", server.uri());
    config.source.page_base = format!("{}/apple", server.uri());
    config.registry.url = format!("{}/emoji/15.1/emoji-test.txt", server.uri());
    config.registry.cache_path = dir.path().join("emoji-test.txt");
    config.storage.asset_dir = dir.path().join("emoji");
    config.storage.cache_path = dir.path().join("download_cache.json");
    config.storage.failure_path = dir.path().join("failed.txt");
    config.fetch.connect_timeout = Duration::from_secs(2);
    config.fetch.request_timeout = Duration::from_secs(5);
    config.batch.workers = 2;
    config.batch.request_delay = Duration::from_millis(1);
    config.retry.initial_delay = Duration::from_millis(1);
    config.retry.jitter = false;
    config
}
