use super::*;
use crate::registry::NameTable;
use crate::resolver::{OverrideSet, OverrideTable};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_SIZE: usize = 2048;

fn key(s: &str) -> CodepointKey {
    CodepointKey::parse(s).unwrap()
}

fn png() -> Vec<u8> {
    vec![0x89; PNG_SIZE]
}

fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.source.cdn_base_template = format!("{}/source/apple/{{release}}", server.uri());
    config.source.page_base = format!("{}/apple", server.uri());
    config.storage.asset_dir = dir.path().join("emoji");
    config.storage.cache_path = dir.path().join("cache.json");
    config.fetch.connect_timeout = Duration::from_secs(2);
    config.fetch.request_timeout = Duration::from_secs(2);
    config.overrides.clear();
    config
}

fn names() -> NameTable {
    [
        (key("1f600"), "grinning-face".to_string()),
        (key("00a9"), "copyright-sign".to_string()),
    ]
    .into_iter()
    .collect()
}

fn pipeline(config: &Config, overrides: &[OverrideTable]) -> FetchPipeline {
    let resolver = SlugResolver::new(names(), OverrideSet::merge(overrides));
    FetchPipeline::from_config(config, resolver).unwrap()
}

fn empty_cache(dir: &TempDir) -> Mutex<DownloadCache> {
    Mutex::new(DownloadCache::empty(dir.path().join("cache.json")))
}

async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_skip_set_key_makes_no_requests() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("1f1e6"), &cache).await;

    assert_eq!(
        outcome,
        FetchOutcome::Skipped {
            reason: SkipReason::Component
        }
    );
    assert!(request_paths(&server).await.is_empty());
}

#[tokio::test]
async fn test_direct_fetch_stores_asset_and_marks_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/grinning-face_1f600.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("1f600"), &cache).await;

    assert_eq!(
        outcome,
        FetchOutcome::Fetched {
            via: FetchVia::Direct
        }
    );
    let stored = std::fs::read(dir.path().join("emoji").join("1f600.png")).unwrap();
    assert_eq!(stored.len(), PNG_SIZE);
    assert!(cache.lock().await.is_present(&key("1f600")));
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache_without_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/grinning-face_1f600.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);

    assert!(pipeline.fetch(&key("1f600"), &cache).await.is_fetched());
    let after_first = request_paths(&server).await.len();

    let outcome = pipeline.fetch(&key("1f600"), &cache).await;

    assert_eq!(
        outcome,
        FetchOutcome::Skipped {
            reason: SkipReason::AlreadyCached
        }
    );
    assert_eq!(request_paths(&server).await.len(), after_first);
}

#[tokio::test]
async fn test_cached_key_with_truncated_file_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/grinning-face_1f600.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);
    cache.lock().await.mark_present(&key("1f600"));
    std::fs::create_dir_all(dir.path().join("emoji")).unwrap();
    std::fs::write(dir.path().join("emoji").join("1f600.png"), b"tiny").unwrap();

    let outcome = pipeline.fetch(&key("1f600"), &cache).await;

    assert!(outcome.is_fetched());
    assert!(cache.lock().await.is_present(&key("1f600")));
}

#[tokio::test]
async fn test_placeholder_body_moves_to_next_template() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/grinning-face_1f600.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/grinning-face_1f600-fe0f.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("1f600"), &cache).await;

    assert_eq!(
        outcome,
        FetchOutcome::Fetched {
            via: FetchVia::Direct
        }
    );
    let stored = std::fs::read(dir.path().join("emoji").join("1f600.png")).unwrap();
    assert_eq!(stored.len(), PNG_SIZE, "placeholder must not be stored");
}

#[tokio::test]
async fn test_override_slug_is_tried_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/copyright_00a9.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let overrides = [OverrideTable::new("test").with(key("00a9"), "copyright")];
    let pipeline = pipeline(&config, &overrides);
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("00a9"), &cache).await;

    assert!(outcome.is_fetched());
    let paths = request_paths(&server).await;
    assert_eq!(paths[0], "/source/apple/391/copyright_00a9.png");
    assert!(
        !paths.iter().any(|p| p.contains("copyright-sign")),
        "derived slug must not be tried once the override succeeds: {paths:?}"
    );
}

#[tokio::test]
async fn test_scrape_fallback_when_no_slug_is_known() {
    let server = MockServer::start().await;
    let asset_url = format!("{}/source/apple/391/pile-of-poo_1f4a9.png", server.uri());
    Mock::given(method("GET"))
        .and(path_regex(r"^/apple/ios-17\.4/.+"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(r#"<html><img src="{asset_url}"></html>"#)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/pile-of-poo_1f4a9.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("1f4a9"), &cache).await;

    assert_eq!(
        outcome,
        FetchOutcome::Fetched {
            via: FetchVia::Scraped
        }
    );
    assert!(cache.lock().await.is_present(&key("1f4a9")));
}

#[tokio::test]
async fn test_scrape_follows_one_redirect() {
    let server = MockServer::start().await;
    let asset_url = format!("{}/source/apple/391/pile-of-poo_1f4a9.png", server.uri());
    Mock::given(method("GET"))
        .and(path("/apple/ios-17.4/pile-of-poo"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"<img src="{asset_url}">"#)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/apple/ios-17\.4/%"))
        .respond_with(
            ResponseTemplate::new(301).insert_header(
                "Location",
                format!("{}/apple/ios-17.4/pile-of-poo", server.uri()).as_str(),
            ),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/pile-of-poo_1f4a9.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("1f4a9"), &cache).await;

    assert_eq!(
        outcome,
        FetchOutcome::Fetched {
            via: FetchVia::Scraped
        }
    );
}

#[tokio::test]
async fn test_exhausted_sources_fail_without_error() {
    // Unmatched requests get 404 from wiremock
    let server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir);
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("1f600"), &cache).await;

    // two templates + lookup page
    assert_eq!(
        outcome,
        FetchOutcome::Failed {
            reason: FailureReason::ResolutionExhausted { attempts: 3 }
        }
    );
    assert!(!cache.lock().await.is_present(&key("1f600")));
    assert!(!dir.path().join("emoji").join("1f600.png").exists());
}

#[tokio::test]
async fn test_scrape_disabled_stops_after_direct_urls() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server, &dir);
    config.fetch.scrape_fallback = false;
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("1f600"), &cache).await;

    assert_eq!(
        outcome,
        FetchOutcome::Failed {
            reason: FailureReason::ResolutionExhausted { attempts: 2 }
        }
    );
    assert!(
        request_paths(&server)
            .await
            .iter()
            .all(|p| p.starts_with("/source/"))
    );
}

#[tokio::test]
async fn test_timeout_counts_as_failed_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/grinning-face_1f600.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/source/apple/391/grinning-face_1f600-fe0f.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server, &dir);
    config.fetch.request_timeout = Duration::from_millis(300);
    let pipeline = pipeline(&config, &[]);
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("1f600"), &cache).await;

    assert!(outcome.is_fetched());
}

/// Transport that counts calls and never touches the network
struct CountingTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl AssetTransport for CountingTransport {
    async fn get_asset(
        &self,
        _url: &str,
    ) -> std::result::Result<Vec<u8>, crate::error::TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(crate::error::TransportError::Connect("offline".into()))
    }

    async fn get_page(
        &self,
        _url: &str,
    ) -> std::result::Result<String, crate::error::TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(crate::error::TransportError::Timeout)
    }
}

#[tokio::test]
async fn test_transport_errors_never_escape() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.asset_dir = dir.path().join("emoji");
    let transport = Arc::new(CountingTransport {
        calls: AtomicUsize::new(0),
    });
    let resolver = SlugResolver::new(names(), OverrideSet::default());
    let pipeline = FetchPipeline::new(&config, resolver, transport.clone()).unwrap();
    let cache = empty_cache(&dir);

    let outcome = pipeline.fetch(&key("1f600"), &cache).await;

    assert!(matches!(outcome, FetchOutcome::Failed { .. }));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
}
