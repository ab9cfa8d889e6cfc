//! HTTP access for the fetch pipeline.
//!
//! [`AssetTransport`] is the seam between the pipeline and the network; the
//! pipeline only sees bodies or [`TransportError`]s.

use crate::config::FetchConfig;
use crate::error::{Error, Result, TransportError};
use async_trait::async_trait;

/// Something that can GET assets and lookup pages
#[async_trait]
pub trait AssetTransport: Send + Sync {
    /// GET `url` and return the body when the status is a success
    async fn get_asset(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError>;

    /// GET a lookup page, following at most one redirect
    async fn get_page(&self, url: &str) -> std::result::Result<String, TransportError>;
}

/// reqwest-backed transport with bounded timeouts
#[derive(Clone, Debug)]
pub struct HttpTransport {
    assets: reqwest::Client,
    pages: reqwest::Client,
}

impl HttpTransport {
    /// Build both clients from the fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let build = |redirect: reqwest::redirect::Policy| {
            reqwest::Client::builder()
                .connect_timeout(config.connect_timeout)
                .timeout(config.request_timeout)
                .user_agent(config.user_agent.as_str())
                .redirect(redirect)
                .build()
                .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))
        };

        Ok(Self {
            assets: build(reqwest::redirect::Policy::default())?,
            pages: build(reqwest::redirect::Policy::limited(1))?,
        })
    }

    /// Client used for asset downloads, also suitable for the registry
    pub fn client(&self) -> &reqwest::Client {
        &self.assets
    }
}

async fn get_checked(
    client: &reqwest::Client,
    url: &str,
) -> std::result::Result<reqwest::Response, TransportError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }
    Ok(response)
}

#[async_trait]
impl AssetTransport for HttpTransport {
    async fn get_asset(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        let response = get_checked(&self.assets, url).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn get_page(&self, url: &str) -> std::result::Result<String, TransportError> {
        let response = get_checked(&self.pages, url).await?;
        Ok(response.text().await?)
    }
}
