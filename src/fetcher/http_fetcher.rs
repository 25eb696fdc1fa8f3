use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::Client;

use crate::app::Result;
use crate::fetcher::Fetcher;

pub const DEFAULT_USER_AGENT: &str = concat!("mangashelf/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<Vec<u8>> {
        let mut headers = HeaderMap::new();

        if let Some(referer) = referer.filter(|r| !r.is_empty()) {
            if let Ok(value) = HeaderValue::from_str(referer) {
                headers.insert(REFERER, value);
            }
        }

        let response = self.client.get(url).headers(headers).send().await?;
        response.error_for_status_ref()?;

        tracing::debug!("Fetched {} ({:?})", url, response.content_length());
        Ok(response.bytes().await?.to_vec())
    }
}
