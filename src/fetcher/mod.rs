pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Raw byte transport used by image caching and source documents.
#[async_trait]
pub trait Fetcher {
    /// Fetch `url`, sending `referer` for sources with hotlink protection.
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<Vec<u8>>;
}
