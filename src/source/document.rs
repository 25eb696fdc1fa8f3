use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use url::Url;

use crate::app::{Result, ShelfError};
use crate::fetcher::Fetcher;

/// Per-provider cache of raw documents keyed by URL.
///
/// Keeps a session from fetching the same listing or detail page twice;
/// `refresh` bypasses the cached copy and replaces it.
pub struct DocumentCache {
    base_url: Url,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    documents: Mutex<HashMap<String, Arc<str>>>,
}

impl DocumentCache {
    pub fn new(base_url: &str, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            fetcher,
            documents: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch a path relative to the base URL; an empty path is the home page.
    pub async fn get_path(&self, path: &str, refresh: bool) -> Result<Arc<str>> {
        let url = if path.is_empty() {
            self.base_url.clone()
        } else {
            self.base_url.join(path)?
        };
        self.get(url.as_str(), refresh).await
    }

    pub async fn get(&self, url: &str, refresh: bool) -> Result<Arc<str>> {
        if !refresh {
            let cached = self.lock()?.get(url).cloned();
            if let Some(doc) = cached {
                debug!("Document cache hit: {}", url);
                return Ok(doc);
            }
        }

        let bytes = self.fetcher.fetch(url, None).await?;
        let doc: Arc<str> = String::from_utf8_lossy(&bytes).into();
        self.lock()?.insert(url.to_string(), doc.clone());
        Ok(doc)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Arc<str>>>> {
        self.documents
            .lock()
            .map_err(|e| ShelfError::Other(format!("document cache poisoned: {}", e)))
    }
}
