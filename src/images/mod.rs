//! Two-level cache for page and banner images: decoded images in memory,
//! raw bytes on disk, network as the last resort.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use image::DynamicImage;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};
use url::Url;

use crate::app::{Result, ShelfError};
use crate::domain::Series;
use crate::fetcher::Fetcher;

pub const PLACEHOLDER_WIDTH: u32 = 101;
pub const PLACEHOLDER_HEIGHT: u32 = 141;
pub const DEFAULT_PREFETCH_WORKERS: usize = 4;

/// One image to pull into the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub url: String,
    pub referer: Option<String>,
    pub destination: Option<PathBuf>,
}

pub struct ImageCache {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    image_dir: PathBuf,
    images: Mutex<HashMap<String, Arc<DynamicImage>>>,
    placeholder: Arc<DynamicImage>,
}

impl ImageCache {
    pub fn new<P: AsRef<Path>>(image_dir: P, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        let image_dir = image_dir.as_ref().to_path_buf();
        fs::create_dir_all(&image_dir)?;

        Ok(Self {
            fetcher,
            image_dir,
            images: Mutex::new(HashMap::new()),
            placeholder: Arc::new(DynamicImage::new_rgba8(
                PLACEHOLDER_WIDTH,
                PLACEHOLDER_HEIGHT,
            )),
        })
    }

    /// Blank image returned for empty URLs.
    pub fn placeholder(&self) -> Arc<DynamicImage> {
        self.placeholder.clone()
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Resolve an image: memory, then `destination` on disk, then network.
    ///
    /// Fetched bytes are written to `destination` when one is given. Bytes
    /// that do not decode are an error, never replaced by the placeholder.
    pub async fn fetch(
        &self,
        url: &str,
        referer: Option<&str>,
        destination: Option<&Path>,
    ) -> Result<Arc<DynamicImage>> {
        if url.is_empty() {
            return Ok(self.placeholder());
        }

        let cached = self.lock()?.get(url).cloned();
        if let Some(image) = cached {
            return Ok(image);
        }

        if let Some(path) = destination.filter(|p| p.is_file()) {
            debug!("Image disk hit: {}", path.display());
            let bytes = fs::read(path)?;
            let image = Arc::new(image::load_from_memory(&bytes)?);
            return self.remember(url, image);
        }

        debug!("Image miss, fetching {}", url);
        let bytes = self.fetcher.fetch(url, referer).await?;
        let image = Arc::new(image::load_from_memory(&bytes)?);

        if let Some(path) = destination {
            write_atomically(path, &bytes)?;
        }
        self.remember(url, image)
    }

    /// Fetch a batch concurrently, at most `workers` at a time.
    ///
    /// Failures are logged and counted out; returns how many succeeded.
    pub async fn prefetch(self: &Arc<Self>, requests: Vec<ImageRequest>, workers: usize) -> usize {
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut handles = Vec::new();

        for request in requests {
            let cache = self.clone();
            let semaphore = semaphore.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.ok()?;
                match cache
                    .fetch(
                        &request.url,
                        request.referer.as_deref(),
                        request.destination.as_deref(),
                    )
                    .await
                {
                    Ok(_) => Some(()),
                    Err(e) => {
                        warn!("Prefetch of {} failed: {}", request.url, e);
                        None
                    }
                }
            }));
        }

        join_all(handles)
            .await
            .into_iter()
            .filter(|joined| match joined {
                Ok(done) => done.is_some(),
                Err(e) => {
                    error!("Prefetch task join error: {}", e);
                    false
                }
            })
            .count()
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.lock().map(|m| m.contains_key(url)).unwrap_or(false)
    }

    /// Where a series banner lives on disk: `<images>/<series id>.<ext>`.
    pub fn banner_path(&self, series: &Series) -> PathBuf {
        self.image_dir
            .join(format!("{}.{}", series.id, extension_of(&series.banner_url)))
    }

    /// Fallback location for an arbitrary URL: its path with `/` flattened.
    pub fn default_path(&self, url: &str) -> PathBuf {
        let path = Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        self.image_dir.join(path.replace('/', "_"))
    }

    fn remember(&self, url: &str, image: Arc<DynamicImage>) -> Result<Arc<DynamicImage>> {
        self.lock()?.insert(url.to_string(), image.clone());
        Ok(image)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Arc<DynamicImage>>>> {
        self.images
            .lock()
            .map_err(|e| ShelfError::Other(format!("image cache poisoned: {}", e)))
    }
}

/// Location of a chapter page on disk: `<chapter dir>/<page>.<ext>`.
pub fn page_path(chapter_dir: &Path, page: usize, url: &str) -> PathBuf {
    chapter_dir.join(format!("{}.{}", page, extension_of(url)))
}

/// `scheme://host` of a chapter page, sent as referer for its images.
pub fn referer_for(info_page: &str) -> Option<String> {
    let url = Url::parse(info_page).ok()?;
    let host = url.host_str()?;
    Some(format!("{}://{}", url.scheme(), host))
}

fn extension_of(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("img")
        .to_string()
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
