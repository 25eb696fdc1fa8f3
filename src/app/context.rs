use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::app::error::{Result, ShelfError};
use crate::config::Config;
use crate::domain::{Chapter, Series};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::images::{page_path, referer_for, ImageCache, ImageRequest};
use crate::progress::{ChapterStep, PageMove, ReadingProgress};
use crate::source::SourceRegistry;
use crate::store::ContentStore;
use crate::viewer::{EntryId, PresenceHook, ViewerEntry, ViewerKind, ViewerStack};

pub const MANGA_DIR: &str = "manga";
pub const IMAGES_DIR: &str = "images";
pub const LOG_FILE: &str = "mangashelf.log";

/// Catalog listings shown on the main page.
#[derive(Debug, Default, Clone)]
pub struct Listings {
    pub popular: Vec<Series>,
    pub recently_updated: Vec<Series>,
}

/// Everything the front-end needs, passed explicitly instead of a global.
pub struct AppContext {
    pub config: Config,
    pub store: ContentStore,
    pub images: Arc<ImageCache>,
    pub viewers: ViewerStack,
    pub sources: SourceRegistry,
    pub listings: Listings,
    data_dir: PathBuf,
    search_results: HashMap<EntryId, Vec<Series>>,
}

impl AppContext {
    /// Open the data directory with an HTTP fetcher built from the config.
    pub async fn open(
        data_dir: &Path,
        config: Config,
        sources: SourceRegistry,
        presence: Box<dyn PresenceHook>,
    ) -> Result<Self> {
        let fetcher = match &config.images.user_agent {
            Some(agent) => HttpFetcher::with_user_agent(agent)?,
            None => HttpFetcher::new()?,
        };
        Self::with_fetcher(data_dir, config, sources, presence, Arc::new(fetcher)).await
    }

    /// Create `manga/` and `images/` under `data_dir` if missing, then load
    /// every cached series.
    pub async fn with_fetcher(
        data_dir: &Path,
        config: Config,
        sources: SourceRegistry,
        presence: Box<dyn PresenceHook>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Self> {
        fs::create_dir_all(data_dir)?;

        let mut store = ContentStore::open(data_dir.join(MANGA_DIR))?;
        let report = store.load_all(&sources).await?;
        info!(
            "Loaded {} series ({} corrupt entries removed, {} chapters filled)",
            report.loaded,
            report.removed.len(),
            report.materialized
        );

        let images = Arc::new(ImageCache::new(data_dir.join(IMAGES_DIR), fetcher)?);

        Ok(Self {
            config,
            store,
            images,
            viewers: ViewerStack::new(presence),
            sources,
            listings: Listings::default(),
            data_dir: data_dir.to_path_buf(),
            search_results: HashMap::new(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // Discovery

    /// Pull the popular and recently updated lists from every source.
    pub async fn refresh_listings(&mut self) -> Result<()> {
        let mut listings = Listings::default();
        for source in self.sources.iter() {
            listings.popular.extend(source.list_popular().await?);
            listings
                .recently_updated
                .extend(source.list_recently_updated().await?);
        }
        debug!(
            "Listings: {} popular, {} recently updated",
            listings.popular.len(),
            listings.recently_updated.len()
        );
        self.listings = listings;
        Ok(())
    }

    /// Search every source and open a results tab.
    pub async fn search(&mut self, query: &str) -> Result<EntryId> {
        let mut results = Vec::new();
        for source in self.sources.iter() {
            results.extend(source.search(query).await?);
        }
        info!("Search '{}': {} results", query, results.len());

        let id = self.viewers.open(ViewerEntry::search(query));
        if let Some(entry) = self.viewers.get_mut(id) {
            entry.set_status("Results", results.len().to_string());
        }
        self.search_results.insert(id, results);
        Ok(id)
    }

    pub fn search_results(&self, id: EntryId) -> &[Series] {
        self.search_results
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // Navigation

    /// Open a series tab. A preview is first completed with full detail
    /// from its source and reconciled into the cache.
    pub async fn open_series(&mut self, series: Series) -> Result<EntryId> {
        let cached = self
            .store
            .find_series(&series.source, &series.info_page)
            .filter(|s| !s.preview)
            .map(|s| s.id);

        let id = match cached {
            Some(id) => id,
            None if series.preview => {
                let source = self.sources.require(&series.source)?.clone();
                let detail = source.fetch_detail(&series.info_page, false).await?;
                self.store.reconcile_series(detail)?.id
            }
            None => self.store.upsert_series(series, false)?.id,
        };

        let entry = ViewerEntry::series(self.series(id)?);
        Ok(self.viewers.open(entry))
    }

    /// Re-fetch a series tab's detail, bypassing document caches, and put
    /// the refreshed tab where the old one was.
    pub async fn refresh_series(&mut self, entry_id: EntryId) -> Result<EntryId> {
        let series_id = match self.viewers.get(entry_id).map(ViewerEntry::kind) {
            Some(ViewerKind::SeriesDetail { series_id }) => *series_id,
            _ => return Ok(entry_id),
        };

        let (source_id, info_page) = {
            let series = self.series(series_id)?;
            (series.source.clone(), series.info_page.clone())
        };
        let source = self.sources.require(&source_id)?.clone();
        let detail = source.fetch_detail(&info_page, true).await?;
        let series = self.store.reconcile_series(detail)?;

        let entry = ViewerEntry::series(series);
        Ok(self.viewers.replace(entry_id, entry).unwrap_or(entry_id))
    }

    /// Open a reader tab for a chapter, filling its panes first if needed.
    pub async fn open_chapter(&mut self, series_id: Uuid, chapter_id: Uuid) -> Result<EntryId> {
        let entry = self.prepare_chapter(series_id, chapter_id).await?;
        let id = self.viewers.open(entry);
        self.maybe_prefetch(series_id, chapter_id);
        Ok(id)
    }

    /// Move the focused reader to the neighbouring chapter, in place.
    pub async fn step_chapter(&mut self, step: ChapterStep) -> Result<Option<EntryId>> {
        let Some(progress) = self.focused_progress() else {
            return Ok(None);
        };
        let Some(target) = progress.adjacent(&self.store, step) else {
            return Ok(None);
        };

        let entry = self.prepare_chapter(progress.series_id, target).await?;
        let old = self.viewers.focused().id();
        let id = self.viewers.replace(old, entry);
        self.maybe_prefetch(progress.series_id, target);
        Ok(id)
    }

    /// Close the focused tab. The main page stays open.
    pub fn close_focused(&mut self) -> bool {
        let focused = self.viewers.focused();
        let id = focused.id();
        let Some(handle) = focused.close_handle() else {
            return false;
        };

        let closed = self.viewers.close(handle);
        if closed {
            self.search_results.remove(&id);
        }
        closed
    }

    // Reading

    pub fn page_right(&mut self) -> Result<PageMove> {
        self.move_page(|progress, store| progress.move_right(store))
    }

    pub fn page_left(&mut self) -> Result<PageMove> {
        self.move_page(|progress, store| progress.move_left(store))
    }

    fn move_page(
        &mut self,
        step: impl FnOnce(&ReadingProgress, &mut ContentStore) -> Result<PageMove>,
    ) -> Result<PageMove> {
        let Some(progress) = self.focused_progress() else {
            return Ok(PageMove::Unchanged);
        };

        let moved = step(&progress, &mut self.store)?;
        if moved != PageMove::Unchanged {
            let label = self.chapter(progress.series_id, progress.chapter_id)?.progress_label();
            self.viewers.focused_mut().set_status("Progress", label);
        }
        Ok(moved)
    }

    /// The reading position of the focused tab, if it is a reader.
    pub fn focused_progress(&self) -> Option<ReadingProgress> {
        match self.viewers.focused().kind() {
            ViewerKind::ChapterReader {
                series_id,
                chapter_id,
            } => Some(ReadingProgress::new(*series_id, *chapter_id)),
            _ => None,
        }
    }

    // Library

    /// Flip library membership; returns whether the series is now a member.
    pub fn toggle_library(&mut self, series_id: Uuid) -> Result<bool> {
        if self.store.is_in_library(series_id) {
            self.store.remove_from_library(series_id)?;
            Ok(false)
        } else {
            self.store.add_to_library(series_id)?;
            Ok(true)
        }
    }

    // Images

    /// The page the focused reader is on.
    pub async fn current_page_image(&self) -> Result<Option<Arc<DynamicImage>>> {
        let Some(progress) = self.focused_progress() else {
            return Ok(None);
        };
        let chapter = self.chapter(progress.series_id, progress.chapter_id)?;
        let Some(pane) = chapter.current_pane() else {
            return Ok(None);
        };

        let referer = referer_for(&chapter.info_page);
        let destination = page_path(
            &self.store.chapter_dir(progress.series_id, progress.chapter_id),
            chapter.last_page,
            &pane.url,
        );
        let image = self
            .images
            .fetch(&pane.url, referer.as_deref(), Some(&destination))
            .await?;
        Ok(Some(image))
    }

    pub async fn banner(&self, series_id: Uuid) -> Result<Arc<DynamicImage>> {
        let series = self.series(series_id)?;
        let destination = self.images.banner_path(series);
        self.images
            .fetch(&series.banner_url, None, Some(&destination))
            .await
    }

    /// One request per page, written under the chapter's directory.
    pub fn page_requests(&self, series_id: Uuid, chapter_id: Uuid) -> Result<Vec<ImageRequest>> {
        let chapter = self.chapter(series_id, chapter_id)?;
        let chapter_dir = self.store.chapter_dir(series_id, chapter_id);
        let referer = referer_for(&chapter.info_page);

        Ok(chapter
            .panes
            .iter()
            .enumerate()
            .map(|(page, pane)| ImageRequest {
                url: pane.url.clone(),
                referer: referer.clone(),
                destination: Some(page_path(&chapter_dir, page, &pane.url)),
            })
            .collect())
    }

    /// Download a chapter's pages in the background.
    pub fn spawn_prefetch(&self, series_id: Uuid, chapter_id: Uuid) -> Result<JoinHandle<usize>> {
        let requests = self.page_requests(series_id, chapter_id)?;
        let workers = self.config.images.prefetch_workers;
        let images = self.images.clone();

        Ok(tokio::spawn(async move {
            let total = requests.len();
            let done = images.prefetch(requests, workers).await;
            debug!("Prefetched {}/{} pages of {}", done, total, chapter_id);
            done
        }))
    }

    fn maybe_prefetch(&self, series_id: Uuid, chapter_id: Uuid) {
        if !self.config.images.prefetch {
            return;
        }
        if let Err(e) = self.spawn_prefetch(series_id, chapter_id) {
            debug!("Prefetch not started for {}: {}", chapter_id, e);
        }
    }

    // Helpers

    /// Fill panes when missing, count the chapter as started and build its tab.
    async fn prepare_chapter(&mut self, series_id: Uuid, chapter_id: Uuid) -> Result<ViewerEntry> {
        let chapter = self.chapter(series_id, chapter_id)?;
        if chapter.panes.is_empty() {
            let chapter = chapter.clone();
            let source_id = self.series(series_id)?.source.clone();
            let source = self.sources.require(&source_id)?.clone();
            let filled = source.fetch_chapter_panes(&chapter, false).await?;
            self.store.set_chapter_panes(filled)?;
        }

        ReadingProgress::new(series_id, chapter_id).enter(&mut self.store)?;

        let series = self.series(series_id)?;
        let chapter = self.chapter(series_id, chapter_id)?;
        Ok(ViewerEntry::chapter(series, chapter))
    }

    pub fn series(&self, id: Uuid) -> Result<&Series> {
        self.store.get_series(id).ok_or(ShelfError::SeriesNotFound(id))
    }

    pub fn chapter(&self, series_id: Uuid, chapter_id: Uuid) -> Result<&Chapter> {
        self.store
            .get_chapter(series_id, chapter_id)
            .ok_or(ShelfError::ChapterNotFound(chapter_id))
    }
}
