//! In-memory provider for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::{Result, ShelfError};
use crate::domain::{Chapter, Series};
use crate::source::SourceProvider;

#[derive(Clone)]
struct Listing {
    name: String,
    chapters: Vec<(String, String)>,
}

pub struct FakeSource {
    id: String,
    listings: Mutex<Vec<(String, Listing)>>,
    panes: Mutex<HashMap<String, Vec<String>>>,
    pub detail_calls: AtomicUsize,
    pub pane_calls: AtomicUsize,
    pub offline: AtomicBool,
}

impl FakeSource {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            listings: Mutex::new(Vec::new()),
            panes: Mutex::new(HashMap::new()),
            detail_calls: AtomicUsize::new(0),
            pane_calls: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Publish (or replace) a series; chapters are `(name, info_page)`,
    /// newest first.
    pub fn with_series(self, info_page: &str, name: &str, chapters: &[(&str, &str)]) -> Self {
        self.set_series(info_page, name, chapters);
        self
    }

    pub fn with_panes(self, chapter_page: &str, urls: &[&str]) -> Self {
        self.panes.lock().unwrap().insert(
            chapter_page.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }

    pub fn set_series(&self, info_page: &str, name: &str, chapters: &[(&str, &str)]) {
        let listing = Listing {
            name: name.to_string(),
            chapters: chapters
                .iter()
                .map(|(n, u)| (n.to_string(), u.to_string()))
                .collect(),
        };
        let mut listings = self.listings.lock().unwrap();
        listings.retain(|(page, _)| page != info_page);
        listings.push((info_page.to_string(), listing));
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ShelfError::Other("source unreachable".into()));
        }
        Ok(())
    }

    fn previews(&self, filter: impl Fn(&str) -> bool) -> Vec<Series> {
        self.listings
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, l)| filter(&l.name))
            .map(|(page, l)| Series::preview(&self.id, &l.name, "", page))
            .collect()
    }
}

#[async_trait]
impl SourceProvider for FakeSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list_popular(&self) -> Result<Vec<Series>> {
        self.check_online()?;
        Ok(self.previews(|_| true))
    }

    async fn list_recently_updated(&self) -> Result<Vec<Series>> {
        self.check_online()?;
        let mut previews = self.previews(|_| true);
        previews.reverse();
        Ok(previews)
    }

    async fn search(&self, query: &str) -> Result<Vec<Series>> {
        self.check_online()?;
        Ok(self.previews(|name| name.contains(query)))
    }

    async fn fetch_detail(&self, info_page: &str, _force_refresh: bool) -> Result<Series> {
        self.check_online()?;
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        let listing = self
            .listings
            .lock()
            .unwrap()
            .iter()
            .find(|(page, _)| page == info_page)
            .map(|(_, l)| l.clone())
            .ok_or_else(|| ShelfError::Other(format!("no such series: {}", info_page)))?;

        let mut series = Series::new(&self.id, &listing.name, "", info_page);
        for (name, page) in &listing.chapters {
            series.add_chapter(name, page);
        }
        Ok(series)
    }

    async fn fetch_chapter_panes(
        &self,
        chapter: &Chapter,
        _force_refresh: bool,
    ) -> Result<Chapter> {
        self.check_online()?;
        self.pane_calls.fetch_add(1, Ordering::SeqCst);

        let urls = self
            .panes
            .lock()
            .unwrap()
            .get(&chapter.info_page)
            .cloned()
            .unwrap_or_default();

        let mut filled = chapter.clone();
        filled.panes.clear();
        for url in urls {
            filled.add_pane(&url);
        }
        Ok(filled)
    }
}
