//! The capability contract a scraping backend must satisfy.
//!
//! Site-specific implementations live outside this crate; the store and the
//! front-end only ever talk to [`SourceProvider`] trait objects looked up in
//! a [`SourceRegistry`] by the source id recorded on each series.

mod document;
#[cfg(test)]
pub mod fake;

pub use document::DocumentCache;

use std::sync::Arc;

use async_trait::async_trait;

use crate::app::{Result, ShelfError};
use crate::domain::{Chapter, Series};

#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Stable identifier stored on every series this provider produces,
    /// conventionally the site's base URL.
    fn id(&self) -> &str;

    /// Popular titles as previews with empty chapter lists.
    async fn list_popular(&self) -> Result<Vec<Series>>;

    /// Recently updated titles as previews.
    async fn list_recently_updated(&self) -> Result<Vec<Series>>;

    async fn search(&self, query: &str) -> Result<Vec<Series>>;

    /// Full detail for a series: metadata plus the chapter list, newest
    /// first, with empty pane lists.
    async fn fetch_detail(&self, info_page: &str, force_refresh: bool) -> Result<Series>;

    /// The chapter with its panes populated front to back.
    async fn fetch_chapter_panes(&self, chapter: &Chapter, force_refresh: bool)
        -> Result<Chapter>;
}

#[derive(Default, Clone)]
pub struct SourceRegistry {
    providers: Vec<Arc<dyn SourceProvider>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous one with the same id.
    pub fn register(&mut self, provider: Arc<dyn SourceProvider>) {
        self.providers.retain(|p| p.id() != provider.id());
        self.providers.push(provider);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn SourceProvider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    pub fn require(&self, id: &str) -> Result<&Arc<dyn SourceProvider>> {
        self.get(id)
            .ok_or_else(|| ShelfError::SourceNotFound(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SourceProvider>> {
        self.providers.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
