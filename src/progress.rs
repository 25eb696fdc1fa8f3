//! Page and chapter navigation inside a reader tab.
//!
//! Every page move is persisted through
//! [`ContentStore::update_chapter_progress`], which rewrites only the
//! chapter's own record.

use uuid::Uuid;

use crate::app::{Result, ShelfError};
use crate::domain::{Chapter, UserStatus};
use crate::store::ContentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMove {
    /// Now on this page.
    Moved(usize),
    /// Was already on the last page; the chapter is now done.
    Finished,
    Unchanged,
}

/// Direction through a series' chapter list, which is stored newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStep {
    Next,
    Earlier,
}

/// Progress tracking for one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingProgress {
    pub series_id: Uuid,
    pub chapter_id: Uuid,
}

impl ReadingProgress {
    pub fn new(series_id: Uuid, chapter_id: Uuid) -> Self {
        Self {
            series_id,
            chapter_id,
        }
    }

    pub fn for_chapter(chapter: &Chapter) -> Self {
        Self::new(chapter.series_id, chapter.id)
    }

    /// First view of an unread chapter marks it as being read.
    pub fn enter(&self, store: &mut ContentStore) -> Result<()> {
        let chapter = self.chapter(store)?;
        if chapter.user_status == UserStatus::None {
            let last_page = chapter.last_page;
            store.update_chapter_progress(
                self.series_id,
                self.chapter_id,
                UserStatus::Reading,
                last_page,
            )?;
        }
        store.mark_recently_read(self.series_id)
    }

    /// Advance one page, or mark the chapter done when on the last page.
    pub fn move_right(&self, store: &mut ContentStore) -> Result<PageMove> {
        let chapter = self.chapter(store)?;
        if chapter.panes.is_empty() {
            return Ok(PageMove::Unchanged);
        }

        let (status, page) = (chapter.user_status, chapter.last_page);
        if page + 1 < chapter.panes.len() {
            store.update_chapter_progress(self.series_id, self.chapter_id, status, page + 1)?;
            Ok(PageMove::Moved(page + 1))
        } else if status != UserStatus::Done {
            store.update_chapter_progress(self.series_id, self.chapter_id, UserStatus::Done, page)?;
            Ok(PageMove::Finished)
        } else {
            Ok(PageMove::Unchanged)
        }
    }

    /// Go back one page, stopping at the first.
    pub fn move_left(&self, store: &mut ContentStore) -> Result<PageMove> {
        let chapter = self.chapter(store)?;
        if chapter.last_page == 0 {
            return Ok(PageMove::Unchanged);
        }

        let (status, page) = (chapter.user_status, chapter.last_page - 1);
        store.update_chapter_progress(self.series_id, self.chapter_id, status, page)?;
        Ok(PageMove::Moved(page))
    }

    /// The neighbouring chapter id, if there is one.
    pub fn adjacent(&self, store: &ContentStore, step: ChapterStep) -> Option<Uuid> {
        let series = store.get_series(self.series_id)?;
        let index = series.chapter_index(self.chapter_id)?;
        let target = match step {
            ChapterStep::Next => index.checked_sub(1)?,
            ChapterStep::Earlier => index + 1,
        };
        series.chapters.get(target).map(|c| c.id)
    }

    fn chapter<'a>(&self, store: &'a ContentStore) -> Result<&'a Chapter> {
        store
            .get_chapter(self.series_id, self.chapter_id)
            .ok_or(ShelfError::ChapterNotFound(self.chapter_id))
    }
}
