use uuid::Uuid;

use crate::domain::{Chapter, Series};

pub type EntryId = u64;

/// What a tab shows. Content is referenced by id and read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerKind {
    Picker,
    Search { query: String },
    SeriesDetail { series_id: Uuid },
    ChapterReader { series_id: Uuid, chapter_id: Uuid },
}

impl ViewerKind {
    /// Whether two tabs would show the same series or chapter.
    pub fn same_target(&self, other: &ViewerKind) -> bool {
        match (self, other) {
            (ViewerKind::Picker, ViewerKind::Picker) => true,
            (
                ViewerKind::SeriesDetail { series_id: a },
                ViewerKind::SeriesDetail { series_id: b },
            ) => a == b,
            (
                ViewerKind::ChapterReader { chapter_id: a, .. },
                ViewerKind::ChapterReader { chapter_id: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

/// A transient key/value item shown in the status line, e.g. `Progress 3 / 20`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub name: String,
    pub text: String,
}

/// Capability to close one entry. The stack hands it out only for
/// closeable entries, so the Picker can never be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseHandle(pub(crate) EntryId);

#[derive(Debug, Clone)]
pub struct ViewerEntry {
    pub(crate) id: EntryId,
    kind: ViewerKind,
    title: String,
    closeable: bool,
    pub(crate) close: Option<CloseHandle>,
    statuses: Vec<Status>,
}

impl ViewerEntry {
    fn new(kind: ViewerKind, title: String, closeable: bool) -> Self {
        Self {
            id: 0,
            kind,
            title,
            closeable,
            close: None,
            statuses: Vec::new(),
        }
    }

    pub fn picker() -> Self {
        Self::new(ViewerKind::Picker, "Main page".into(), false)
    }

    pub fn search(query: &str) -> Self {
        Self::new(
            ViewerKind::Search {
                query: query.to_string(),
            },
            "Search results".into(),
            true,
        )
    }

    pub fn series(series: &Series) -> Self {
        Self::new(
            ViewerKind::SeriesDetail {
                series_id: series.id,
            },
            series.display_title().to_string(),
            true,
        )
    }

    pub fn chapter(series: &Series, chapter: &Chapter) -> Self {
        let mut entry = Self::new(
            ViewerKind::ChapterReader {
                series_id: series.id,
                chapter_id: chapter.id,
            },
            format!("{} - {}", series.display_title(), chapter.name),
            true,
        );
        entry.set_status("Progress", chapter.progress_label());
        entry
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> &ViewerKind {
        &self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn closeable(&self) -> bool {
        self.closeable
    }

    pub fn close_handle(&self) -> Option<CloseHandle> {
        self.close
    }

    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    /// Set a status item, replacing one with the same name.
    pub fn set_status(&mut self, name: &str, text: impl Into<String>) {
        let text = text.into();
        match self.statuses.iter_mut().find(|s| s.name == name) {
            Some(status) => status.text = text,
            None => self.statuses.push(Status {
                name: name.to_string(),
                text,
            }),
        }
    }
}
