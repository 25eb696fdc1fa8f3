use std::collections::HashMap;
use std::sync::Arc;

use image::DynamicImage;
use uuid::Uuid;

use crate::app::AppContext;
use crate::domain::{Series, UserStatus};
use crate::viewer::{EntryId, ViewerEntry, ViewerKind};

/// What selecting a list row does.
#[derive(Debug, Clone)]
pub enum RowTarget {
    Heading,
    Series(Series),
    Chapter { series_id: Uuid, chapter_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Heading,
    Normal,
    Reading,
    Done,
}

#[derive(Debug, Clone)]
pub struct Row {
    pub label: String,
    pub target: RowTarget,
    pub style: RowStyle,
}

impl Row {
    fn heading(label: &str) -> Self {
        Self {
            label: label.to_string(),
            target: RowTarget::Heading,
            style: RowStyle::Heading,
        }
    }

    fn series(series: &Series) -> Self {
        Self {
            label: format!("  {}", series.display_title()),
            target: RowTarget::Series(series.clone()),
            style: RowStyle::Normal,
        }
    }
}

/// The selectable rows of a tab. Readers have none.
pub fn rows(ctx: &AppContext, entry: &ViewerEntry) -> Vec<Row> {
    match entry.kind() {
        ViewerKind::Picker => {
            let mut rows = Vec::new();
            let sections: [(&str, Vec<&Series>); 4] = [
                ("Library", ctx.store.library_series()),
                ("Recently read", ctx.store.recently_read()),
                ("Popular", ctx.listings.popular.iter().collect()),
                (
                    "Recently updated",
                    ctx.listings.recently_updated.iter().collect(),
                ),
            ];
            for (title, series) in sections {
                if series.is_empty() {
                    continue;
                }
                rows.push(Row::heading(title));
                rows.extend(series.into_iter().map(Row::series));
            }
            rows
        }
        ViewerKind::Search { .. } => ctx
            .search_results(entry.id())
            .iter()
            .map(Row::series)
            .collect(),
        ViewerKind::SeriesDetail { series_id } => ctx
            .store
            .get_series(*series_id)
            .map(|series| {
                series
                    .chapters
                    .iter()
                    .map(|chapter| {
                        let (marker, style) = match chapter.user_status {
                            UserStatus::None => (' ', RowStyle::Normal),
                            UserStatus::Reading => ('>', RowStyle::Reading),
                            UserStatus::Done => ('x', RowStyle::Done),
                        };
                        Row {
                            label: format!("{} {}", marker, chapter.name),
                            target: RowTarget::Chapter {
                                series_id: series.id,
                                chapter_id: chapter.id,
                            },
                            style,
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default(),
        ViewerKind::ChapterReader { .. } => Vec::new(),
    }
}

pub struct TuiApp {
    pub should_quit: bool,
    pub status_message: Option<String>,
    /// Query being typed after the search key; `None` outside input mode.
    pub search_input: Option<String>,
    /// Decoded image of the page the focused reader is on.
    pub page: Option<Arc<DynamicImage>>,
    cursors: HashMap<EntryId, usize>,
}

impl TuiApp {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            status_message: None,
            search_input: None,
            page: None,
            cursors: HashMap::new(),
        }
    }

    pub fn cursor(&self, entry: EntryId) -> usize {
        self.cursors.get(&entry).copied().unwrap_or(0)
    }

    pub fn move_up(&mut self, entry: EntryId) {
        let cursor = self.cursors.entry(entry).or_insert(0);
        *cursor = cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self, entry: EntryId, len: usize) {
        let cursor = self.cursors.entry(entry).or_insert(0);
        if *cursor + 1 < len {
            *cursor += 1;
        }
    }

    /// Keep the cursor inside a list that may have shrunk.
    pub fn clamp(&mut self, entry: EntryId, len: usize) {
        if let Some(cursor) = self.cursors.get_mut(&entry) {
            *cursor = (*cursor).min(len.saturating_sub(1));
        }
    }

    pub fn forget(&mut self, entry: EntryId) {
        self.cursors.remove(&entry);
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}
