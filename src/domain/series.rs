use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::{parse_chapter_number, Chapter};

/// A logical comic title.
///
/// The `id` is a local handle. Two records describe the same series when
/// their `(source, info_page)` pair matches, see [`Series::same_entity`].
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub id: Uuid,
    pub name: String,
    pub banner_url: String,
    pub info_page: String,
    /// Identifier of the provider that produced this record.
    pub source: String,
    /// Chapters in provider order, newest first.
    pub chapters: Vec<Chapter>,
    pub alternative_names: Vec<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub status: Option<String>,
    /// Only list-level data is known.
    pub preview: bool,
}

impl Series {
    pub fn new(source: &str, name: &str, banner_url: &str, info_page: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            banner_url: banner_url.to_string(),
            info_page: info_page.to_string(),
            source: source.to_string(),
            chapters: Vec::new(),
            alternative_names: Vec::new(),
            author: None,
            description: None,
            genres: Vec::new(),
            status: None,
            preview: false,
        }
    }

    /// A listing entry from a popular/recent/search page.
    pub fn preview(source: &str, name: &str, banner_url: &str, info_page: &str) -> Self {
        Self {
            preview: true,
            ..Self::new(source, name, banner_url, info_page)
        }
    }

    pub fn same_entity(&self, other: &Series) -> bool {
        self.source == other.source && self.info_page == other.info_page
    }

    /// Change the local handle, keeping chapter back-references in sync.
    pub fn set_id(&mut self, id: Uuid) {
        self.id = id;
        for chapter in &mut self.chapters {
            chapter.series_id = id;
        }
    }

    /// Append a chapter with a fresh id; the number is parsed from the name.
    pub fn add_chapter(&mut self, name: &str, info_page: &str) -> &mut Chapter {
        let chapter = Chapter::new(self.id, name, parse_chapter_number(name), info_page);
        self.chapters.push(chapter);
        let last = self.chapters.len() - 1;
        &mut self.chapters[last]
    }

    /// Keep only the first chapter per `info_page`, in provider order.
    /// Returns how many duplicates were dropped.
    pub fn dedup_chapters(&mut self) -> usize {
        let before = self.chapters.len();
        let mut seen = HashSet::new();
        self.chapters.retain(|c| seen.insert(c.info_page.clone()));
        before - self.chapters.len()
    }

    pub fn chapter(&self, id: Uuid) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn chapter_mut(&mut self, id: Uuid) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|c| c.id == id)
    }

    pub fn chapter_index(&self, id: Uuid) -> Option<usize> {
        self.chapters.iter().position(|c| c.id == id)
    }

    pub fn display_title(&self) -> &str {
        if self.name.is_empty() {
            &self.info_page
        } else {
            &self.name
        }
    }
}
