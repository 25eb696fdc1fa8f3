use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::{Result, ShelfError};
use crate::domain::{Chapter, Series, UserStatus};
use crate::source::SourceRegistry;
use crate::store::codec::{
    chapter_from_record, chapter_to_record, series_from_record, series_to_record,
    CHAPTER_COMMENT, SERIES_COMMENT,
};
use crate::store::library::LibraryFile;
use crate::store::record::Record;

pub const INFO_FILE: &str = "info.props";

/// Outcome of [`ContentStore::load_all`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Series or chapter directories removed as corrupt.
    pub removed: Vec<PathBuf>,
    /// Chapters whose panes were fetched during the load.
    pub materialized: usize,
}

/// On-disk cache of series and chapters plus library state.
///
/// Layout: `<root>/<series>/info.props` and
/// `<root>/<series>/<chapter>/info.props`, with `library.props` at the
/// root. The in-memory map is owned by a single task; callers get shared
/// references only.
pub struct ContentStore {
    root: PathBuf,
    series: HashMap<Uuid, Series>,
    library: LibraryFile,
}

impl ContentStore {
    /// Create the root directory if needed and read the library file.
    /// Series are not loaded until [`ContentStore::load_all`].
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let library = LibraryFile::open(&root)?;

        Ok(Self {
            root,
            series: HashMap::new(),
            library,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn series_dir(&self, id: Uuid) -> PathBuf {
        self.root.join(id.to_string())
    }

    pub fn chapter_dir(&self, series_id: Uuid, chapter_id: Uuid) -> PathBuf {
        self.series_dir(series_id).join(chapter_id.to_string())
    }

    // Lookups

    pub fn get_series(&self, id: Uuid) -> Option<&Series> {
        self.series.get(&id)
    }

    pub fn get_chapter(&self, series_id: Uuid, chapter_id: Uuid) -> Option<&Chapter> {
        self.get_series(series_id)?.chapter(chapter_id)
    }

    /// Find the cached series for the reconciliation key `(source, info_page)`.
    pub fn find_series(&self, source: &str, info_page: &str) -> Option<&Series> {
        self.series
            .values()
            .find(|s| s.source == source && s.info_page == info_page)
    }

    /// All cached series ordered by name.
    pub fn all_series(&self) -> Vec<&Series> {
        let mut all: Vec<&Series> = self.series.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        all
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    // Discovery and reconciliation

    /// Store a series unless one with the same `(source, info_page)` is
    /// already cached, in which case the cached one is returned unchanged.
    ///
    /// With `force` the cached record is overwritten in place, keeping its id.
    pub fn upsert_series(&mut self, mut series: Series, force: bool) -> Result<&Series> {
        let duplicates = series.dedup_chapters();
        if duplicates > 0 {
            debug!("Dropped {} duplicate chapters of {}", duplicates, series.info_page);
        }
        let existing = self
            .find_series(&series.source, &series.info_page)
            .map(|s| s.id);

        let id = match existing {
            Some(id) if !force => {
                debug!("Series already cached: {}", series.info_page);
                return self.series.get(&id).ok_or(ShelfError::SeriesNotFound(id));
            }
            Some(id) => {
                series.set_id(id);
                id
            }
            None => series.id,
        };

        fs::create_dir_all(self.series_dir(id))?;
        for chapter in &series.chapters {
            self.upsert_chapter(chapter)?;
        }
        self.write_series_record(&series)?;
        self.prune_chapter_dirs(&series)?;

        info!("Cached series {} ({})", series.display_title(), id);
        self.series.insert(id, series);
        self.series.get(&id).ok_or(ShelfError::SeriesNotFound(id))
    }

    /// Merge freshly fetched detail into the cached entry.
    ///
    /// The cached id wins. Chapters are matched by `info_page`: matches keep
    /// their id, status and last page; everything else comes from `fresh`.
    /// Unmatched chapters are stored as new.
    pub fn reconcile_series(&mut self, mut fresh: Series) -> Result<&Series> {
        let existing = self
            .find_series(&fresh.source, &fresh.info_page)
            .map(|s| s.id);
        let Some(id) = existing else {
            return self.upsert_series(fresh, false);
        };

        let known: HashMap<String, (Uuid, UserStatus, usize)> = self
            .series
            .get(&id)
            .map(|s| {
                s.chapters
                    .iter()
                    .map(|c| (c.info_page.clone(), (c.id, c.user_status, c.last_page)))
                    .collect()
            })
            .unwrap_or_default();

        fresh.set_id(id);
        fresh.dedup_chapters();
        let mut matched = 0;
        for chapter in &mut fresh.chapters {
            if let Some(&(chapter_id, status, last_page)) = known.get(&chapter.info_page) {
                chapter.set_id(chapter_id);
                chapter.user_status = status;
                chapter.last_page = match chapter.panes.len() {
                    0 => last_page,
                    n => last_page.min(n - 1),
                };
                matched += 1;
            }
        }

        fs::create_dir_all(self.series_dir(id))?;
        for chapter in &fresh.chapters {
            self.upsert_chapter(chapter)?;
        }
        self.write_series_record(&fresh)?;
        let pruned = self.prune_chapter_dirs(&fresh)?;

        info!(
            "Reconciled {}: {} chapters, {} new, {} gone",
            fresh.display_title(),
            fresh.chapters.len(),
            fresh.chapters.len() - matched,
            pruned
        );
        // Swap the whole entry so readers never see a half-merged list.
        self.series.insert(id, fresh);
        self.series.get(&id).ok_or(ShelfError::SeriesNotFound(id))
    }

    /// Persist one chapter record under its series directory.
    pub fn upsert_chapter(&self, chapter: &Chapter) -> Result<()> {
        let dir = self.chapter_dir(chapter.series_id, chapter.id);
        fs::create_dir_all(&dir)?;
        chapter_to_record(chapter).write(&dir.join(INFO_FILE), CHAPTER_COMMENT)
    }

    // Reading state

    /// Set status and page for a chapter, rewriting only its own record.
    pub fn update_chapter_progress(
        &mut self,
        series_id: Uuid,
        chapter_id: Uuid,
        status: UserStatus,
        last_page: usize,
    ) -> Result<()> {
        let chapter = self.chapter_mut(series_id, chapter_id)?;
        chapter.user_status = status;
        chapter.last_page = last_page;

        let chapter = self.chapter_ref(series_id, chapter_id)?;
        self.upsert_chapter(chapter)
    }

    /// Replace a chapter's pane list with the one a provider returned.
    pub fn set_chapter_panes(&mut self, filled: Chapter) -> Result<()> {
        let chapter = self.chapter_mut(filled.series_id, filled.id)?;
        chapter.set_panes(filled.panes);

        let chapter = self.chapter_ref(filled.series_id, filled.id)?;
        self.upsert_chapter(chapter)
    }

    // Library

    pub fn add_to_library(&mut self, series_id: Uuid) -> Result<bool> {
        let added = self.library.add(series_id)?;
        if added {
            info!("Added {} to library", series_id);
        }
        Ok(added)
    }

    pub fn remove_from_library(&mut self, series_id: Uuid) -> Result<bool> {
        let removed = self.library.remove(series_id)?;
        if removed {
            info!("Removed {} from library", series_id);
        }
        Ok(removed)
    }

    pub fn is_in_library(&self, series_id: Uuid) -> bool {
        self.library.contains(series_id)
    }

    pub fn library_ids(&self) -> &[Uuid] {
        self.library.ids()
    }

    /// Library members that are present in the cache.
    pub fn library_series(&self) -> Vec<&Series> {
        self.library
            .ids()
            .iter()
            .filter_map(|id| self.series.get(id))
            .collect()
    }

    pub fn mark_recently_read(&mut self, series_id: Uuid) -> Result<()> {
        self.library.touch_last_read(series_id)
    }

    pub fn recently_read(&self) -> Vec<&Series> {
        self.library
            .last_read()
            .iter()
            .filter_map(|id| self.series.get(id))
            .collect()
    }

    // Startup

    /// Load every series directory under the root.
    ///
    /// Directories without a readable, well-formed `info.props` are deleted
    /// and skipped. Chapters stored without panes are filled from their
    /// source right away unless the series is only a preview.
    pub async fn load_all(&mut self, sources: &SourceRegistry) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }

            match self.load_series_dir(&path, sources, &mut report).await {
                Ok(series) => {
                    self.series.insert(series.id, series);
                    report.loaded += 1;
                }
                Err(ShelfError::CacheCorruption { path: bad, reason }) => {
                    warn!("Removing corrupt cache entry {}: {}", bad.display(), reason);
                    remove_dir(&path, &mut report);
                }
                Err(e) => {
                    warn!("Skipping unreadable cache entry {}: {}", path.display(), e);
                }
            }
        }

        info!(
            "Loaded {} series ({} removed, {} chapters materialized)",
            report.loaded,
            report.removed.len(),
            report.materialized
        );
        Ok(report)
    }

    async fn load_series_dir(
        &self,
        dir: &Path,
        sources: &SourceRegistry,
        report: &mut LoadReport,
    ) -> Result<Series> {
        let info = dir.join(INFO_FILE);
        if !info.is_file() {
            return Err(ShelfError::corrupt(dir, "missing info.props"));
        }

        let record = Record::read(&info)?;
        let (mut series, chapter_ids) = series_from_record(&record, &info)?;

        let mut dropped = false;
        for chapter_id in chapter_ids {
            let chapter_dir = dir.join(chapter_id.to_string());
            match self.load_chapter_dir(&chapter_dir, &series, sources, report).await {
                Ok(chapter) => series.chapters.push(chapter),
                // A failed chapter is dropped; the series stays loaded.
                Err(e) => {
                    warn!("Removing corrupt chapter {}: {}", chapter_dir.display(), e);
                    remove_dir(&chapter_dir, report);
                    dropped = true;
                }
            }
        }

        if dropped {
            self.write_series_record(&series)?;
        }
        Ok(series)
    }

    async fn load_chapter_dir(
        &self,
        dir: &Path,
        series: &Series,
        sources: &SourceRegistry,
        report: &mut LoadReport,
    ) -> Result<Chapter> {
        let info = dir.join(INFO_FILE);
        if !info.is_file() {
            return Err(ShelfError::corrupt(dir, "missing info.props"));
        }

        let record = Record::read(&info)?;
        let mut chapter = chapter_from_record(&record, series.id, &info)?;

        if chapter.panes.is_empty() && !series.preview {
            match sources.get(&series.source) {
                Some(source) => match source.fetch_chapter_panes(&chapter, false).await {
                    Ok(filled) => {
                        chapter.set_panes(filled.panes);
                        self.upsert_chapter(&chapter)?;
                        report.materialized += 1;
                    }
                    Err(e) => warn!("Could not fetch panes for {}: {}", chapter.name, e),
                },
                None => debug!(
                    "No source {} registered, leaving {} without panes",
                    series.source, chapter.name
                ),
            }
        }

        Ok(chapter)
    }

    // Helpers

    fn write_series_record(&self, series: &Series) -> Result<()> {
        let path = self.series_dir(series.id).join(INFO_FILE);
        series_to_record(series).write(&path, SERIES_COMMENT)
    }

    /// Delete chapter directories under the series that its chapter list
    /// no longer names.
    fn prune_chapter_dirs(&self, series: &Series) -> Result<usize> {
        let keep: HashSet<Uuid> = series.chapters.iter().map(|c| c.id).collect();
        let mut pruned = 0;

        for entry in fs::read_dir(self.series_dir(series.id))? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let stale = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| Uuid::parse_str(name).ok())
                .is_some_and(|id| !keep.contains(&id));
            if stale {
                debug!("Removing dropped chapter {}", path.display());
                fs::remove_dir_all(&path)?;
                pruned += 1;
            }
        }
        Ok(pruned)
    }

    fn chapter_mut(&mut self, series_id: Uuid, chapter_id: Uuid) -> Result<&mut Chapter> {
        self.series
            .get_mut(&series_id)
            .ok_or(ShelfError::SeriesNotFound(series_id))?
            .chapter_mut(chapter_id)
            .ok_or(ShelfError::ChapterNotFound(chapter_id))
    }

    fn chapter_ref(&self, series_id: Uuid, chapter_id: Uuid) -> Result<&Chapter> {
        self.get_series(series_id)
            .ok_or(ShelfError::SeriesNotFound(series_id))?
            .chapter(chapter_id)
            .ok_or(ShelfError::ChapterNotFound(chapter_id))
    }
}

fn remove_dir(path: &Path, report: &mut LoadReport) {
    match fs::remove_dir_all(path) {
        Ok(()) => report.removed.push(path.to_path_buf()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::*;
    use crate::source::fake::FakeSource;

    const SOURCE: &str = "https://src.example";

    fn series_with_chapters(name: &str, info_page: &str, chapters: &[&str]) -> Series {
        let mut series = Series::new(SOURCE, name, "", info_page);
        for page in chapters {
            let chapter = series.add_chapter(&format!("Chapter {}", page), page);
            chapter.add_pane(&format!("{}/1.jpg", page));
            chapter.add_pane(&format!("{}/2.jpg", page));
        }
        series
    }

    fn series_dirs(root: &Path) -> usize {
        fs::read_dir(root)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().is_dir())
            .count()
    }

    #[test]
    fn test_upsert_same_key_keeps_first_writer() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let a = Series::preview(SOURCE, "First", "", "https://src.example/a");
        let b = Series::preview(SOURCE, "Second", "", "https://src.example/a");
        let a_id = a.id;

        store.upsert_series(a, false).unwrap();
        let stored = store.upsert_series(b, false).unwrap();

        assert_eq!(stored.id, a_id);
        assert_eq!(stored.name, "First");
        assert_eq!(store.len(), 1);
        assert_eq!(series_dirs(dir.path()), 1);
    }

    #[test]
    fn test_upsert_writes_series_and_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let series = series_with_chapters("A", "https://src.example/a", &["c2", "c1"]);
        let ids: Vec<Uuid> = series.chapters.iter().map(|c| c.id).collect();
        let series_id = series.id;
        store.upsert_series(series, false).unwrap();

        assert!(store.series_dir(series_id).join(INFO_FILE).is_file());
        for id in ids {
            assert!(store.chapter_dir(series_id, id).join(INFO_FILE).is_file());
        }
    }

    #[test]
    fn test_upsert_force_overwrites_but_keeps_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let first = Series::preview(SOURCE, "Old", "", "https://src.example/a");
        let first_id = first.id;
        store.upsert_series(first, false).unwrap();

        let second = Series::new(SOURCE, "New", "", "https://src.example/a");
        let stored = store.upsert_series(second, true).unwrap();
        assert_eq!(stored.id, first_id);
        assert_eq!(stored.name, "New");
        assert!(!stored.preview);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reconcile_preserves_progress_of_matched_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let cached = series_with_chapters("A", "https://src.example/a", &["c2", "c1"]);
        let series_id = cached.id;
        let c1_id = cached.chapters[1].id;
        store.upsert_series(cached, false).unwrap();
        store
            .update_chapter_progress(series_id, c1_id, UserStatus::Reading, 1)
            .unwrap();
        store.add_to_library(series_id).unwrap();

        let mut fresh = Series::new(SOURCE, "A (renamed)", "", "https://src.example/a");
        fresh.add_chapter("Chapter 3", "c3");
        fresh.add_chapter("Chapter two", "c2");
        fresh.add_chapter("Chapter one, remastered", "c1");
        let c3_fresh_id = fresh.chapters[0].id;

        let merged = store.reconcile_series(fresh).unwrap();
        assert_eq!(merged.id, series_id);
        assert_eq!(merged.name, "A (renamed)");
        assert_eq!(merged.chapters.len(), 3);

        let c1 = &merged.chapters[2];
        assert_eq!(c1.id, c1_id);
        assert_eq!(c1.name, "Chapter one, remastered");
        assert_eq!(c1.user_status, UserStatus::Reading);
        assert_eq!(c1.last_page, 1);
        assert!(merged.chapters.iter().all(|c| c.series_id == series_id));

        let c3 = &merged.chapters[0];
        assert_eq!(c3.id, c3_fresh_id);
        assert_eq!(c3.user_status, UserStatus::None);
        let c3_id = c3.id;
        assert!(store.chapter_dir(series_id, c3_id).join(INFO_FILE).is_file());

        assert!(store.is_in_library(series_id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_keeps_first_chapter_per_info_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let series = series_with_chapters("A", "https://src.example/a", &["c1", "c1"]);
        let (series_id, first) = (series.id, series.chapters[0].id);
        let stored = store.upsert_series(series, false).unwrap();

        assert_eq!(stored.chapters.len(), 1);
        assert_eq!(stored.chapters[0].id, first);
        assert_eq!(series_dirs(&store.series_dir(series_id)), 1);
    }

    #[test]
    fn test_reconcile_duplicate_chapters_share_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let cached = series_with_chapters("A", "https://src.example/a", &["c1"]);
        let (series_id, c1_id) = (cached.id, cached.chapters[0].id);
        store.upsert_series(cached, false).unwrap();

        let mut fresh = Series::new(SOURCE, "A", "", "https://src.example/a");
        fresh.add_chapter("Chapter 1", "c1");
        fresh.add_chapter("Chapter 1 (mirror)", "c1");
        let merged = store.reconcile_series(fresh).unwrap();

        assert_eq!(merged.chapters.len(), 1);
        assert_eq!(merged.chapters[0].id, c1_id);
        assert_eq!(merged.chapters[0].name, "Chapter 1");

        let record = Record::read(&store.series_dir(series_id).join(INFO_FILE)).unwrap();
        assert_eq!(record.get("chapterList"), Some(c1_id.to_string().as_str()));
    }

    #[test]
    fn test_reconcile_removes_chapters_gone_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let cached = series_with_chapters("A", "https://src.example/a", &["c2", "c1"]);
        let (series_id, c2_id, c1_id) = (cached.id, cached.chapters[0].id, cached.chapters[1].id);
        store.upsert_series(cached, false).unwrap();
        fs::write(store.chapter_dir(series_id, c1_id).join("0.jpg"), b"page").unwrap();

        let mut fresh = Series::new(SOURCE, "A", "", "https://src.example/a");
        fresh.add_chapter("Chapter 2", "c2");
        store.reconcile_series(fresh).unwrap();

        assert!(store.chapter_dir(series_id, c2_id).join(INFO_FILE).is_file());
        assert!(!store.chapter_dir(series_id, c1_id).exists());
        assert_eq!(series_dirs(&store.series_dir(series_id)), 1);
    }

    #[test]
    fn test_set_chapter_panes_clamps_saved_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let series = series_with_chapters("A", "https://src.example/a", &["c1"]);
        let (series_id, c1_id) = (series.id, series.chapters[0].id);
        store.upsert_series(series, false).unwrap();
        store
            .update_chapter_progress(series_id, c1_id, UserStatus::Reading, 1)
            .unwrap();

        let mut filled = store.get_series(series_id).unwrap().chapters[0].clone();
        filled.panes.truncate(1);
        store.set_chapter_panes(filled).unwrap();

        let chapter = store.get_series(series_id).unwrap().chapter(c1_id).unwrap();
        assert_eq!(chapter.last_page, 0);
        assert_eq!(chapter.progress_label(), "1 / 1");

        let record = Record::read(&store.chapter_dir(series_id, c1_id).join(INFO_FILE)).unwrap();
        assert_eq!(record.get("lastPage"), Some("0"));
    }

    #[test]
    fn test_reconcile_unknown_series_is_stored_as_new() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let fresh = series_with_chapters("A", "https://src.example/a", &["c1"]);
        let id = fresh.id;
        store.reconcile_series(fresh).unwrap();
        assert!(store.get_series(id).is_some());
    }

    #[test]
    fn test_progress_update_leaves_series_record_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();

        let series = series_with_chapters("A", "https://src.example/a", &["c1"]);
        let (series_id, chapter_id) = (series.id, series.chapters[0].id);
        store.upsert_series(series, false).unwrap();

        let series_info = store.series_dir(series_id).join(INFO_FILE);
        let mut text = fs::read_to_string(&series_info).unwrap();
        text.push_str("marker=untouched\n");
        fs::write(&series_info, &text).unwrap();

        store
            .update_chapter_progress(series_id, chapter_id, UserStatus::Done, 1)
            .unwrap();

        assert!(fs::read_to_string(&series_info).unwrap().contains("marker=untouched"));
        let record = Record::read(&store.chapter_dir(series_id, chapter_id).join(INFO_FILE)).unwrap();
        assert_eq!(record.get("userStatus"), Some("2"));
        assert_eq!(record.get("lastPage"), Some("1"));
        assert_eq!(
            store.get_chapter(series_id, chapter_id).unwrap().user_status,
            UserStatus::Done
        );
    }

    #[test]
    fn test_progress_update_unknown_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ContentStore::open(dir.path()).unwrap();
        let err = store
            .update_chapter_progress(Uuid::new_v4(), Uuid::new_v4(), UserStatus::Done, 0)
            .unwrap_err();
        assert!(matches!(err, ShelfError::SeriesNotFound(_)));
    }

    #[tokio::test]
    async fn test_load_all_restores_identical_series() {
        let dir = tempfile::tempdir().unwrap();
        let mut series = series_with_chapters("A", "https://src.example/a", &["c3", "c2", "c1"]);
        series.author = Some("Author".into());
        series.description = Some("Line one\nline two".into());
        series.genres = vec!["Action".into(), "Drama".into()];
        series.status = Some("Ongoing".into());
        series.chapters[1].user_status = UserStatus::Reading;
        series.chapters[1].last_page = 1;

        {
            let mut store = ContentStore::open(dir.path()).unwrap();
            store.upsert_series(series.clone(), false).unwrap();
        }

        let mut store = ContentStore::open(dir.path()).unwrap();
        let report = store.load_all(&SourceRegistry::new()).await.unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(store.get_series(series.id), Some(&series));
    }

    #[tokio::test]
    async fn test_load_all_removes_directory_without_info() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join(Uuid::new_v4().to_string());
        fs::create_dir_all(broken.join("leftover")).unwrap();

        let mut store = ContentStore::open(dir.path()).unwrap();
        let report = store.load_all(&SourceRegistry::new()).await.unwrap();

        assert!(store.is_empty());
        assert!(!broken.exists());
        assert_eq!(report.removed, vec![broken]);
        assert!(dir.path().join("library.props").is_file());
    }

    #[tokio::test]
    async fn test_load_all_isolates_malformed_series() {
        let dir = tempfile::tempdir().unwrap();
        let good = series_with_chapters("Good", "https://src.example/good", &["c1"]);
        let good_id = good.id;
        {
            let mut store = ContentStore::open(dir.path()).unwrap();
            store.upsert_series(good, false).unwrap();
        }
        let bad = dir.path().join("bad");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join(INFO_FILE), "uuid=zzz\nname=Bad\n").unwrap();

        let mut store = ContentStore::open(dir.path()).unwrap();
        store.load_all(&SourceRegistry::new()).await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get_series(good_id).is_some());
        assert!(!bad.exists());
    }

    #[tokio::test]
    async fn test_load_all_removes_series_with_undecodable_record() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join(Uuid::new_v4().to_string());
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join(INFO_FILE), b"uuid=\xff\xfe\n").unwrap();

        let mut store = ContentStore::open(dir.path()).unwrap();
        let report = store.load_all(&SourceRegistry::new()).await.unwrap();

        assert_eq!(report.loaded, 0);
        assert_eq!(report.removed, vec![bad.clone()]);
        assert!(!bad.exists());
    }

    #[tokio::test]
    async fn test_load_all_undecodable_chapter_keeps_series_identity() {
        let dir = tempfile::tempdir().unwrap();
        let series = series_with_chapters("A", "https://src.example/a", &["c2", "c1"]);
        let (series_id, c2, c1) = (series.id, series.chapters[0].id, series.chapters[1].id);
        {
            let mut store = ContentStore::open(dir.path()).unwrap();
            store.upsert_series(series, false).unwrap();
            let info = store.chapter_dir(series_id, c2).join(INFO_FILE);
            fs::write(info, b"name=Chapter \xff\n").unwrap();
        }

        let mut store = ContentStore::open(dir.path()).unwrap();
        store.load_all(&SourceRegistry::new()).await.unwrap();

        let loaded = store.get_series(series_id).unwrap();
        assert_eq!(loaded.chapters.len(), 1);
        assert_eq!(loaded.chapters[0].id, c1);
        assert!(!store.chapter_dir(series_id, c2).exists());

        let again = Series::preview(SOURCE, "A", "", "https://src.example/a");
        let stored = store.upsert_series(again, false).unwrap();
        assert_eq!(stored.id, series_id);
        assert_eq!(series_dirs(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_load_all_drops_corrupt_chapter_only() {
        let dir = tempfile::tempdir().unwrap();
        let series = series_with_chapters("A", "https://src.example/a", &["c2", "c1"]);
        let (series_id, c2, c1) = (series.id, series.chapters[0].id, series.chapters[1].id);
        {
            let mut store = ContentStore::open(dir.path()).unwrap();
            store.upsert_series(series, false).unwrap();
            fs::remove_file(store.chapter_dir(series_id, c2).join(INFO_FILE)).unwrap();
        }

        let mut store = ContentStore::open(dir.path()).unwrap();
        store.load_all(&SourceRegistry::new()).await.unwrap();

        let loaded = store.get_series(series_id).unwrap();
        assert_eq!(loaded.chapters.len(), 1);
        assert_eq!(loaded.chapters[0].id, c1);
        assert!(!store.chapter_dir(series_id, c2).exists());

        let record = Record::read(&store.series_dir(series_id).join(INFO_FILE)).unwrap();
        assert_eq!(record.get("chapterList"), Some(c1.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_load_all_materializes_missing_panes() {
        let dir = tempfile::tempdir().unwrap();
        let mut series = Series::new(SOURCE, "A", "", "https://src.example/a");
        series.add_chapter("Chapter 1", "https://src.example/a/1");
        let (series_id, chapter_id) = (series.id, series.chapters[0].id);
        {
            let mut store = ContentStore::open(dir.path()).unwrap();
            store.upsert_series(series, false).unwrap();
        }

        let source = Arc::new(
            FakeSource::new(SOURCE).with_panes("https://src.example/a/1", &["p1.jpg", "p2.jpg"]),
        );
        let mut sources = SourceRegistry::new();
        sources.register(source.clone());

        let mut store = ContentStore::open(dir.path()).unwrap();
        let report = store.load_all(&sources).await.unwrap();
        assert_eq!(report.materialized, 1);
        assert_eq!(source.pane_calls.load(Ordering::SeqCst), 1);

        let chapter = store.get_chapter(series_id, chapter_id).unwrap();
        assert_eq!(chapter.panes.len(), 2);
        assert_eq!(chapter.panes[0].chapter_id, chapter_id);

        let record = Record::read(&store.chapter_dir(series_id, chapter_id).join(INFO_FILE)).unwrap();
        assert_eq!(record.get("panes"), Some("p1.jpg|p2.jpg"));
    }

    #[tokio::test]
    async fn test_load_all_skips_panes_for_previews() {
        let dir = tempfile::tempdir().unwrap();
        let mut series = Series::preview(SOURCE, "A", "", "https://src.example/a");
        series.add_chapter("Chapter 1", "https://src.example/a/1");
        {
            let mut store = ContentStore::open(dir.path()).unwrap();
            store.upsert_series(series, false).unwrap();
        }

        let source = Arc::new(FakeSource::new(SOURCE));
        let mut sources = SourceRegistry::new();
        sources.register(source.clone());

        let mut store = ContentStore::open(dir.path()).unwrap();
        store.load_all(&sources).await.unwrap();
        assert_eq!(source.pane_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_all_survives_offline_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut series = Series::new(SOURCE, "A", "", "https://src.example/a");
        series.add_chapter("Chapter 1", "https://src.example/a/1");
        let series_id = series.id;
        {
            let mut store = ContentStore::open(dir.path()).unwrap();
            store.upsert_series(series, false).unwrap();
        }

        let source = Arc::new(FakeSource::new(SOURCE));
        source.offline.store(true, Ordering::SeqCst);
        let mut sources = SourceRegistry::new();
        sources.register(source);

        let mut store = ContentStore::open(dir.path()).unwrap();
        store.load_all(&sources).await.unwrap();
        assert!(store.get_series(series_id).unwrap().chapters[0].panes.is_empty());
    }

    #[tokio::test]
    async fn test_library_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let series = series_with_chapters("A", "https://src.example/a", &["c1"]);
        let id = series.id;
        {
            let mut store = ContentStore::open(dir.path()).unwrap();
            store.upsert_series(series, false).unwrap();
            assert!(store.add_to_library(id).unwrap());
            assert!(!store.add_to_library(id).unwrap());
        }

        let mut store = ContentStore::open(dir.path()).unwrap();
        store.load_all(&SourceRegistry::new()).await.unwrap();
        assert!(store.is_in_library(id));
        assert_eq!(store.library_series().len(), 1);

        assert!(store.remove_from_library(id).unwrap());
        assert!(!store.remove_from_library(id).unwrap());
        assert!(store.library_series().is_empty());
    }
}
