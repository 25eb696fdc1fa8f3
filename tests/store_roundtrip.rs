use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use mangashelf::app::{Result, ShelfError};
use mangashelf::domain::{Chapter, Series, UserStatus};
use mangashelf::source::{SourceProvider, SourceRegistry};
use mangashelf::store::{ContentStore, Record};

const SOURCE: &str = "https://shelf.example";

/// Serves two pages for every chapter and nothing else.
struct TwoPageSource;

#[async_trait]
impl SourceProvider for TwoPageSource {
    fn id(&self) -> &str {
        SOURCE
    }

    async fn list_popular(&self) -> Result<Vec<Series>> {
        Ok(Vec::new())
    }

    async fn list_recently_updated(&self) -> Result<Vec<Series>> {
        Ok(Vec::new())
    }

    async fn search(&self, _query: &str) -> Result<Vec<Series>> {
        Ok(Vec::new())
    }

    async fn fetch_detail(&self, info_page: &str, _force_refresh: bool) -> Result<Series> {
        Err(ShelfError::Other(format!("not served: {}", info_page)))
    }

    async fn fetch_chapter_panes(&self, chapter: &Chapter, _force_refresh: bool) -> Result<Chapter> {
        let mut filled = chapter.clone();
        filled.add_pane(&format!("{}/p1.jpg", chapter.info_page));
        filled.add_pane(&format!("{}/p2.jpg", chapter.info_page));
        Ok(filled)
    }
}

fn sample_series() -> Series {
    let mut series = Series::new(
        SOURCE,
        "Shelf Story",
        "https://shelf.example/covers/story.jpg",
        "https://shelf.example/story",
    );
    series.author = Some("A. Writer".to_string());
    series.description = Some("Line one\nline two = with equals".to_string());
    series.genres = vec!["Action".to_string(), "Drama".to_string()];
    series.alternative_names = vec!["Story of the Shelf".to_string()];
    series.status = Some("Ongoing".to_string());

    for (name, page) in [
        ("Chapter 10.5", "https://shelf.example/story/10.5"),
        ("Chapter 10", "https://shelf.example/story/10"),
    ] {
        let chapter = series.add_chapter(name, page);
        chapter.add_pane(&format!("{}/1.jpg", page));
        chapter.add_pane(&format!("{}/2.jpg", page));
    }
    series
}

#[tokio::test]
async fn test_series_survives_restart_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let saved = sample_series();

    {
        let mut store = ContentStore::open(temp_dir.path()).unwrap();
        store.upsert_series(saved.clone(), false).unwrap();
    }

    let mut store = ContentStore::open(temp_dir.path()).unwrap();
    let report = store.load_all(&SourceRegistry::new()).await.unwrap();

    assert_eq!(report.loaded, 1);
    assert!(report.removed.is_empty());
    assert_eq!(store.get_series(saved.id), Some(&saved));
    assert_eq!(store.get_series(saved.id).unwrap().chapters[0].number, 10.5);
}

#[tokio::test]
async fn test_progress_and_library_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let series = sample_series();
    let chapter_id = series.chapters[1].id;

    {
        let mut store = ContentStore::open(temp_dir.path()).unwrap();
        store.upsert_series(series.clone(), false).unwrap();
        store
            .update_chapter_progress(series.id, chapter_id, UserStatus::Done, 1)
            .unwrap();
        assert!(store.add_to_library(series.id).unwrap());
        assert!(!store.add_to_library(series.id).unwrap());
    }

    let mut store = ContentStore::open(temp_dir.path()).unwrap();
    store.load_all(&SourceRegistry::new()).await.unwrap();

    let chapter = store.get_chapter(series.id, chapter_id).unwrap();
    assert_eq!(chapter.user_status, UserStatus::Done);
    assert_eq!(chapter.last_page, 1);
    assert_eq!(store.library_ids(), &[series.id]);
}

#[tokio::test]
async fn test_persisted_layout_uses_flat_records() {
    let temp_dir = TempDir::new().unwrap();
    let series = sample_series();
    let mut store = ContentStore::open(temp_dir.path()).unwrap();
    store.upsert_series(series.clone(), false).unwrap();
    store.add_to_library(series.id).unwrap();

    let series_record = Record::read(&store.series_dir(series.id).join("info.props")).unwrap();
    assert_eq!(series_record.get("name"), Some("Shelf Story"));
    assert_eq!(series_record.get("uuid"), Some(series.id.to_string().as_str()));
    assert_eq!(series_record.get("genres"), Some("Action|Drama"));
    assert_eq!(series_record.get("preview"), Some("false"));
    let expected_chapters = format!("{}|{}", series.chapters[0].id, series.chapters[1].id);
    assert_eq!(series_record.get("chapterList"), Some(expected_chapters.as_str()));

    let chapter = &series.chapters[0];
    let chapter_record =
        Record::read(&store.chapter_dir(series.id, chapter.id).join("info.props")).unwrap();
    assert_eq!(chapter_record.get("number"), Some("10.5"));
    assert_eq!(chapter_record.get("userStatus"), Some("0"));
    assert_eq!(chapter_record.get("lastPage"), Some("0"));
    assert_eq!(chapter_record.get_list("panes").len(), 2);

    let library = Record::read(&temp_dir.path().join("library.props")).unwrap();
    assert_eq!(library.get("library"), Some(series.id.to_string().as_str()));
}

#[tokio::test]
async fn test_corrupt_series_directory_is_removed_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let series = sample_series();
    {
        let mut store = ContentStore::open(temp_dir.path()).unwrap();
        store.upsert_series(series.clone(), false).unwrap();
    }
    let broken = temp_dir.path().join("not-a-series");
    fs::create_dir_all(broken.join("stray")).unwrap();

    let mut store = ContentStore::open(temp_dir.path()).unwrap();
    let report = store.load_all(&SourceRegistry::new()).await.unwrap();

    assert_eq!(report.loaded, 1);
    assert_eq!(report.removed, vec![broken.clone()]);
    assert!(!broken.exists());
    assert!(temp_dir.path().join("library.props").is_file());
}

#[tokio::test]
async fn test_missing_panes_are_filled_from_registered_source() {
    let temp_dir = TempDir::new().unwrap();
    let mut series = Series::new(SOURCE, "Bare", "", "https://shelf.example/bare");
    series.add_chapter("Chapter 1", "https://shelf.example/bare/1");
    let chapter_id = series.chapters[0].id;
    {
        let mut store = ContentStore::open(temp_dir.path()).unwrap();
        store.upsert_series(series.clone(), false).unwrap();
    }

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(TwoPageSource));
    let mut store = ContentStore::open(temp_dir.path()).unwrap();
    let report = store.load_all(&sources).await.unwrap();

    assert_eq!(report.materialized, 1);
    let chapter = store.get_chapter(series.id, chapter_id).unwrap();
    assert_eq!(chapter.panes.len(), 2);
    assert_eq!(chapter.panes[0].chapter_id, chapter_id);

    // The filled panes were written back, so a second load needs no source.
    let mut store = ContentStore::open(temp_dir.path()).unwrap();
    let report = store.load_all(&SourceRegistry::new()).await.unwrap();
    assert_eq!(report.materialized, 0);
    assert_eq!(store.get_chapter(series.id, chapter_id).unwrap().panes.len(), 2);
}
