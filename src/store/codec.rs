//! Mapping between domain entities and their `info.props` records.

use std::path::Path;

use uuid::Uuid;

use crate::app::{Result, ShelfError};
use crate::domain::{Chapter, Series, UserStatus};
use crate::store::record::{split_list, Record};

pub const SERIES_COMMENT: &str = "Manga info";
pub const CHAPTER_COMMENT: &str = "Chapter info";

pub fn series_to_record(series: &Series) -> Record {
    let chapter_ids: Vec<String> = series.chapters.iter().map(|c| c.id.to_string()).collect();

    let mut record = Record::new();
    record.set("name", series.name.as_str());
    record.set("bannerUrl", series.banner_url.as_str());
    record.set("infoPage", series.info_page.as_str());
    record.set_list("chapterList", &chapter_ids);
    record.set("source", series.source.as_str());
    record.set("uuid", series.id.to_string());
    record.set_list("alternativeNames", &series.alternative_names);
    record.set("author", series.author.clone().unwrap_or_default());
    record.set("description", series.description.clone().unwrap_or_default());
    record.set_list("genres", &series.genres);
    record.set("status", series.status.clone().unwrap_or_default());
    record.set("preview", series.preview.to_string());
    record
}

/// Decode a series record. Chapters are not loaded here; the ids they are
/// stored under come back as the second element, in order.
pub fn series_from_record(record: &Record, path: &Path) -> Result<(Series, Vec<Uuid>)> {
    let corrupt = |reason: String| ShelfError::corrupt(path, reason);

    let id = parse_uuid(record.require("uuid").map_err(corrupt)?, path)?;
    let chapter_ids = split_list(record.get("chapterList").unwrap_or(""))
        .iter()
        .map(|s| parse_uuid(s, path))
        .collect::<Result<Vec<_>>>()?;

    let series = Series {
        id,
        name: record.require("name").map_err(corrupt)?.to_string(),
        banner_url: record.get("bannerUrl").unwrap_or("").to_string(),
        info_page: record.require("infoPage").map_err(corrupt)?.to_string(),
        source: record.require("source").map_err(corrupt)?.to_string(),
        chapters: Vec::new(),
        alternative_names: record.get_list("alternativeNames"),
        author: non_empty(record.get("author")),
        description: non_empty(record.get("description")),
        genres: record.get_list("genres"),
        status: non_empty(record.get("status")),
        preview: record.get("preview") == Some("true"),
    };

    Ok((series, chapter_ids))
}

pub fn chapter_to_record(chapter: &Chapter) -> Record {
    let pane_urls: Vec<&str> = chapter.panes.iter().map(|p| p.url.as_str()).collect();

    let mut record = Record::new();
    record.set("name", chapter.name.as_str());
    record.set("number", chapter.number.to_string());
    record.set("uuid", chapter.id.to_string());
    record.set_list("panes", &pane_urls);
    record.set("infoPage", chapter.info_page.as_str());
    record.set("userStatus", chapter.user_status.ordinal().to_string());
    record.set("lastPage", chapter.last_page.to_string());
    record
}

pub fn chapter_from_record(record: &Record, series_id: Uuid, path: &Path) -> Result<Chapter> {
    let corrupt = |reason: String| ShelfError::corrupt(path, reason);

    let id = parse_uuid(record.require("uuid").map_err(corrupt)?, path)?;
    let number = record
        .require("number")
        .map_err(corrupt)?
        .parse::<f64>()
        .map_err(|e| corrupt(format!("bad chapter number: {}", e)))?;
    let user_status = record
        .get("userStatus")
        .unwrap_or("0")
        .parse::<u8>()
        .ok()
        .and_then(UserStatus::from_ordinal)
        .ok_or_else(|| corrupt("bad userStatus".into()))?;
    let last_page = record
        .get("lastPage")
        .unwrap_or("0")
        .parse::<usize>()
        .map_err(|e| corrupt(format!("bad lastPage: {}", e)))?;

    let mut chapter = Chapter {
        id,
        series_id,
        name: record.require("name").map_err(corrupt)?.to_string(),
        number,
        panes: Vec::new(),
        info_page: record.require("infoPage").map_err(corrupt)?.to_string(),
        user_status,
        last_page,
    };
    for url in record.get_list("panes") {
        chapter.add_pane(&url);
    }

    Ok(chapter)
}

fn parse_uuid(s: &str, path: &Path) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| ShelfError::corrupt(path, format!("bad uuid `{}`: {}", s, e)))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(String::from)
}
