use uuid::Uuid;

use crate::app::{AppContext, Result};
use crate::domain::{Series, UserStatus};

/// Which cached series `list` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Library,
    Recent,
}

pub fn list_series(ctx: &AppContext, filter: ListFilter) -> Result<()> {
    let series = match filter {
        ListFilter::All => ctx.store.all_series(),
        ListFilter::Library => ctx.store.library_series(),
        ListFilter::Recent => ctx.store.recently_read(),
    };

    if series.is_empty() {
        println!("No series");
        return Ok(());
    }

    for s in series {
        println!("{}", series_line(ctx, s));
    }

    Ok(())
}

pub fn list_chapters(ctx: &AppContext, series_id: Uuid) -> Result<()> {
    let series = ctx.series(series_id)?;
    println!("{}", series.display_title());

    if series.chapters.is_empty() {
        println!("  No chapters");
        return Ok(());
    }

    for chapter in &series.chapters {
        let marker = match chapter.user_status {
            UserStatus::None => " ",
            UserStatus::Reading => ">",
            UserStatus::Done => "x",
        };
        println!(
            "{} {:<40} {}",
            marker,
            chapter.name,
            chapter.progress_label()
        );
    }

    Ok(())
}

pub fn add_to_library(ctx: &mut AppContext, series_id: Uuid) -> Result<()> {
    let name = ctx.series(series_id)?.display_title().to_string();
    if ctx.store.add_to_library(series_id)? {
        println!("Added to library: {}", name);
    } else {
        println!("Already in library: {}", name);
    }
    Ok(())
}

pub fn remove_from_library(ctx: &mut AppContext, series_id: Uuid) -> Result<()> {
    if ctx.store.remove_from_library(series_id)? {
        println!("Removed from library: {}", series_id);
    } else {
        println!("Not in library: {}", series_id);
    }
    Ok(())
}

fn series_line(ctx: &AppContext, series: &Series) -> String {
    let marker = if ctx.store.is_in_library(series.id) {
        "*"
    } else {
        " "
    };
    let done = series
        .chapters
        .iter()
        .filter(|c| c.user_status == UserStatus::Done)
        .count();
    format!(
        "{} {}  {} ({}/{} chapters read)\n    {}",
        marker,
        series.id,
        series.display_title(),
        done,
        series.chapters.len(),
        series.info_page
    )
}
