use image::imageops::FilterType;
use image::DynamicImage;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Widget, Wrap},
    Frame,
};

use crate::app::AppContext;
use crate::config::ColorConfig;
use crate::domain::Series;
use crate::tui::app::{rows, RowStyle, TuiApp};
use crate::viewer::{ViewerEntry, ViewerKind};

pub fn render(frame: &mut Frame, app: &TuiApp, ctx: &AppContext) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab strip
            Constraint::Min(3),    // Focused tab
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let colors = &ctx.config.colors;
    render_tabs(frame, ctx, colors, chunks[0]);

    let entry = ctx.viewers.focused();
    match entry.kind() {
        ViewerKind::SeriesDetail { series_id } => {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(chunks[1]);
            if let Some(series) = ctx.store.get_series(*series_id) {
                render_series_info(frame, ctx, series, colors, halves[0]);
            }
            render_rows(frame, app, ctx, entry, colors, halves[1]);
        }
        ViewerKind::ChapterReader { .. } => render_reader(frame, app, entry, colors, chunks[1]),
        ViewerKind::Picker | ViewerKind::Search { .. } => {
            render_rows(frame, app, ctx, entry, colors, chunks[1])
        }
    }

    render_status_bar(frame, app, entry, colors, chunks[2]);
}

fn render_tabs(frame: &mut Frame, ctx: &AppContext, colors: &ColorConfig, area: Rect) {
    let titles: Vec<Line> = ctx
        .viewers
        .entries()
        .iter()
        .map(|e| Line::from(e.title().to_string()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(ctx.viewers.focused_index())
        .style(Style::default().fg(colors.inactive_tab))
        .highlight_style(
            Style::default()
                .fg(colors.active_tab)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn render_rows(
    frame: &mut Frame,
    app: &TuiApp,
    ctx: &AppContext,
    entry: &ViewerEntry,
    colors: &ColorConfig,
    area: Rect,
) {
    let rows = rows(ctx, entry);
    let cursor = app.cursor(entry.id());

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let base = match row.style {
                RowStyle::Heading => Style::default().add_modifier(Modifier::BOLD),
                RowStyle::Normal => Style::default(),
                RowStyle::Reading => Style::default().fg(colors.reading_chapter),
                RowStyle::Done => Style::default().fg(colors.done_chapter),
            };
            let style = if i == cursor {
                Style::default()
                    .bg(colors.selection_bg)
                    .fg(colors.selection_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                base
            };
            ListItem::new(row.label.clone()).style(style)
        })
        .collect();

    let title = match entry.kind() {
        ViewerKind::SeriesDetail { .. } => format!(" Chapters ({}) ", rows.len()),
        ViewerKind::Search { query } => format!(" Results for '{}' ({}) ", query, rows.len()),
        _ if rows.is_empty() => " Nothing here yet: press / to search ".to_string(),
        _ => format!(" {} ", entry.title()),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border));

    let mut state = ListState::default();
    state.select((!rows.is_empty()).then_some(cursor));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_series_info(
    frame: &mut Frame,
    ctx: &AppContext,
    series: &Series,
    colors: &ColorConfig,
    area: Rect,
) {
    let meta = Style::default().fg(colors.metadata);
    let mut lines = vec![
        Line::from(Span::styled(
            series.display_title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if let Some(author) = &series.author {
        lines.push(Line::from(Span::styled(format!("By: {}", author), meta)));
    }
    if let Some(status) = &series.status {
        lines.push(Line::from(Span::styled(format!("Status: {}", status), meta)));
    }
    if !series.genres.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Genres: {}", series.genres.join(", ")),
            meta,
        )));
    }
    if !series.alternative_names.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Also: {}", series.alternative_names.join(", ")),
            meta,
        )));
    }
    let membership = if ctx.store.is_in_library(series.id) {
        "In library"
    } else {
        "Not in library"
    };
    lines.push(Line::from(Span::styled(membership, meta)));
    lines.push(Line::from(""));

    if let Some(description) = &series.description {
        for line in description.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    let block = Block::default()
        .title(" Info ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border));
    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_reader(
    frame: &mut Frame,
    app: &TuiApp,
    entry: &ViewerEntry,
    colors: &ColorConfig,
    area: Rect,
) {
    let block = Block::default()
        .title(format!(" {} ", entry.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &app.page {
        Some(image) => frame.render_widget(PageView::new(image), inner),
        None => frame.render_widget(Paragraph::new("No page to show"), inner),
    }
}

fn render_status_bar(
    frame: &mut Frame,
    app: &TuiApp,
    entry: &ViewerEntry,
    colors: &ColorConfig,
    area: Rect,
) {
    let status = if let Some(query) = &app.search_input {
        format!("Search: {}_", query)
    } else if let Some(msg) = &app.status_message {
        msg.clone()
    } else if !entry.statuses().is_empty() {
        entry
            .statuses()
            .iter()
            .map(|s| format!("{} {}", s.name, s.text))
            .collect::<Vec<_>>()
            .join("  ")
    } else {
        "j/k:Navigate  Enter:Open  Tab:Next tab  x:Close  /:Search  a:Library  R:Refresh  q:Quit"
            .to_string()
    };

    let paragraph =
        Paragraph::new(status).style(Style::default().fg(colors.status_fg).bg(colors.status_bg));
    frame.render_widget(paragraph, area);
}

/// Draws an image with half-block characters: each cell shows two
/// vertically stacked pixels, the upper as foreground, the lower as background.
pub struct PageView<'a> {
    image: &'a DynamicImage,
}

impl<'a> PageView<'a> {
    pub fn new(image: &'a DynamicImage) -> Self {
        Self { image }
    }
}

impl Widget for PageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let (width, height) = fit(
            (self.image.width(), self.image.height()),
            (u32::from(area.width), u32::from(area.height) * 2),
        );
        if width == 0 || height == 0 {
            return;
        }

        let scaled = self
            .image
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgb8();
        let left = area.x + (area.width - width as u16) / 2;

        for row in 0..height.div_ceil(2) {
            for col in 0..width {
                let [tr, tg, tb] = scaled.get_pixel(col, row * 2).0;
                let [br, bg, bb] = if row * 2 + 1 < height {
                    scaled.get_pixel(col, row * 2 + 1).0
                } else {
                    [0, 0, 0]
                };
                if let Some(cell) = buf.cell_mut((left + col as u16, area.y + row as u16)) {
                    cell.set_char('▀')
                        .set_fg(Color::Rgb(tr, tg, tb))
                        .set_bg(Color::Rgb(br, bg, bb));
                }
            }
        }
    }
}

/// Largest size with the image's aspect ratio that fits in `bounds`.
fn fit(image: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (iw, ih) = image;
    let (bw, bh) = bounds;
    if iw == 0 || ih == 0 {
        return (0, 0);
    }
    let scale = f64::min(bw as f64 / iw as f64, bh as f64 / ih as f64);
    let width = ((iw as f64 * scale).floor() as u32).clamp(1, bw);
    let height = ((ih as f64 * scale).floor() as u32).clamp(1, bh);
    (width, height)
}
