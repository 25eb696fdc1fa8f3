pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::warn;
use uuid::Uuid;

use crate::app::{AppContext, Result};
use crate::progress::{ChapterStep, PageMove};
use crate::viewer::ViewerKind;

use self::app::{rows, RowTarget, TuiApp};
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: &mut AppContext) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: &mut AppContext) -> Result<()> {
    let mut tui_app = TuiApp::new();
    let event_handler = EventHandler::new(Duration::from_millis(100));

    if !ctx.sources.is_empty() {
        tui_app.set_status("Loading listings...".to_string());
        terminal.draw(|frame| layout::render(frame, &tui_app, ctx))?;
        let loaded = ctx.refresh_listings().await;
        tui_app.clear_status();
        report(&mut tui_app, loaded);
    }

    loop {
        terminal.draw(|frame| layout::render(frame, &tui_app, ctx))?;

        match event_handler.next()? {
            AppEvent::Key(key) => {
                if tui_app.search_input.is_some() {
                    handle_search_input(&mut tui_app, ctx, key).await;
                } else {
                    let action = ctx.config.keybindings.get_action(&key);
                    if action != Action::None {
                        tui_app.clear_status();
                    }
                    handle_action(&mut tui_app, ctx, action).await;
                }
                load_page(&mut tui_app, ctx).await;
            }
            AppEvent::Tick => {}
        }

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}

async fn handle_action(tui_app: &mut TuiApp, ctx: &mut AppContext, action: Action) {
    let focused = ctx.viewers.focused().id();

    match action {
        Action::Quit => {
            tui_app.should_quit = true;
        }
        Action::NextTab => ctx.viewers.focus_next(),
        Action::PrevTab => ctx.viewers.focus_prev(),
        Action::CloseTab => {
            if ctx.close_focused() {
                tui_app.forget(focused);
            }
        }
        Action::MoveUp => tui_app.move_up(focused),
        Action::MoveDown => {
            let len = rows(ctx, ctx.viewers.focused()).len();
            tui_app.move_down(focused, len);
        }
        Action::Select => match selected_target(tui_app, ctx) {
            Some(RowTarget::Series(series)) => {
                let opened = ctx.open_series(series).await;
                report(tui_app, opened);
            }
            Some(RowTarget::Chapter {
                series_id,
                chapter_id,
            }) => {
                let opened = ctx.open_chapter(series_id, chapter_id).await;
                report(tui_app, opened);
            }
            Some(RowTarget::Heading) | None => {}
        },
        Action::PageRight => match ctx.page_right() {
            Ok(PageMove::Finished) => tui_app.set_status("Chapter finished".to_string()),
            other => report(tui_app, other),
        },
        Action::PageLeft => {
            let moved = ctx.page_left();
            report(tui_app, moved);
        }
        Action::ChapterRight => {
            let stepped = ctx.step_chapter(ChapterStep::Next).await;
            if matches!(stepped, Ok(None)) {
                tui_app.set_status("No newer chapter".to_string());
            }
            report(tui_app, stepped);
        }
        Action::ChapterLeft => {
            let stepped = ctx.step_chapter(ChapterStep::Earlier).await;
            if matches!(stepped, Ok(None)) {
                tui_app.set_status("No earlier chapter".to_string());
            }
            report(tui_app, stepped);
        }
        Action::Refresh => match ctx.viewers.focused().kind() {
            ViewerKind::SeriesDetail { .. } => {
                let refreshed = ctx.refresh_series(focused).await;
                if let Ok(id) = &refreshed {
                    let len = rows(ctx, ctx.viewers.focused()).len();
                    tui_app.forget(focused);
                    tui_app.clamp(*id, len);
                }
                report(tui_app, refreshed);
            }
            ViewerKind::Picker => {
                let refreshed = ctx.refresh_listings().await;
                report(tui_app, refreshed);
            }
            _ => {}
        },
        Action::ToggleLibrary => match library_target(tui_app, ctx) {
            Some(series_id) => match ctx.toggle_library(series_id) {
                Ok(true) => tui_app.set_status("Added to library".to_string()),
                Ok(false) => tui_app.set_status("Removed from library".to_string()),
                Err(e) => report::<()>(tui_app, Err(e)),
            },
            None => tui_app.set_status("Open the series before adding it".to_string()),
        },
        Action::Search => {
            tui_app.search_input = Some(String::new());
        }
        Action::OpenInBrowser => {
            if let Some(url) = info_page(tui_app, ctx) {
                if let Err(e) = open::that(&url) {
                    tui_app.set_status(format!("Failed to open browser: {}", e));
                }
            }
        }
        Action::None => {}
    }
}

async fn handle_search_input(tui_app: &mut TuiApp, ctx: &mut AppContext, key: KeyEvent) {
    let Some(query) = tui_app.search_input.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Char(c) => query.push(c),
        KeyCode::Backspace => {
            query.pop();
        }
        KeyCode::Esc => tui_app.search_input = None,
        KeyCode::Enter => {
            let query = query.trim().to_string();
            tui_app.search_input = None;
            if !query.is_empty() {
                let searched = ctx.search(&query).await;
                report(tui_app, searched);
            }
        }
        _ => {}
    }
}

/// Keep the decoded current page in step with the focused reader.
async fn load_page(tui_app: &mut TuiApp, ctx: &AppContext) {
    match ctx.current_page_image().await {
        Ok(page) => tui_app.page = page,
        Err(e) => {
            tui_app.page = None;
            report::<()>(tui_app, Err(e));
        }
    }
}

fn selected_target(tui_app: &TuiApp, ctx: &AppContext) -> Option<RowTarget> {
    let entry = ctx.viewers.focused();
    rows(ctx, entry)
        .into_iter()
        .nth(tui_app.cursor(entry.id()))
        .map(|row| row.target)
}

/// The cached series the library key applies to: the focused tab's, or the
/// selected row's when it is already cached in full.
fn library_target(tui_app: &TuiApp, ctx: &AppContext) -> Option<Uuid> {
    match ctx.viewers.focused().kind() {
        ViewerKind::SeriesDetail { series_id } | ViewerKind::ChapterReader { series_id, .. } => {
            Some(*series_id)
        }
        _ => match selected_target(tui_app, ctx)? {
            RowTarget::Series(series) => ctx
                .store
                .find_series(&series.source, &series.info_page)
                .filter(|s| !s.preview)
                .map(|s| s.id),
            _ => None,
        },
    }
}

fn info_page(tui_app: &TuiApp, ctx: &AppContext) -> Option<String> {
    match ctx.viewers.focused().kind() {
        ViewerKind::ChapterReader {
            series_id,
            chapter_id,
        } => ctx
            .store
            .get_chapter(*series_id, *chapter_id)
            .map(|c| c.info_page.clone()),
        _ => match selected_target(tui_app, ctx)? {
            RowTarget::Series(series) => Some(series.info_page),
            RowTarget::Chapter {
                series_id,
                chapter_id,
            } => ctx
                .store
                .get_chapter(series_id, chapter_id)
                .map(|c| c.info_page.clone()),
            RowTarget::Heading => None,
        },
    }
}

/// Failed actions are shown in the status bar; the application keeps running.
fn report<T>(tui_app: &mut TuiApp, result: Result<T>) {
    if let Err(e) = result {
        warn!("Action failed: {}", e);
        let kind = if e.is_network() { "Network error" } else { "Error" };
        tui_app.set_status(format!("{}: {}", kind, e));
    }
}
