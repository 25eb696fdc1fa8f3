//! # mangashelf
//!
//! A terminal manga reader with an offline-first local library.
//!
//! ## Architecture
//!
//! ```text
//! SourceProvider → ContentStore → ViewerStack → TUI
//!                       ↘ ImageCache ↗
//! ```
//!
//! - [`source`]: capability contract for site scrapers, plus a document cache
//! - [`store`]: flat property-file persistence with identity reconciliation
//! - [`images`]: memory + disk image cache with bounded background prefetch
//! - [`viewer`]: ordered tab stack with a single focused entry
//! - [`tui`]: terminal user interface built with ratatui
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the reader
//! mangashelf
//!
//! # List cached series, or only the library
//! mangashelf list --library
//!
//! # Chapters of one series with progress
//! mangashelf chapters <series-id>
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// image cache, viewer stack and registered sources.
pub mod app;

/// Command-line interface using clap.
///
/// - `tui` - Launch the TUI (default)
/// - `list [--library|--recent]` - List cached series
/// - `chapters <id>` - Show chapters and progress
/// - `library add|remove <id>` - Change library membership
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/mangashelf/config.toml`, supporting:
/// - Data directory override
/// - Image prefetch settings
/// - Custom colors (named or hex)
/// - Custom keybindings
pub mod config;

/// Core domain models.
///
/// - [`Series`](domain::Series): a title, keyed by `(source, info_page)`
/// - [`Chapter`](domain::Chapter): pages plus reading status
/// - [`Pane`](domain::Pane): a single page image
pub mod domain;

/// Raw byte transport.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for fetching bytes with an optional referer
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Image caching.
pub mod images;

/// Page and chapter navigation inside a reader tab.
pub mod progress;

/// Source provider contract and registry.
pub mod source;

/// On-disk content cache.
///
/// - [`ContentStore`](store::ContentStore): series, chapters, library
/// - [`Record`](store::Record): `key=value` property records
pub mod store;

/// Terminal user interface.
///
/// A tab strip over the focused tab's body and a status line.
/// Keybindings: j/k navigate, Enter opens, h/l turn pages, H/L change
/// chapter, Tab cycles tabs, x closes, / searches, a toggles library, q quits.
pub mod tui;

/// Open tabs and focus.
pub mod viewer;
