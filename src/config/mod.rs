//! Configuration management for mangashelf.
//!
//! Configuration is read from `~/.config/mangashelf/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod colors;
pub mod keybindings;

pub use colors::ColorConfig;
pub use keybindings::KeybindingConfig;

use crate::images::DEFAULT_PREFETCH_WORKERS;

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub images: ImageConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
}

/// Where the persisted library lives.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
}

/// Image download behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Download every page of a chapter in the background when it is opened.
    pub prefetch: bool,
    pub prefetch_workers: usize,
    pub user_agent: Option<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            prefetch: true,
            prefetch_workers: DEFAULT_PREFETCH_WORKERS,
            user_agent: None,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating it when missing.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/mangashelf/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("mangashelf").join("config.toml"))
    }

    /// Resolve the data directory: an explicit override wins, then the config
    /// file, then `<platform data dir>/mangashelf`.
    pub fn data_dir(&self, cli_override: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = cli_override {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = &self.storage.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(data_dir.join("mangashelf"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> &'static str {
        r##"# mangashelf configuration
#
# Colors can be specified as:
# - Named colors: Black, Red, Green, Yellow, Blue, Magenta, Cyan, Gray,
#   DarkGray, LightRed, LightGreen, LightYellow, LightBlue, LightMagenta,
#   LightCyan, White, Reset
# - Hex colors: "#RRGGBB" or "#RGB"
#
# Keybindings can be specified as:
# - Single characters: "a", "A", "1"
# - Special keys: Enter, Tab, BackTab, Backspace, Delete, Home, End,
#   PageUp, PageDown, Up, Down, Left, Right, Esc, Space, F1-F12
# - With modifiers: "Ctrl+c", "Shift+Tab", "Alt+Enter"

[storage]
# Directory holding manga/, images/ and the log file.
# Defaults to the platform data directory (e.g. ~/.local/share/mangashelf).
# data_dir = "/path/to/mangashelf"

[images]
# Download all pages of a chapter in the background when it is opened
prefetch = true
prefetch_workers = 4
# user_agent = "Mozilla/5.0 ..."

[colors]
active_tab = "Cyan"
inactive_tab = "DarkGray"
border = "DarkGray"
selection_bg = "Cyan"
selection_fg = "Black"
reading_chapter = "Yellow"
done_chapter = "DarkGray"
metadata = "Yellow"
status_fg = "White"
status_bg = "DarkGray"

[keybindings]
quit = ["q", "Ctrl+c"]
move_up = ["k", "Up"]
move_down = ["j", "Down"]
select = ["Enter"]
next_tab = ["Tab"]
prev_tab = ["BackTab", "Shift+Tab"]
close_tab = ["x", "Ctrl+w"]

# Reader
page_left = ["h", "Left"]
page_right = ["l", "Right", "Space"]
chapter_left = ["H"]
chapter_right = ["L"]

# Actions
refresh = ["R"]
toggle_library = ["a"]
search = ["/"]
open_in_browser = ["o"]
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
