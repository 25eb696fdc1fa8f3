use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry at {path}: {reason}")]
    CacheCorruption { path: PathBuf, reason: String },

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("No source registered for: {0}")]
    SourceNotFound(String),

    #[error("Series not found: {0}")]
    SeriesNotFound(Uuid),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(Uuid),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("{0}")]
    Other(String),
}

impl ShelfError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ShelfError::CacheCorruption {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Network failures surface to the user but never stop the application.
    pub fn is_network(&self) -> bool {
        matches!(self, ShelfError::Http(_) | ShelfError::InvalidUrl(_))
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;
